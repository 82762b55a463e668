use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Openalex,
    SemanticScholar,
    Arxiv,
    Pubmed,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Openalex => "openalex",
            Source::SemanticScholar => "semantic_scholar",
            Source::Arxiv => "arxiv",
            Source::Pubmed => "pubmed",
        }
    }

    pub const DEFAULT_PROFILE: [Source; 4] = [
        Source::Openalex,
        Source::SemanticScholar,
        Source::Arxiv,
        Source::Pubmed,
    ];

    /// Baseline trust weight used for source_confidence and metadata
    /// confidence defaults when a provider doesn't supply its own score.
    pub fn base_trust(self) -> f64 {
        match self {
            Source::Openalex => 0.9,
            Source::SemanticScholar => 0.85,
            Source::Pubmed => 0.95,
            Source::Arxiv => 0.6,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprintStatus {
    None,
    Preprint,
    PublishedFromPreprint,
}

/// A single provider's raw record for one bibliographic item, before
/// canonicalization. Required fields are non-optional by construction;
/// everything a provider might not supply is `Option`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedPaper {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    pub abstract_text: Option<String>,
    pub authors: Vec<String>,
    pub venue: Option<String>,
    pub source: Source,

    pub doi: Option<String>,
    pub pubmed_id: Option<String>,
    pub openalex_id: Option<String>,
    pub arxiv_id: Option<String>,
    pub citation_count: Option<i64>,
    pub publication_types: Vec<String>,
    pub references: Vec<String>,
    pub is_retracted: bool,
    pub preprint_status: PreprintStatus,
    pub rank_signal: f64,

    pub pdf_url: Option<String>,
    pub landing_page_url: Option<String>,
}

/// One provider's contribution to a canonical paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub source: Source,
    pub rank_signal: f64,
    pub metadata_confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyDesignHint {
    MetaAnalysis,
    SystematicReview,
    Rct,
    Cohort,
    CrossSectional,
    Review,
    Unknown,
}

impl StudyDesignHint {
    /// Base `study_design_strength` weight (§4.5.4).
    pub fn design_strength(self) -> f64 {
        match self {
            StudyDesignHint::MetaAnalysis | StudyDesignHint::SystematicReview => 0.9,
            StudyDesignHint::Rct => 0.86,
            StudyDesignHint::Cohort => 0.72,
            StudyDesignHint::CrossSectional => 0.64,
            StudyDesignHint::Review => 0.62,
            StudyDesignHint::Unknown => 0.55,
        }
    }
}

/// Five-axis quality score for a canonical paper, plus hard-rejection state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityScoreBreakdown {
    pub source_authority: f64,
    pub study_design_strength: f64,
    pub methods_transparency: f64,
    pub citation_impact: f64,
    pub recency_fit: f64,
    pub q_total: f64,
    pub hard_rejected: bool,
    pub hard_reject_reason: Option<String>,
}

/// The merged, deduplicated record for one bibliographic item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalPaper {
    pub paper_id: String,
    pub title: String,
    pub year: Option<i32>,
    pub abstract_text: Option<String>,
    pub authors: Vec<String>,
    pub venue: Option<String>,

    pub doi: Option<String>,
    pub pubmed_id: Option<String>,
    pub openalex_id: Option<String>,
    pub arxiv_id: Option<String>,
    pub citation_count: Option<i64>,

    pub provenance: Vec<ProvenanceEntry>,
    pub referenced_ids: Vec<String>,
    pub is_preprint: bool,
    pub is_retracted: bool,
    pub methods_present: bool,
    pub study_design_hint: StudyDesignHint,
    pub source_confidence: f64,
    pub relevance_score: f64,

    pub pdf_url: Option<String>,
    pub landing_page_url: Option<String>,

    pub quality: Option<QualityScoreBreakdown>,
}

impl CanonicalPaper {
    pub fn has_abstract(&self) -> bool {
        self.abstract_text
            .as_deref()
            .map(|a| !a.trim().is_empty())
            .unwrap_or(false)
    }
}
