use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyDesign {
    MetaAnalysis,
    SystematicReview,
    Rct,
    Cohort,
    CrossSectional,
    CaseControl,
    CaseReport,
    Review,
    Unknown,
}

impl StudyDesign {
    pub fn as_str(self) -> &'static str {
        match self {
            StudyDesign::MetaAnalysis => "meta_analysis",
            StudyDesign::SystematicReview => "systematic_review",
            StudyDesign::Rct => "rct",
            StudyDesign::Cohort => "cohort",
            StudyDesign::CrossSectional => "cross_sectional",
            StudyDesign::CaseControl => "case_control",
            StudyDesign::CaseReport => "case_report",
            StudyDesign::Review => "review",
            StudyDesign::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewType {
    Narrative,
    Systematic,
    MetaAnalysis,
    NotAReview,
}

/// One extracted outcome within a study (§4.5.5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Outcome {
    pub outcome_measured: Option<String>,
    pub intervention: Option<String>,
    pub comparator: Option<String>,
    pub effect_size: Option<String>,
    pub p_value: Option<String>,
    pub confidence_interval: Option<String>,
    pub key_result: Option<String>,
    pub citation_snippet: Option<String>,
    /// Presence-based confidence in [0,1] for this single outcome row.
    pub score: f64,
}

/// Completeness classification for an extracted study (§4.5.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletenessTier {
    StrictComplete,
    Partial,
    Dropped,
}

/// The deterministic/LLM-merged extraction result for one paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyResult {
    pub study_id: String,
    pub title: String,
    pub year: Option<i32>,
    pub design: StudyDesign,
    pub preprint_status: super::paper::PreprintStatus,
    pub review_type: Option<ReviewType>,

    pub sample_size: Option<i64>,
    pub population: Option<String>,
    pub abstract_excerpt: Option<String>,
    pub outcomes: Vec<Outcome>,

    pub doi: Option<String>,
    pub pubmed_id: Option<String>,
    pub openalex_id: Option<String>,
    pub citation_count: Option<i64>,
    pub pdf_url: Option<String>,
    pub landing_page_url: Option<String>,

    pub used_pdf: bool,
    pub fallback_reason: Option<String>,
    pub llm_fallback_applied: bool,

    pub completeness: CompletenessTier,
}

impl StudyResult {
    /// `true` if the study has no nullable field an augmenter could fill.
    pub fn has_augmentable_gap(&self) -> bool {
        self.sample_size.is_none()
            || self.population.is_none()
            || self.citation_count.is_none()
            || self.pdf_url.is_none()
            || self.landing_page_url.is_none()
            || self.doi.is_none()
            || self.pubmed_id.is_none()
            || self.openalex_id.is_none()
            || self.outcomes.iter().any(|o| {
                o.key_result.is_none()
                    || o.intervention.is_none()
                    || o.comparator.is_none()
                    || o.effect_size.is_none()
                    || o.p_value.is_none()
            })
    }
}
