use serde::{Deserialize, Serialize};

/// Anchor into an abstract (or excerpt) backing one claim sentence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationAnchor {
    pub paper_id: String,
    pub section: String,
    pub char_start: usize,
    pub char_end: usize,
    pub snippet_hash: u32,
}

impl CitationAnchor {
    pub fn new(paper_id: impl Into<String>, section: impl Into<String>, snippet: &str, char_start: usize) -> Self {
        let char_end = char_start + snippet.len();
        Self {
            paper_id: paper_id.into(),
            section: section.into(),
            char_start,
            char_end,
            snippet_hash: crate::hashing::fnv1a_32(snippet),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Positive,
    Negative,
    Neutral,
}

/// One row of the evidence table: a ranked canonical paper plus its
/// extracted outcome, for display alongside the brief.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRow {
    pub paper_id: String,
    pub title: String,
    pub year: Option<i32>,
    pub q_total: f64,
    pub relevance_score: f64,
    pub citation_count: Option<i64>,
    pub outcome_measured: Option<String>,
    pub stance: Stance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimDisposition {
    ConsensusPositive,
    ConsensusNegative,
    Conflicting,
    Mixed,
}

/// One clustered claim in the brief, with 1-4 grounding sentences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimCluster {
    pub outcome_token: String,
    pub disposition: ClaimDisposition,
    pub sentences: Vec<ClaimSentence>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimSentence {
    pub text: String,
    pub stance: Stance,
    pub anchor: CitationAnchor,
}

/// The generated narrative brief: up to 3 claim clusters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brief {
    pub clusters: Vec<ClaimCluster>,
}
