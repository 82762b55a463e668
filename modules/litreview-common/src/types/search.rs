use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::evidence::{Brief, EvidenceRow};
use super::paper::{CanonicalPaper, Source};
use super::study::StudyResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    Full,
    Fast,
}

impl Default for ResponseMode {
    fn default() -> Self {
        ResponseMode::Full
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filters {
    pub from_year: Option<i32>,
    pub to_year: Option<i32>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub exclude_preprints: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub domain: Option<String>,
    #[serde(default)]
    pub filters: Filters,
    pub max_candidates: Option<u32>,
    pub max_evidence_rows: Option<u32>,
    #[serde(default)]
    pub response_mode: ResponseMode,
    pub provider_profile: Option<Vec<Source>>,
    pub seed: Option<u64>,
    pub experiment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Running,
    Completed,
    Failed,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Running => "running",
            ReportStatus::Completed => "completed",
            ReportStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(ReportStatus::Running),
            "completed" => Ok(ReportStatus::Completed),
            "failed" => Ok(ReportStatus::Failed),
            other => Err(format!("unknown report status: {other}")),
        }
    }
}

/// Per-provider contribution to retrieval coverage (§4.5.1, §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderCoverage {
    pub source: Option<Source>,
    pub retrieved: u32,
    pub succeeded: bool,
    pub retry_count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageReport {
    pub providers: Vec<ProviderCoverage>,
    pub candidates_total: u32,
    pub candidates_filtered: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub strict_complete_total: u32,
    pub partial_total: u32,
    pub fallback_reasons: Vec<String>,
    pub engine: String,
    pub llm_fallback_applied: bool,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportStats {
    pub latency_ms: u64,
    pub candidates_total: u32,
    pub candidates_filtered: u32,
    pub retrieved_total: u32,
    pub abstract_eligible_total: u32,
    pub quality_kept_total: u32,
    pub extraction_input_total: u32,
    pub strict_complete_total: u32,
    pub partial_total: u32,
}

/// The payload returned by `GET /search/{id}` (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub search_id: Uuid,
    pub status: ReportStatus,
    pub normalized_query: Option<String>,
    pub results: Vec<StudyResult>,
    pub partial_results: Vec<StudyResult>,
    pub extraction_stats: Option<ExtractionStats>,
    pub evidence_table: Vec<EvidenceRow>,
    pub brief: Option<Brief>,
    pub coverage: Option<CoverageReport>,
    pub stats: Option<ReportStats>,
    pub canonical_papers: Vec<CanonicalPaper>,
    pub active_run_id: Option<Uuid>,
    pub run_version: i32,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    Initial,
    Recompute,
    ModelUpgrade,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// Summary row for `GET /search/{id}/runs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRunSummary {
    pub run_id: Uuid,
    pub run_index: i32,
    pub parent_run_id: Option<Uuid>,
    pub trigger: RunTrigger,
    pub status: RunStatus,
    pub engine: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// One cell of a run's detail table, keyed by column name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCell {
    pub column: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRow {
    pub study_id: String,
    pub cells: Vec<RunCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRunDetail {
    pub summary: ExtractionRunSummary,
    pub columns: Vec<String>,
    pub rows: Vec<RunRow>,
    pub input_hash: String,
    pub output_hash: String,
}

/// `POST /jobs/drain` request/response shapes.
#[derive(Debug, Clone, Deserialize)]
pub struct DrainRequest {
    pub worker_id: Option<String>,
    pub batch_size: Option<u32>,
    pub lease_seconds: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrainResponse {
    pub claimed: u32,
    pub completed: u32,
    pub retried: u32,
    pub dead: u32,
    pub failures: Vec<String>,
}
