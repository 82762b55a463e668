use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The seven fixed pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    IngestProvider,
    Normalize,
    Dedupe,
    QualityFilter,
    DeterministicExtract,
    LlmAugment,
    CompileReport,
}

impl Stage {
    pub const ORDER: [Stage; 7] = [
        Stage::IngestProvider,
        Stage::Normalize,
        Stage::Dedupe,
        Stage::QualityFilter,
        Stage::DeterministicExtract,
        Stage::LlmAugment,
        Stage::CompileReport,
    ];

    /// The stage that must have produced this stage's expected parent output,
    /// or `None` for the first stage.
    pub fn predecessor(self) -> Option<Stage> {
        let idx = Self::ORDER.iter().position(|s| *s == self)?;
        if idx == 0 {
            None
        } else {
            Some(Self::ORDER[idx - 1])
        }
    }

    /// The next stage in the fixed sequence, or `None` after COMPILE_REPORT.
    pub fn next(self) -> Option<Stage> {
        let idx = Self::ORDER.iter().position(|s| *s == self)?;
        Self::ORDER.get(idx + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::IngestProvider => "ingest_provider",
            Stage::Normalize => "normalize",
            Stage::Dedupe => "dedupe",
            Stage::QualityFilter => "quality_filter",
            Stage::DeterministicExtract => "deterministic_extract",
            Stage::LlmAugment => "llm_augment",
            Stage::CompileReport => "compile_report",
        }
    }

    /// Per-stage timeout in milliseconds (§4.5).
    pub fn timeout_ms(self) -> u64 {
        match self {
            Stage::IngestProvider => 45_000,
            Stage::Normalize => 8_000,
            Stage::Dedupe => 8_000,
            Stage::QualityFilter => 8_000,
            Stage::DeterministicExtract => 90_000,
            Stage::LlmAugment => 90_000,
            Stage::CompileReport => 4_000,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ingest_provider" => Ok(Stage::IngestProvider),
            "normalize" => Ok(Stage::Normalize),
            "dedupe" => Ok(Stage::Dedupe),
            "quality_filter" => Ok(Stage::QualityFilter),
            "deterministic_extract" => Ok(Stage::DeterministicExtract),
            "llm_augment" => Ok(Stage::LlmAugment),
            "compile_report" => Ok(Stage::CompileReport),
            other => Err(format!("unknown stage: {other}")),
        }
    }
}

/// Immutable, content-addressed record of one stage's output.
///
/// `(report_id, stage, input_hash)` is unique — the Stage Output Store
/// enforces this at the database level via a unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutput {
    pub id: Uuid,
    pub report_id: Uuid,
    pub stage: Stage,
    pub input_hash: String,
    pub output_hash: String,
    pub payload: serde_json::Value,
    pub pipeline_version_id: Uuid,
    pub producer_job_id: Option<Uuid>,
}

/// Per-stage event kinds emitted by the stage runner (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageEventKind {
    Start,
    Success,
    Failure,
    Idempotent,
}
