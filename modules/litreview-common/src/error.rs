use thiserror::Error;

/// Error taxonomy shared by every stage, queue, and cache operation.
///
/// Errors are tagged with their category at the edge where they're first
/// observed (HTTP status, timeout, DB error) and never re-classified
/// downstream — the job runner only inspects `category()`.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("timeout after {0}ms")]
    Timeout(u64),

    #[error("transient error: {0}")]
    Transient(String),

    #[error("external error: {0}")]
    External(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// The five-way retry/dead classification from the error-handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Timeout,
    Transient,
    External,
    Internal,
}

impl ErrorCategory {
    /// Whether the queue manager should retry a job that failed with this category.
    pub fn retryable(self) -> bool {
        matches!(
            self,
            ErrorCategory::Timeout | ErrorCategory::Transient | ErrorCategory::External
        )
    }
}

impl PipelineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::Validation(_) => ErrorCategory::Validation,
            PipelineError::Timeout(_) => ErrorCategory::Timeout,
            PipelineError::Transient(_) => ErrorCategory::Transient,
            PipelineError::External(_) => ErrorCategory::External,
            PipelineError::Internal(_) => ErrorCategory::Internal,
            // Database and opaque anyhow errors default to external: most are
            // transient connection issues, and we'd rather retry than go dead.
            PipelineError::Database(_) => ErrorCategory::External,
            PipelineError::Anyhow(_) => ErrorCategory::Internal,
        }
    }

    pub fn retryable(&self) -> bool {
        self.category().retryable()
    }
}

impl From<sqlx::Error> for PipelineError {
    fn from(e: sqlx::Error) -> Self {
        PipelineError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Internal(format!("json error: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
