pub mod extraction_run;
pub mod pipeline_version;
pub mod report;

pub use extraction_run::ExtractionRunRepo;
pub use pipeline_version::{PipelineVersionRepo, PipelineVersionTuple};
pub use report::{ReportRepo, ReportRow};

use litreview_common::Result;
use sqlx::PgPool;

/// Runs pending migrations, embedded at compile time from `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!()
        .run(pool)
        .await
        .map_err(|e| litreview_common::PipelineError::Internal(format!("migration error: {e}")))?;
    Ok(())
}
