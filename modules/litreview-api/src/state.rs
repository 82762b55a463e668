use std::sync::Arc;

use litreview_pipeline::{PipelineDeps, PipelineRunner};

/// Shared application state handed to every handler.
///
/// The API holds a full [`PipelineDeps`]/[`PipelineRunner`] pair, not just
/// read access to Postgres, because `POST /jobs/drain` runs jobs in-process
/// rather than delegating to a separate worker.
pub struct AppState {
    pub runner: PipelineRunner,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn deps(&self) -> &PipelineDeps {
        self.runner.deps()
    }
}
