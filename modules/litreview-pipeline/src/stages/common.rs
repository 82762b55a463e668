use litreview_common::types::{Job, Stage};
use litreview_common::{PipelineError, Result};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::deps::PipelineDeps;

pub fn predecessor_output_id(job: &Job) -> Result<Uuid> {
    job.payload
        .get("predecessor_output_id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| PipelineError::Internal(format!("job {} missing predecessor_output_id", job.id)))
}

pub async fn enqueue_next(deps: &PipelineDeps, report_id: Uuid, stage: Stage, output_id: Uuid) -> Result<()> {
    if let Some(next) = stage.next() {
        let dedupe_key = Job::dedupe_key(next, None, report_id);
        let payload = json!({"predecessor_output_id": output_id});
        deps.queue.enqueue(report_id, next, dedupe_key, payload, None).await?;
    }
    Ok(())
}
