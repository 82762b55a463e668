use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use litreview_common::types::DrainRequest;
use litreview_pipeline::JobOutcome;

use crate::state::SharedState;

const DEFAULT_BATCH_SIZE: u32 = 10;
const DEFAULT_LEASE_SECONDS: i64 = 120;

/// `POST /jobs/drain` (§6): claims a batch of due jobs and runs them
/// in-process, returning aggregate counts. Gated by a shared drain token
/// so it can't be hit by anything but the operator or a scheduler.
pub async fn drain_jobs(State(state): State<SharedState>, headers: HeaderMap, Json(request): Json<DrainRequest>) -> impl IntoResponse {
    let expected = &state.deps().config.worker_drain_token;
    if expected.is_empty() {
        return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({"error": "drain endpoint not configured"}))).into_response();
    }
    let provided = headers.get("x-drain-token").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided != expected {
        return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({"error": "invalid drain token"}))).into_response();
    }

    let owner = request.worker_id.unwrap_or_else(|| "api-drain".to_string());
    let batch_size = request.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
    let lease_seconds = request.lease_seconds.map(|s| s as i64).unwrap_or(DEFAULT_LEASE_SECONDS);

    let jobs = match state.deps().queue.claim_batch(&owner, batch_size, lease_seconds).await {
        Ok(jobs) => jobs,
        Err(e) => {
            tracing::warn!(error = %e, "failed to claim jobs");
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"error": "failed to claim jobs"}))).into_response();
        }
    };

    let mut response = litreview_common::types::DrainResponse { claimed: jobs.len() as u32, ..Default::default() };

    for job in jobs {
        let job_id = job.id;
        match state.runner.run_job(job).await {
            Ok(JobOutcome::Completed) => response.completed += 1,
            Ok(JobOutcome::Retried) => response.retried += 1,
            Ok(JobOutcome::Dead) => response.dead += 1,
            Err(e) => {
                tracing::warn!(error = %e, job_id = %job_id, "job run failed to update queue state");
                response.failures.push(format!("{job_id}: {e}"));
            }
        }
    }

    (StatusCode::OK, Json(response)).into_response()
}
