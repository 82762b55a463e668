use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use uuid::Uuid;

use crate::state::SharedState;

/// `GET /search/{id}/runs` (§6): every extraction run recorded for a
/// report, oldest first.
pub async fn list_runs(State(state): State<SharedState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    match state.deps().run_repo.list_summaries(id).await {
        Ok(summaries) => (StatusCode::OK, Json(summaries)).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to list runs");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"error": "failed to list runs"}))).into_response()
        }
    }
}

/// `GET /search/{id}/runs/{run_id}` (§6): the detail table for one run.
pub async fn get_run(State(state): State<SharedState>, Path((id, run_id)): Path<(Uuid, Uuid)>) -> impl IntoResponse {
    match state.deps().run_repo.get_detail(id, run_id).await {
        Ok(Some(detail)) => (StatusCode::OK, Json(detail)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "run not found"}))).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load run detail");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"error": "failed to load run"}))).into_response()
        }
    }
}
