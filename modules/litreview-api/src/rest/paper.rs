use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use crate::state::SharedState;

/// `GET /paper/{id}` (§6): the canonical paper record, served straight
/// from the canonical-record cache that DEDUPE populates — no report
/// context required.
pub async fn get_paper(State(state): State<SharedState>, Path(paper_id): Path<String>) -> impl IntoResponse {
    match state.deps().canonical_record_cache.get(&paper_id).await {
        Ok(litreview_cache::Lookup::Hit(value) | litreview_cache::Lookup::Stale(value)) => (StatusCode::OK, Json(value)).into_response(),
        Ok(litreview_cache::Lookup::Miss) => (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "paper not found"}))).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load canonical paper");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"error": "failed to load paper"}))).into_response()
        }
    }
}
