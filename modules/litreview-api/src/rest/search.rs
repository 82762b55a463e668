use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use litreview_common::types::{Job, SearchRequest, SearchResponse, Stage};
use uuid::Uuid;

use crate::state::SharedState;

/// `POST /search` (§6): returns `{search_id, status}` immediately. If an
/// identical request (same query/filters/response_mode/pipeline version)
/// has a cached completed payload, that payload is replayed and no new
/// report is created.
pub async fn create_search(State(state): State<SharedState>, Json(request): Json<SearchRequest>) -> impl IntoResponse {
    if request.query.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": "query must not be empty"}))).into_response();
    }

    let deps = state.deps();
    let cache_key = litreview_pipeline::cache_keys::query_cache_key(&request.query, &request.filters, request.response_mode, deps.pipeline_version_id);

    match deps.query_cache.get(&cache_key).await {
        Ok(litreview_cache::Lookup::Hit(payload)) => {
            tracing::info!(cache_key = %cache_key, "query cache hit, replaying cached report");
            return (StatusCode::OK, Json(payload)).into_response();
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "query cache lookup failed, continuing to create a new report");
        }
    }

    let report_id = match deps.report_repo.create(&request, deps.pipeline_version_id).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "failed to create report");
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"error": "failed to create report"}))).into_response();
        }
    };

    let payload = serde_json::json!({"request": request});
    let dedupe_key = Job::dedupe_key(Stage::IngestProvider, None, report_id);
    if let Err(e) = deps.queue.enqueue(report_id, Stage::IngestProvider, dedupe_key, payload, None).await {
        tracing::warn!(error = %e, "failed to enqueue ingest job");
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"error": "failed to enqueue pipeline"}))).into_response();
    }

    (StatusCode::ACCEPTED, Json(serde_json::json!({"search_id": report_id, "status": "running"}))).into_response()
}

/// `GET /search/{id}` (§6): current status, and the full payload once
/// completed.
pub async fn get_search(State(state): State<SharedState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    match state.deps().report_repo.get(id).await {
        Ok(Some(report)) => {
            if let Some(payload) = report.payload {
                return (StatusCode::OK, Json(payload)).into_response();
            }
            let response = SearchResponse {
                search_id: report.id,
                status: report.status,
                normalized_query: report.normalized_query,
                results: Vec::new(),
                partial_results: Vec::new(),
                extraction_stats: None,
                evidence_table: Vec::new(),
                brief: None,
                coverage: None,
                stats: None,
                canonical_papers: Vec::new(),
                active_run_id: report.active_run_id,
                run_version: report.run_version,
                error: report.error,
                created_at: report.created_at,
                updated_at: report.updated_at,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "search not found"}))).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load report");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"error": "failed to load search"}))).into_response()
        }
    }
}
