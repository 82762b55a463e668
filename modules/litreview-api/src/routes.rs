use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::rest;
use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/search", post(rest::search::create_search))
        .route("/search/{id}", get(rest::search::get_search))
        .route("/search/{id}/runs", get(rest::runs::list_runs))
        .route("/search/{id}/runs/{run_id}", get(rest::runs::get_run))
        .route("/paper/{id}", get(rest::paper::get_paper))
        .route("/jobs/drain", post(rest::drain::drain_jobs))
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
