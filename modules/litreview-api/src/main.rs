//! HTTP API: accepts search requests, reports status and results, and
//! exposes a token-gated drain endpoint for running queued jobs without a
//! separate worker process (useful for small deployments and tests).

mod rest;
mod routes;
mod state;

use std::sync::Arc;

use litreview_common::Config;
use litreview_persistence::PipelineVersionTuple;
use litreview_pipeline::{build_providers, PipelineDeps, PipelineRunner};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).json().init();

    let config = Config::from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new().max_connections(20).connect(&config.database_url).await?;

    let version_repo = litreview_persistence::PipelineVersionRepo::new(pool.clone());
    let pipeline_version_id = version_repo
        .get_or_create(&PipelineVersionTuple {
            query_pipeline_version: format!("{:?}", config.query_pipeline_mode),
            extraction_engine_version: format!("{:?}", config.extraction_engine),
            canonicalization_version: "v1".to_string(),
            quality_model_version: "v1".to_string(),
        })
        .await?;

    let http_client = reqwest::Client::builder().timeout(std::time::Duration::from_secs(30)).build()?;
    let providers = build_providers(&config, http_client.clone());

    let deps = PipelineDeps::new(pool, providers, pipeline_version_id, config.clone(), http_client);
    let runner = PipelineRunner::new(deps);
    let state = Arc::new(AppState { runner });

    let app = routes::build_router(state);

    let addr = format!("{}:{}", config.api_host, config.api_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "litreview-api listening");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
