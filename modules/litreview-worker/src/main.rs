//! Background worker: polls the job queue, runs each claimed job through
//! the pipeline runner, and periodically reaps expired leases left behind
//! by crashed workers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use litreview_common::Config;
use litreview_persistence::PipelineVersionTuple;
use litreview_pipeline::{build_providers, JobOutcome, PipelineDeps, PipelineRunner};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

const BATCH_SIZE: u32 = 10;
const LEASE_SECONDS: i64 = 120;
const EMPTY_POLL_DELAY: Duration = Duration::from_millis(1_500);
const REAP_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    tracing::info!("litreview-worker starting");

    let config = Config::from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new().max_connections(8).connect(&config.database_url).await?;

    let version_repo = litreview_persistence::PipelineVersionRepo::new(pool.clone());
    let pipeline_version_id = version_repo
        .get_or_create(&PipelineVersionTuple {
            query_pipeline_version: format!("{:?}", config.query_pipeline_mode),
            extraction_engine_version: format!("{:?}", config.extraction_engine),
            canonicalization_version: "v1".to_string(),
            quality_model_version: "v1".to_string(),
        })
        .await?;

    let http_client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
    let providers = build_providers(&config, http_client.clone());

    let deps = PipelineDeps::new(pool, providers, pipeline_version_id, config, http_client);
    let runner = Arc::new(PipelineRunner::new(deps));

    let owner = format!("worker-{}", uuid::Uuid::new_v4());
    tracing::info!(owner, "claiming jobs as");

    let reap_runner = runner.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REAP_INTERVAL);
        loop {
            interval.tick().await;
            match reap_runner.deps().queue.reap_expired_leases().await {
                Ok(n) if n > 0 => tracing::info!(reaped = n, "reclaimed expired leases"),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "failed to reap expired leases"),
            }
        }
    });

    loop {
        let jobs = match runner.deps().queue.claim_batch(&owner, BATCH_SIZE, LEASE_SECONDS).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::warn!(error = %e, "failed to claim jobs, backing off");
                tokio::time::sleep(EMPTY_POLL_DELAY).await;
                continue;
            }
        };

        if jobs.is_empty() {
            tokio::time::sleep(EMPTY_POLL_DELAY).await;
            continue;
        }

        let mut handles = Vec::with_capacity(jobs.len());
        for job in jobs {
            let runner = runner.clone();
            handles.push(tokio::spawn(async move {
                let job_id = job.id;
                let stage = job.stage.as_str();
                match runner.run_job(job).await {
                    Ok(JobOutcome::Completed) => tracing::debug!(%job_id, stage, "job completed"),
                    Ok(JobOutcome::Retried) => tracing::debug!(%job_id, stage, "job requeued for retry"),
                    Ok(JobOutcome::Dead) => tracing::warn!(%job_id, stage, "job exhausted retries, marked dead"),
                    Err(e) => tracing::error!(%job_id, stage, error = %e, "failed to record job outcome"),
                }
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }
    }
}
