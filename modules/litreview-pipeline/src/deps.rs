use std::sync::Arc;

use litreview_cache::{Cache, CacheName};
use litreview_common::types::Source;
use litreview_common::Config;
use litreview_extract::{LlmAugmentClient, PdfExtractorClient};
use litreview_persistence::{ExtractionRunRepo, PipelineVersionRepo, ReportRepo};
use litreview_providers::Provider;
use litreview_queue::Queue;
use litreview_store::StageOutputStore;
use sqlx::PgPool;
use uuid::Uuid;

/// Everything a stage needs to run, built once per worker process and
/// shared across jobs.
pub struct PipelineDeps {
    pub pool: PgPool,
    pub queue: Queue,
    pub store: StageOutputStore,
    pub query_cache: Cache,
    pub doi_cache: Cache,
    pub canonical_record_cache: Cache,
    pub extraction_cache: Cache,
    pub providers: Vec<(Source, Arc<dyn Provider>)>,
    pub report_repo: ReportRepo,
    pub run_repo: ExtractionRunRepo,
    pub version_repo: PipelineVersionRepo,
    pub pipeline_version_id: Uuid,
    pub config: Config,
    pub llm_client: Option<LlmAugmentClient>,
    pub pdf_client: Option<PdfExtractorClient>,
    pub http_client: reqwest::Client,
}

impl PipelineDeps {
    pub fn new(
        pool: PgPool,
        providers: Vec<(Source, Arc<dyn Provider>)>,
        pipeline_version_id: Uuid,
        config: Config,
        http_client: reqwest::Client,
    ) -> Self {
        let llm_client = match (&config.model_endpoint, config.model_augment_allowed) {
            (Some(endpoint), true) => Some(LlmAugmentClient::new(http_client.clone(), endpoint.clone(), config.model_api_key.clone())),
            _ => None,
        };
        let pdf_client = config
            .pdf_extractor_endpoint
            .as_ref()
            .map(|endpoint| PdfExtractorClient::new(http_client.clone(), endpoint.clone()));

        Self {
            queue: Queue::new(pool.clone()),
            store: StageOutputStore::new(pool.clone()),
            query_cache: Cache::new(pool.clone(), CacheName::Query),
            doi_cache: Cache::new(pool.clone(), CacheName::Doi),
            canonical_record_cache: Cache::new(pool.clone(), CacheName::CanonicalRecord),
            extraction_cache: Cache::new(pool.clone(), CacheName::Extraction),
            report_repo: ReportRepo::new(pool.clone()),
            run_repo: ExtractionRunRepo::new(pool.clone()),
            version_repo: PipelineVersionRepo::new(pool.clone()),
            providers,
            pipeline_version_id,
            config,
            llm_client,
            pdf_client,
            http_client,
            pool,
        }
    }
}
