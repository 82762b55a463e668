use std::env;

/// Query-preparation mode for INGEST_PROVIDER (§6, `QUERY_PIPELINE_MODE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPipelineMode {
    V1,
    V2,
    Shadow,
}

impl QueryPipelineMode {
    fn parse(raw: &str) -> Self {
        match raw {
            "v2" => QueryPipelineMode::V2,
            "shadow" => QueryPipelineMode::Shadow,
            _ => QueryPipelineMode::V1,
        }
    }
}

/// Extraction engine selector (`EXTRACTION_ENGINE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionEngine {
    Llm,
    Scripted,
    Hybrid,
}

impl ExtractionEngine {
    fn parse(raw: &str) -> Self {
        match raw {
            "llm" => ExtractionEngine::Llm,
            "scripted" => ExtractionEngine::Scripted,
            _ => ExtractionEngine::Hybrid,
        }
    }
}

/// Metadata enrichment application mode (`METADATA_ENRICHMENT_MODE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataEnrichmentMode {
    OfflineShadow,
    OfflineApply,
    InlineApply,
}

impl MetadataEnrichmentMode {
    fn parse(raw: &str) -> Self {
        match raw {
            "offline_apply" => MetadataEnrichmentMode::OfflineApply,
            "inline_apply" => MetadataEnrichmentMode::InlineApply,
            _ => MetadataEnrichmentMode::OfflineShadow,
        }
    }
}

/// Process-wide configuration loaded from environment variables.
///
/// Every field recognized by §6 of the specification lands here. Binaries
/// (api, worker, migrate) each call the constructor appropriate to their
/// needs; fields they don't use are left at their defaults rather than
/// forcing every binary to supply every variable.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,

    pub query_pipeline_mode: QueryPipelineMode,
    pub extraction_engine: ExtractionEngine,
    pub extraction_max_candidates: u32,
    pub pdf_parse_timeout_ms: u64,
    pub metadata_enrichment_mode: MetadataEnrichmentMode,
    pub metadata_enrichment_inline_percent: u8,
    pub metadata_enrichment_max_latency_ms: u64,
    pub metadata_enrichment_retry_max: u8,

    pub worker_drain_token: String,

    pub openalex_api_key: Option<String>,
    pub semantic_scholar_api_key: Option<String>,
    pub pubmed_api_key: Option<String>,
    pub crossref_mailto: Option<String>,

    pub model_endpoint: Option<String>,
    pub model_api_key: Option<String>,
    pub model_augment_allowed: bool,

    pub pdf_extractor_endpoint: Option<String>,
    pub pdf_downloader_endpoint: Option<String>,

    pub api_host: String,
    pub api_port: u16,
}

impl Config {
    /// Load full configuration from the environment. Panics with a clear
    /// message if a required variable is missing — fail fast at startup,
    /// not on the first request.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),

            query_pipeline_mode: QueryPipelineMode::parse(
                &env::var("QUERY_PIPELINE_MODE").unwrap_or_else(|_| "v1".to_string()),
            ),
            extraction_engine: ExtractionEngine::parse(
                &env::var("EXTRACTION_ENGINE").unwrap_or_else(|_| "hybrid".to_string()),
            ),
            extraction_max_candidates: clamp_u32(
                env_u32("EXTRACTION_MAX_CANDIDATES", 45),
                5,
                60,
            ),
            pdf_parse_timeout_ms: clamp_u64(env_u64("PDF_PARSE_TIMEOUT_MS", 12_000), 1_000, 60_000),
            metadata_enrichment_mode: MetadataEnrichmentMode::parse(
                &env::var("METADATA_ENRICHMENT_MODE").unwrap_or_else(|_| "offline_shadow".to_string()),
            ),
            metadata_enrichment_inline_percent: env_u32("METADATA_ENRICHMENT_INLINE_PERCENT", 0)
                .min(100) as u8,
            metadata_enrichment_max_latency_ms: env_u64("METADATA_ENRICHMENT_MAX_LATENCY_MS", 5_000)
                .max(200),
            metadata_enrichment_retry_max: clamp_u32(
                env_u32("METADATA_ENRICHMENT_RETRY_MAX", 4),
                1,
                8,
            ) as u8,

            worker_drain_token: env::var("WORKER_DRAIN_TOKEN").unwrap_or_default(),

            openalex_api_key: env::var("OPENALEX_API_KEY").ok(),
            semantic_scholar_api_key: env::var("SEMANTIC_SCHOLAR_API_KEY").ok(),
            pubmed_api_key: env::var("PUBMED_API_KEY").ok(),
            crossref_mailto: env::var("CROSSREF_MAILTO").ok(),

            model_endpoint: env::var("MODEL_ENDPOINT").ok(),
            model_api_key: env::var("MODEL_API_KEY").ok(),
            model_augment_allowed: env::var("MODEL_AUGMENT_ALLOWED")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),

            pdf_extractor_endpoint: env::var("PDF_EXTRACTOR_ENDPOINT").ok(),
            pdf_downloader_endpoint: env::var("PDF_DOWNLOADER_ENDPOINT").ok(),

            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env_u32("API_PORT", 8080) as u16,
        }
    }

    /// Log the presence (not value) of every sensitive variable.
    pub fn log_redacted(&self) {
        let vars: &[(&str, &Option<String>)] = &[
            ("OPENALEX_API_KEY", &self.openalex_api_key),
            ("SEMANTIC_SCHOLAR_API_KEY", &self.semantic_scholar_api_key),
            ("PUBMED_API_KEY", &self.pubmed_api_key),
            ("MODEL_API_KEY", &self.model_api_key),
        ];
        for (name, value) in vars {
            match value {
                Some(v) => tracing::info!("{name} = ({} chars)", v.len()),
                None => tracing::info!("{name} = (unset)"),
            }
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn clamp_u32(v: u32, lo: u32, hi: u32) -> u32 {
    v.clamp(lo, hi)
}

fn clamp_u64(v: u64, lo: u64, hi: u64) -> u64 {
    v.clamp(lo, hi)
}
