use async_trait::async_trait;
use litreview_common::types::{Source, UnifiedPaper};

use crate::retry::CallStats;

/// A search query as prepared upstream in NORMALIZE/INGEST_PROVIDER: the
/// original user text, an expanded keyword form, and the provider-specific
/// query string actually sent over the wire.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub original_keyword_query: String,
    pub expanded_keyword_query: String,
    pub api_query: String,
}

#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub papers: Vec<UnifiedPaper>,
    pub stats: CallStats,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("timeout")]
    Timeout,
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("circuit open")]
    CircuitOpen,
}

/// A single external bibliographic source (§6).
#[async_trait]
pub trait Provider: Send + Sync {
    fn source(&self) -> Source;

    /// Minimum spacing between requests this provider enforces, per §6
    /// (e.g. PubMed 120ms with an API key, 350ms without; Semantic
    /// Scholar 1s).
    fn min_request_interval(&self) -> std::time::Duration;

    async fn search(&self, query: &PreparedQuery, max_candidates: u32) -> Result<ProviderResponse, ProviderError>;
}
