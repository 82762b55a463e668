mod arxiv;
mod openalex;
mod pubmed;
mod semantic_scholar;

pub use arxiv::ArxivClient;
pub use openalex::OpenAlexClient;
pub use pubmed::PubmedClient;
pub use semantic_scholar::SemanticScholarClient;

use std::time::Duration;

use async_trait::async_trait;
use litreview_common::types::{Source, UnifiedPaper};

use crate::circuit_breaker::CircuitBreaker;
use crate::provider::{PreparedQuery, Provider, ProviderError, ProviderResponse};
use crate::retry::{with_retry, AttemptOutcome, CallStats};
use crate::token_bucket::TokenBucket;

/// The raw, ungated HTTP call for one provider. Adaptors implement only
/// this; rate limiting, circuit breaking, and retry are shared.
#[async_trait]
pub trait RawFetch: Send + Sync {
    fn source(&self) -> Source;
    fn min_request_interval(&self) -> Duration;

    /// A single HTTP attempt. Returns `Ok` with papers and an HTTP status,
    /// or a classified `ProviderError`.
    async fn fetch_once(&self, query: &PreparedQuery, max_candidates: u32) -> Result<(Vec<UnifiedPaper>, u16), ProviderError>;
}

/// Wraps a [`RawFetch`] adaptor with a per-provider token bucket, circuit
/// breaker, and retry-with-backoff policy — the shared Provider Runtime
/// described in §4.4.
pub struct GatedProvider<T: RawFetch> {
    inner: T,
    bucket: TokenBucket,
    breaker: CircuitBreaker,
    max_attempts: u32,
}

impl<T: RawFetch> GatedProvider<T> {
    pub fn new(inner: T, max_attempts: u32) -> Self {
        let interval = inner.min_request_interval();
        Self {
            inner,
            bucket: TokenBucket::new(interval),
            breaker: CircuitBreaker::new(5, Duration::from_secs(30)),
            max_attempts,
        }
    }
}

#[async_trait]
impl<T: RawFetch> Provider for GatedProvider<T> {
    fn source(&self) -> Source {
        self.inner.source()
    }

    fn min_request_interval(&self) -> Duration {
        self.inner.min_request_interval()
    }

    async fn search(&self, query: &PreparedQuery, max_candidates: u32) -> Result<ProviderResponse, ProviderError> {
        if !self.breaker.allow().await {
            return Err(ProviderError::CircuitOpen);
        }

        let (result, stats): (Result<Vec<UnifiedPaper>, String>, CallStats) = with_retry(self.max_attempts, |_attempt| async {
            self.bucket.acquire().await;
            match self.inner.fetch_once(query, max_candidates).await {
                Ok((papers, _status)) => AttemptOutcome::Ok(papers),
                Err(ProviderError::Timeout) => AttemptOutcome::Retry { error: "timeout".into(), retry_after: None },
                Err(ProviderError::RateLimited(msg)) => AttemptOutcome::Retry { error: msg, retry_after: None },
                Err(ProviderError::Upstream(msg)) => AttemptOutcome::Retry { error: msg, retry_after: None },
                Err(ProviderError::CircuitOpen) => AttemptOutcome::Fatal("circuit open".into()),
            }
        })
        .await;

        match result {
            Ok(papers) => {
                self.breaker.record_success().await;
                Ok(ProviderResponse { papers, stats })
            }
            Err(error) => {
                self.breaker.record_failure().await;
                Err(ProviderError::Upstream(error))
            }
        }
    }
}
