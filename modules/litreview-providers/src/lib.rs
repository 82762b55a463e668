pub mod adaptors;
pub mod circuit_breaker;
pub mod provider;
pub mod retry;
pub mod token_bucket;

pub use adaptors::{ArxivClient, GatedProvider, OpenAlexClient, PubmedClient, RawFetch, SemanticScholarClient};
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use provider::{PreparedQuery, Provider, ProviderError, ProviderResponse};
pub use retry::{with_retry, AttemptOutcome, CallStats};
pub use token_bucket::TokenBucket;
