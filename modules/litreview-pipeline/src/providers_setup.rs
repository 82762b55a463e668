//! Builds the gated provider set from configuration. Shared by every
//! binary that runs stages (`litreview-api`'s drain endpoint and
//! `litreview-worker`) so both construct the exact same runtime.

use std::sync::Arc;

use litreview_common::types::Source;
use litreview_common::Config;
use litreview_providers::{ArxivClient, GatedProvider, OpenAlexClient, Provider, PubmedClient, SemanticScholarClient};

const MAX_ATTEMPTS: u32 = 3;

pub fn build_providers(config: &Config, http_client: reqwest::Client) -> Vec<(Source, Arc<dyn Provider>)> {
    vec![
        (
            Source::Openalex,
            Arc::new(GatedProvider::new(OpenAlexClient::new(http_client.clone(), config.openalex_api_key.clone()), MAX_ATTEMPTS)) as Arc<dyn Provider>,
        ),
        (
            Source::SemanticScholar,
            Arc::new(GatedProvider::new(SemanticScholarClient::new(http_client.clone(), config.semantic_scholar_api_key.clone()), MAX_ATTEMPTS))
                as Arc<dyn Provider>,
        ),
        (
            Source::Arxiv,
            Arc::new(GatedProvider::new(ArxivClient::new(http_client.clone()), MAX_ATTEMPTS)) as Arc<dyn Provider>,
        ),
        (
            Source::Pubmed,
            Arc::new(GatedProvider::new(PubmedClient::new(http_client.clone(), config.pubmed_api_key.clone()), MAX_ATTEMPTS)) as Arc<dyn Provider>,
        ),
    ]
}
