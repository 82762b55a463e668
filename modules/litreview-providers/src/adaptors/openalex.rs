use std::time::Duration;

use async_trait::async_trait;
use litreview_common::types::{PreprintStatus, Source, UnifiedPaper};
use serde::Deserialize;

use crate::provider::{PreparedQuery, ProviderError};

use super::RawFetch;

pub struct OpenAlexClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl OpenAlexClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[derive(Deserialize)]
struct OpenAlexResponse {
    results: Vec<OpenAlexWork>,
}

#[derive(Deserialize)]
struct OpenAlexWork {
    id: String,
    title: Option<String>,
    publication_year: Option<i32>,
    doi: Option<String>,
    cited_by_count: Option<i64>,
    #[serde(rename = "type")]
    work_type: Option<String>,
    authorships: Option<Vec<OpenAlexAuthorship>>,
    host_venue: Option<OpenAlexVenue>,
}

#[derive(Deserialize)]
struct OpenAlexAuthorship {
    author: OpenAlexAuthor,
}

#[derive(Deserialize)]
struct OpenAlexAuthor {
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct OpenAlexVenue {
    display_name: Option<String>,
}

#[async_trait]
impl RawFetch for OpenAlexClient {
    fn source(&self) -> Source {
        Source::Openalex
    }

    fn min_request_interval(&self) -> Duration {
        // OpenAlex's polite pool is generous; a 100ms floor avoids bursts.
        Duration::from_millis(100)
    }

    async fn fetch_once(&self, query: &PreparedQuery, max_candidates: u32) -> Result<(Vec<UnifiedPaper>, u16), ProviderError> {
        let mut request = self
            .client
            .get("https://api.openalex.org/works")
            .query(&[("search", query.api_query.as_str()), ("per-page", &max_candidates.min(200).to_string())]);

        if let Some(key) = &self.api_key {
            request = request.query(&[("api_key", key.as_str())]);
        }

        let response = request.send().await.map_err(|e| ProviderError::Upstream(e.to_string()))?;
        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited("openalex rate limited".into()));
        }
        if status >= 500 {
            return Err(ProviderError::Upstream(format!("openalex status {status}")));
        }
        if status >= 400 {
            return Err(ProviderError::Upstream(format!("openalex status {status}")));
        }

        let body: OpenAlexResponse = response.json().await.map_err(|e| ProviderError::Upstream(e.to_string()))?;

        let papers = body
            .results
            .into_iter()
            .map(|work| UnifiedPaper {
                id: work.id.clone(),
                title: work.title.unwrap_or_default(),
                year: work.publication_year,
                abstract_text: None,
                authors: work
                    .authorships
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|a| a.author.display_name)
                    .collect(),
                venue: work.host_venue.and_then(|v| v.display_name),
                source: Source::Openalex,
                doi: work.doi,
                pubmed_id: None,
                openalex_id: Some(work.id),
                arxiv_id: None,
                citation_count: work.cited_by_count,
                publication_types: work.work_type.into_iter().collect(),
                references: Vec::new(),
                is_retracted: false,
                preprint_status: PreprintStatus::None,
                rank_signal: 1.0,
                pdf_url: None,
                landing_page_url: None,
            })
            .collect();

        Ok((papers, status))
    }
}
