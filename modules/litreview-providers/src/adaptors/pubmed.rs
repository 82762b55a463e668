use std::time::Duration;

use async_trait::async_trait;
use litreview_common::types::{PreprintStatus, Source, UnifiedPaper};
use serde::Deserialize;

use crate::provider::{PreparedQuery, ProviderError};

use super::RawFetch;

/// PubMed E-utilities: `esearch` for matching PMIDs, then `esummary` for
/// their metadata. Two calls per search, both gated by the same bucket.
pub struct PubmedClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl PubmedClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[derive(Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Deserialize)]
struct ESearchResult {
    idlist: Vec<String>,
}

#[derive(Deserialize)]
struct ESummaryResponse {
    result: serde_json::Value,
}

#[async_trait]
impl RawFetch for PubmedClient {
    fn source(&self) -> Source {
        Source::Pubmed
    }

    fn min_request_interval(&self) -> Duration {
        if self.api_key.is_some() {
            Duration::from_millis(120)
        } else {
            Duration::from_millis(350)
        }
    }

    async fn fetch_once(&self, query: &PreparedQuery, max_candidates: u32) -> Result<(Vec<UnifiedPaper>, u16), ProviderError> {
        let mut search = self.client.get("https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi").query(&[
            ("db", "pubmed"),
            ("retmode", "json"),
            ("term", query.api_query.as_str()),
            ("retmax", &max_candidates.min(200).to_string()),
        ]);
        if let Some(key) = &self.api_key {
            search = search.query(&[("api_key", key.as_str())]);
        }

        let search_response = search.send().await.map_err(|e| ProviderError::Upstream(e.to_string()))?;
        let status = search_response.status().as_u16();
        if status == 429 {
            return Err(ProviderError::RateLimited("pubmed esearch rate limited".into()));
        }
        if status >= 400 {
            return Err(ProviderError::Upstream(format!("pubmed esearch status {status}")));
        }

        let ids = search_response
            .json::<ESearchResponse>()
            .await
            .map_err(|e| ProviderError::Upstream(e.to_string()))?
            .esearchresult
            .idlist;

        if ids.is_empty() {
            return Ok((Vec::new(), status));
        }

        let mut summary = self.client.get("https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi").query(&[
            ("db", "pubmed"),
            ("retmode", "json"),
            ("id", ids.join(",").as_str()),
        ]);
        if let Some(key) = &self.api_key {
            summary = summary.query(&[("api_key", key.as_str())]);
        }

        let summary_response = summary.send().await.map_err(|e| ProviderError::Upstream(e.to_string()))?;
        let summary_status = summary_response.status().as_u16();
        if summary_status >= 400 {
            return Err(ProviderError::Upstream(format!("pubmed esummary status {summary_status}")));
        }

        let body: ESummaryResponse = summary_response.json().await.map_err(|e| ProviderError::Upstream(e.to_string()))?;
        let papers = ids
            .iter()
            .filter_map(|id| {
                let record = body.result.get(id)?;
                Some(UnifiedPaper {
                    id: id.clone(),
                    title: record.get("title").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                    year: record
                        .get("pubdate")
                        .and_then(|v| v.as_str())
                        .and_then(|s| s.get(0..4))
                        .and_then(|y| y.parse().ok()),
                    abstract_text: None,
                    authors: record
                        .get("authors")
                        .and_then(|v| v.as_array())
                        .map(|authors| {
                            authors
                                .iter()
                                .filter_map(|a| a.get("name").and_then(|n| n.as_str()).map(|s| s.to_string()))
                                .collect()
                        })
                        .unwrap_or_default(),
                    venue: record.get("fulljournalname").and_then(|v| v.as_str()).map(|s| s.to_string()),
                    source: Source::Pubmed,
                    doi: record
                        .get("articleids")
                        .and_then(|v| v.as_array())
                        .and_then(|ids| ids.iter().find(|a| a.get("idtype").and_then(|t| t.as_str()) == Some("doi")))
                        .and_then(|a| a.get("value").and_then(|v| v.as_str()))
                        .map(|s| s.to_string()),
                    pubmed_id: Some(id.clone()),
                    openalex_id: None,
                    arxiv_id: None,
                    citation_count: None,
                    publication_types: record
                        .get("pubtype")
                        .and_then(|v| v.as_array())
                        .map(|types| types.iter().filter_map(|t| t.as_str().map(|s| s.to_string())).collect())
                        .unwrap_or_default(),
                    references: Vec::new(),
                    is_retracted: false,
                    preprint_status: PreprintStatus::None,
                    rank_signal: 1.0,
                    pdf_url: None,
                    landing_page_url: Some(format!("https://pubmed.ncbi.nlm.nih.gov/{id}/")),
                })
            })
            .collect();

        Ok((papers, summary_status))
    }
}
