use std::time::Duration;

use async_trait::async_trait;
use litreview_common::types::{PreprintStatus, Source, UnifiedPaper};
use serde::Deserialize;

use crate::provider::{PreparedQuery, ProviderError};

use super::RawFetch;

pub struct SemanticScholarClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl SemanticScholarClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[derive(Deserialize)]
struct S2Response {
    data: Vec<S2Paper>,
}

#[derive(Deserialize)]
struct S2Paper {
    #[serde(rename = "paperId")]
    paper_id: String,
    title: Option<String>,
    year: Option<i32>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(rename = "externalIds")]
    external_ids: Option<S2ExternalIds>,
    #[serde(rename = "citationCount")]
    citation_count: Option<i64>,
    #[serde(rename = "isOpenAccess")]
    is_open_access: Option<bool>,
    authors: Option<Vec<S2Author>>,
    venue: Option<String>,
    #[serde(rename = "openAccessPdf")]
    open_access_pdf: Option<S2Pdf>,
}

#[derive(Deserialize)]
struct S2ExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "PubMed")]
    pubmed: Option<String>,
    #[serde(rename = "ArXiv")]
    arxiv: Option<String>,
}

#[derive(Deserialize)]
struct S2Author {
    name: Option<String>,
}

#[derive(Deserialize)]
struct S2Pdf {
    url: Option<String>,
}

#[async_trait]
impl RawFetch for SemanticScholarClient {
    fn source(&self) -> Source {
        Source::SemanticScholar
    }

    fn min_request_interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn fetch_once(&self, query: &PreparedQuery, max_candidates: u32) -> Result<(Vec<UnifiedPaper>, u16), ProviderError> {
        let fields = "title,year,abstract,externalIds,citationCount,isOpenAccess,authors,venue,openAccessPdf";
        let mut request = self.client.get("https://api.semanticscholar.org/graph/v1/paper/search").query(&[
            ("query", query.api_query.as_str()),
            ("limit", &max_candidates.min(100).to_string()),
            ("fields", fields.to_string().as_str()),
        ]);

        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| ProviderError::Upstream(e.to_string()))?;
        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited("semantic scholar rate limited".into()));
        }
        if status >= 500 {
            return Err(ProviderError::Upstream(format!("semantic scholar status {status}")));
        }
        if status >= 400 {
            return Err(ProviderError::Upstream(format!("semantic scholar status {status}")));
        }

        let body: S2Response = response.json().await.map_err(|e| ProviderError::Upstream(e.to_string()))?;

        let papers = body
            .data
            .into_iter()
            .map(|p| {
                let external = p.external_ids.unwrap_or(S2ExternalIds { doi: None, pubmed: None, arxiv: None });
                UnifiedPaper {
                    id: p.paper_id.clone(),
                    title: p.title.unwrap_or_default(),
                    year: p.year,
                    abstract_text: p.abstract_text,
                    authors: p.authors.unwrap_or_default().into_iter().filter_map(|a| a.name).collect(),
                    venue: p.venue,
                    source: Source::SemanticScholar,
                    doi: external.doi,
                    pubmed_id: external.pubmed,
                    openalex_id: None,
                    arxiv_id: external.arxiv,
                    citation_count: p.citation_count,
                    publication_types: Vec::new(),
                    references: Vec::new(),
                    is_retracted: false,
                    preprint_status: if p.is_open_access.unwrap_or(false) {
                        PreprintStatus::Preprint
                    } else {
                        PreprintStatus::None
                    },
                    rank_signal: 1.0,
                    pdf_url: p.open_access_pdf.and_then(|pdf| pdf.url),
                    landing_page_url: None,
                }
            })
            .collect();

        Ok((papers, status))
    }
}
