use std::time::Duration;

use async_trait::async_trait;
use litreview_common::types::{PreprintStatus, Source, UnifiedPaper};

use crate::provider::{PreparedQuery, ProviderError};

use super::RawFetch;

/// arXiv's search API returns an Atom XML feed, not JSON. Parsing is done
/// with a small hand-rolled tag scanner rather than pulling in a full XML
/// crate for four fields — this matches how lean the other adaptors are.
pub struct ArxivClient {
    client: reqwest::Client,
}

impl ArxivClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RawFetch for ArxivClient {
    fn source(&self) -> Source {
        Source::Arxiv
    }

    fn min_request_interval(&self) -> Duration {
        Duration::from_millis(3_000)
    }

    async fn fetch_once(&self, query: &PreparedQuery, max_candidates: u32) -> Result<(Vec<UnifiedPaper>, u16), ProviderError> {
        let response = self
            .client
            .get("http://export.arxiv.org/api/query")
            .query(&[
                ("search_query", format!("all:{}", query.api_query)),
                ("max_results", max_candidates.min(100).to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Upstream(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 429 {
            return Err(ProviderError::RateLimited("arxiv rate limited".into()));
        }
        if status >= 500 {
            return Err(ProviderError::Upstream(format!("arxiv status {status}")));
        }

        let body = response.text().await.map_err(|e| ProviderError::Upstream(e.to_string()))?;
        let papers = parse_atom_feed(&body);
        Ok((papers, status))
    }
}

fn parse_atom_feed(xml: &str) -> Vec<UnifiedPaper> {
    xml.split("<entry>")
        .skip(1)
        .map(|entry| {
            let id = extract_tag(entry, "id").unwrap_or_default();
            let arxiv_id = id.rsplit('/').next().map(|s| s.to_string());
            let title = extract_tag(entry, "title").unwrap_or_default().replace('\n', " ").trim().to_string();
            let summary = extract_tag(entry, "summary").map(|s| s.replace('\n', " ").trim().to_string());
            let year = extract_tag(entry, "published").and_then(|p| p.get(0..4)?.parse().ok());
            let authors = extract_all_tags(entry, "name");

            UnifiedPaper {
                id: id.clone(),
                title,
                year,
                abstract_text: summary,
                authors,
                venue: None,
                source: Source::Arxiv,
                doi: None,
                pubmed_id: None,
                openalex_id: None,
                arxiv_id,
                citation_count: None,
                publication_types: Vec::new(),
                references: Vec::new(),
                is_retracted: false,
                preprint_status: PreprintStatus::Preprint,
                rank_signal: 1.0,
                pdf_url: None,
                landing_page_url: Some(id),
            }
        })
        .collect()
}

fn extract_tag(entry: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = entry.find(&open)? + open.len();
    let end = entry[start..].find(&close)? + start;
    Some(entry[start..end].to_string())
}

fn extract_all_tags(entry: &str, tag: &str) -> Vec<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut out = Vec::new();
    let mut rest = entry;
    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        if let Some(end) = after.find(&close) {
            out.push(after[..end].to_string());
            rest = &after[end + close.len()..];
        } else {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_atom_entry() {
        let xml = r#"<feed><entry>
            <id>http://arxiv.org/abs/1234.5678v1</id>
            <title>A Study of Things</title>
            <summary>We study things.</summary>
            <published>2021-05-01T00:00:00Z</published>
            <author><name>Jane Doe</name></author>
        </entry></feed>"#;
        let papers = parse_atom_feed(xml);
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title, "A Study of Things");
        assert_eq!(papers[0].arxiv_id.as_deref(), Some("1234.5678v1"));
        assert_eq!(papers[0].year, Some(2021));
        assert_eq!(papers[0].authors, vec!["Jane Doe".to_string()]);
    }
}
