use litreview_common::types::StudyResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct PdfExtractionRequest {
    pub study_id: String,
    pub title: String,
    pub abstract_text: Option<String>,
    pub pdf_url: Option<String>,
    pub landing_page_url: Option<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PdfExtractionResponse {
    pub study: StudyResult,
    pub diagnostics: PdfDiagnostics,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PdfDiagnostics {
    pub pages_parsed: u32,
    pub warnings: Vec<String>,
}

/// Optional external PDF extractor (§4.5.5). Any failure — network error,
/// timeout, non-2xx, or malformed body — is the caller's cue to fall back
/// to abstract-based extraction; this client never panics on failure.
pub struct PdfExtractorClient {
    client: reqwest::Client,
    endpoint: String,
}

impl PdfExtractorClient {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }

    pub async fn extract_batch(&self, requests: &[PdfExtractionRequest]) -> Result<Vec<PdfExtractionResponse>, String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "requests": requests }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("pdf extractor status {}", response.status()));
        }

        #[derive(Deserialize)]
        struct Envelope {
            results: Vec<PdfExtractionResponse>,
        }

        let envelope: Envelope = response.json().await.map_err(|e| e.to_string())?;
        Ok(envelope.results)
    }
}
