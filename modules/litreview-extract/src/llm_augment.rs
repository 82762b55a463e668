use litreview_common::types::{Outcome, StudyResult};
use serde::{Deserialize, Serialize};

/// Fields the model is permitted to fill — everything else in its
/// response is ignored even if present, and any attempt to change
/// `study_id`, `title`, `year`, or `design` is rejected at validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentedOutcome {
    pub outcome_measured: Option<String>,
    pub citation_snippet: Option<String>,
    pub key_result: Option<String>,
    pub intervention: Option<String>,
    pub comparator: Option<String>,
    pub effect_size: Option<String>,
    pub p_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentedStudy {
    pub study_id: String,
    pub sample_size: Option<i64>,
    pub population: Option<String>,
    pub citation_count: Option<i64>,
    pub pdf_url: Option<String>,
    pub landing_page_url: Option<String>,
    pub doi: Option<String>,
    pub pubmed_id: Option<String>,
    pub openalex_id: Option<String>,
    pub outcomes: Vec<AugmentedOutcome>,
}

#[derive(Debug, thiserror::Error)]
pub enum AugmentError {
    #[error("http error: {0}")]
    Http(String),
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Validate that the model's response doesn't attempt to smuggle in
/// changes to locked fields. The model's JSON schema never exposes
/// title/year/design, so this is a defense-in-depth check against a
/// malformed or adversarial response, not the primary guard.
pub fn validate(requested_ids: &[String], response: &[AugmentedStudy]) -> Result<(), AugmentError> {
    for study in response {
        if !requested_ids.contains(&study.study_id) {
            return Err(AugmentError::Validation(format!("unexpected study_id {}", study.study_id)));
        }
    }
    Ok(())
}

fn key(outcome_measured: &Option<String>, citation_snippet: &Option<String>) -> (String, String) {
    (
        outcome_measured.as_deref().unwrap_or_default().trim().to_lowercase(),
        citation_snippet.as_deref().unwrap_or_default().trim().to_lowercase(),
    )
}

fn merge_outcomes(base: Vec<Outcome>, augmented: &[AugmentedOutcome]) -> Vec<Outcome> {
    let mut keyed: std::collections::HashMap<(String, String), &AugmentedOutcome> = std::collections::HashMap::new();
    for a in augmented {
        keyed.insert(key(&a.outcome_measured, &a.citation_snippet), a);
    }

    base.into_iter()
        .enumerate()
        .map(|(idx, mut outcome)| {
            let matched = keyed.get(&key(&outcome.outcome_measured, &outcome.citation_snippet)).copied().or_else(|| augmented.get(idx));
            if let Some(a) = matched {
                if outcome.intervention.is_none() {
                    outcome.intervention = a.intervention.clone();
                }
                if outcome.comparator.is_none() {
                    outcome.comparator = a.comparator.clone();
                }
                if outcome.effect_size.is_none() {
                    outcome.effect_size = a.effect_size.clone();
                }
                if outcome.p_value.is_none() {
                    outcome.p_value = a.p_value.clone();
                }
                if outcome.key_result.is_none() {
                    outcome.key_result = a.key_result.clone();
                }
            }
            outcome
        })
        .collect()
}

/// Merge a model's augmentation onto the deterministic baseline. The base
/// is always truth; only fields null in the base are ever overwritten.
pub fn merge(mut base: StudyResult, augmented: &AugmentedStudy) -> StudyResult {
    if base.sample_size.is_none() {
        base.sample_size = augmented.sample_size;
    }
    if base.population.is_none() {
        base.population = augmented.population.clone();
    }
    if base.citation_count.is_none() {
        base.citation_count = augmented.citation_count;
    }
    if base.pdf_url.is_none() {
        base.pdf_url = augmented.pdf_url.clone();
    }
    if base.landing_page_url.is_none() {
        base.landing_page_url = augmented.landing_page_url.clone();
    }
    if base.doi.is_none() {
        base.doi = augmented.doi.clone();
    }
    if base.pubmed_id.is_none() {
        base.pubmed_id = augmented.pubmed_id.clone();
    }
    if base.openalex_id.is_none() {
        base.openalex_id = augmented.openalex_id.clone();
    }
    base.outcomes = merge_outcomes(base.outcomes, &augmented.outcomes);
    base.llm_fallback_applied = true;
    base
}

pub struct LlmAugmentClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

pub const BATCH_SIZE: usize = 15;

impl LlmAugmentClient {
    pub fn new(client: reqwest::Client, endpoint: String, api_key: Option<String>) -> Self {
        Self { client, endpoint, api_key }
    }

    /// Send one locked-baseline batch and return validated augmentations.
    /// Any HTTP error (401/429/5xx/network) or schema violation is
    /// reported as an error; callers fall back to the deterministic base.
    pub async fn augment_batch(&self, batch: &[StudyResult]) -> Result<Vec<AugmentedStudy>, AugmentError> {
        let ids: Vec<String> = batch.iter().map(|s| s.study_id.clone()).collect();

        let mut request = self.client.post(&self.endpoint).json(&serde_json::json!({
            "locked_baseline": batch,
            "fillable_fields": [
                "sample_size", "population", "outcome.key_result", "outcome.intervention",
                "outcome.comparator", "outcome.effect_size", "outcome.p_value",
                "citation.doi", "citation.pubmed_id", "citation.openalex_id",
                "citationCount", "pdf_url", "landing_page_url",
            ],
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| AugmentError::Http(e.to_string()))?;
        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 429 || status.is_server_error() {
            return Err(AugmentError::Http(format!("model endpoint status {status}")));
        }
        if !status.is_success() {
            return Err(AugmentError::Http(format!("model endpoint status {status}")));
        }

        let parsed: Vec<AugmentedStudy> = response.json().await.map_err(|e| AugmentError::Http(e.to_string()))?;
        validate(&ids, &parsed)?;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litreview_common::types::{CompletenessTier, PreprintStatus, StudyDesign};

    fn base_study() -> StudyResult {
        StudyResult {
            study_id: "paper_x".into(),
            title: "A Study".into(),
            year: Some(2020),
            design: StudyDesign::Rct,
            preprint_status: PreprintStatus::None,
            review_type: None,
            sample_size: None,
            population: None,
            abstract_excerpt: Some("a".repeat(60)),
            outcomes: vec![Outcome {
                outcome_measured: Some("blood pressure".into()),
                intervention: None,
                comparator: None,
                effect_size: None,
                p_value: None,
                confidence_interval: None,
                key_result: None,
                citation_snippet: Some("reduced blood pressure".into()),
                score: 0.25,
            }],
            doi: None,
            pubmed_id: None,
            openalex_id: None,
            citation_count: None,
            pdf_url: None,
            landing_page_url: None,
            used_pdf: false,
            fallback_reason: None,
            llm_fallback_applied: false,
            completeness: CompletenessTier::Partial,
        }
    }

    #[test]
    fn merge_only_fills_null_fields() {
        let base = base_study();
        let augmented = AugmentedStudy {
            study_id: "paper_x".into(),
            sample_size: Some(200),
            population: Some("adults with hypertension".into()),
            citation_count: Some(12),
            pdf_url: None,
            landing_page_url: None,
            doi: Some("10.1/zzz".into()),
            pubmed_id: None,
            openalex_id: None,
            outcomes: vec![AugmentedOutcome {
                outcome_measured: Some("blood pressure".into()),
                citation_snippet: Some("reduced blood pressure".into()),
                key_result: Some("blood pressure dropped".into()),
                intervention: Some("drug X".into()),
                comparator: Some("placebo".into()),
                effect_size: Some("OR=1.8".into()),
                p_value: Some("p<0.05".into()),
            }],
        };

        let merged = merge(base, &augmented);
        assert_eq!(merged.sample_size, Some(200));
        assert_eq!(merged.doi.as_deref(), Some("10.1/zzz"));
        assert_eq!(merged.outcomes[0].intervention.as_deref(), Some("drug X"));
        assert!(merged.llm_fallback_applied);
    }

    #[test]
    fn validate_rejects_unrequested_study_id() {
        let augmented = vec![AugmentedStudy {
            study_id: "other".into(),
            sample_size: None,
            population: None,
            citation_count: None,
            pdf_url: None,
            landing_page_url: None,
            doi: None,
            pubmed_id: None,
            openalex_id: None,
            outcomes: vec![],
        }];
        assert!(validate(&["paper_x".to_string()], &augmented).is_err());
    }
}
