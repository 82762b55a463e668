//! Cache key derivation shared between the worker (writing on completion)
//! and the API (reading on `POST /search` before creating a new report).

use litreview_common::hashing::content_hash_value;
use litreview_common::types::{Filters, ResponseMode};
use uuid::Uuid;

pub fn query_cache_key(query: &str, filters: &Filters, response_mode: ResponseMode, pipeline_version_id: Uuid) -> String {
    let basis = serde_json::json!({
        "query": query,
        "filters": filters,
        "response_mode": response_mode,
        "pipeline_version_id": pipeline_version_id,
    });
    content_hash_value(&basis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters() -> Filters {
        Filters { from_year: Some(2015), to_year: None, languages: vec!["en".to_string()], exclude_preprints: true }
    }

    #[test]
    fn same_inputs_produce_same_key() {
        let id = Uuid::nil();
        let a = query_cache_key("heart attack risk", &filters(), ResponseMode::Full, id);
        let b = query_cache_key("heart attack risk", &filters(), ResponseMode::Full, id);
        assert_eq!(a, b);
    }

    #[test]
    fn different_pipeline_version_changes_the_key() {
        let filters = filters();
        let a = query_cache_key("heart attack risk", &filters, ResponseMode::Full, Uuid::nil());
        let b = query_cache_key("heart attack risk", &filters, ResponseMode::Full, Uuid::new_v4());
        assert_ne!(a, b);
    }

    #[test]
    fn different_response_mode_changes_the_key() {
        let filters = filters();
        let id = Uuid::nil();
        let a = query_cache_key("heart attack risk", &filters, ResponseMode::Full, id);
        let b = query_cache_key("heart attack risk", &filters, ResponseMode::Fast, id);
        assert_ne!(a, b);
    }

    #[test]
    fn different_filters_changes_the_key() {
        let id = Uuid::nil();
        let a = query_cache_key("heart attack risk", &filters(), ResponseMode::Full, id);
        let mut other = filters();
        other.exclude_preprints = false;
        let b = query_cache_key("heart attack risk", &other, ResponseMode::Full, id);
        assert_ne!(a, b);
    }
}
