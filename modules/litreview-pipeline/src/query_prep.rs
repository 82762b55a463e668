//! Query preparation for INGEST_PROVIDER (§4.5.1 step 2): a deterministic
//! comparative-phrasing normalizer plus a small biomedical synonym table,
//! with v1/v2/shadow mode switches from `QUERY_PIPELINE_MODE`.

use litreview_common::config::QueryPipelineMode;
use litreview_providers::PreparedQuery;

const COMPARATIVE_REPLACEMENTS: &[(&str, &str)] = &[
    ("better than", "compared to"),
    ("worse than", "compared to"),
    ("superior to", "compared to"),
    ("effects of", "associated with"),
    ("better", "associated"),
    ("worse", "associated"),
    ("superior", "associated"),
];

/// Biomedical concept table: a handful of seed terms mapped to close
/// synonyms, expanded up to `max_synonyms` per matched concept.
const CONCEPT_TABLE: &[(&str, &[&str])] = &[
    ("heart attack", &["myocardial infarction", "mi", "cardiac event"]),
    ("blood pressure", &["hypertension", "bp"]),
    ("diabetes", &["type 2 diabetes", "t2dm", "hyperglycemia"]),
    ("depression", &["major depressive disorder", "mdd"]),
    ("weight loss", &["bariatric", "obesity management"]),
    ("stroke", &["cerebrovascular accident", "cva"]),
];

fn normalize_comparative(query: &str) -> String {
    let mut normalized = query.to_lowercase();
    for (from, to) in COMPARATIVE_REPLACEMENTS {
        normalized = normalized.replace(from, to);
    }
    normalized
}

fn expand_keywords(normalized: &str, max_synonyms: usize) -> String {
    let mut expanded = normalized.to_string();
    for (concept, synonyms) in CONCEPT_TABLE {
        if normalized.contains(concept) {
            for syn in synonyms.iter().take(max_synonyms) {
                expanded.push(' ');
                expanded.push_str(syn);
            }
        }
    }
    expanded
}

/// Prepare a query for the fan-out to providers. In `shadow` mode a second
/// normalized form is computed for observability only (`shadow_query`),
/// never substituted for the served query. `v2`'s model-aided path isn't
/// wired to a live model endpoint here, so it falls back to the
/// deterministic normalizer immediately rather than waiting out its
/// timeout budget.
pub struct PreparedQueryResult {
    pub prepared: PreparedQuery,
    pub shadow_query: Option<String>,
}

pub fn prepare_query(raw_query: &str, mode: QueryPipelineMode) -> PreparedQueryResult {
    let normalized = normalize_comparative(raw_query);
    let max_synonyms = match mode {
        QueryPipelineMode::V1 => 3,
        QueryPipelineMode::V2 | QueryPipelineMode::Shadow => 6,
    };
    let expanded = expand_keywords(&normalized, max_synonyms);

    let shadow_query = match mode {
        QueryPipelineMode::Shadow => Some(expand_keywords(&normalized, 6)),
        _ => None,
    };

    PreparedQueryResult {
        prepared: PreparedQuery {
            original_keyword_query: raw_query.to_string(),
            expanded_keyword_query: expanded.clone(),
            api_query: expanded,
        },
        shadow_query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_comparative_phrasing() {
        let normalized = normalize_comparative("effects of statins on heart attack risk");
        assert!(normalized.contains("associated with"));
    }

    #[test]
    fn expands_known_concept() {
        let expanded = expand_keywords("risk of heart attack", 3);
        assert!(expanded.contains("myocardial infarction"));
    }

    #[test]
    fn v1_caps_synonyms_lower_than_v2() {
        let v1 = prepare_query("heart attack", QueryPipelineMode::V1);
        let v2 = prepare_query("heart attack", QueryPipelineMode::V2);
        assert!(v2.prepared.expanded_keyword_query.len() >= v1.prepared.expanded_keyword_query.len());
    }

    #[test]
    fn shadow_mode_does_not_change_served_query() {
        let result = prepare_query("effects of drug", QueryPipelineMode::Shadow);
        assert!(result.shadow_query.is_some());
        assert!(result.prepared.api_query.contains("associated with"));
    }
}
