use litreview_common::types::{CanonicalPaper, CompletenessTier, Outcome, PreprintStatus, StudyDesign, StudyResult};

use crate::patterns;

const DESIGN_KEYWORDS: &[(&[&str], StudyDesign)] = &[
    (&["meta-analysis", "meta analysis"], StudyDesign::MetaAnalysis),
    (&["systematic review"], StudyDesign::SystematicReview),
    (&["randomized controlled trial", "randomised controlled trial", "rct"], StudyDesign::Rct),
    (&["cohort study", "prospective cohort", "retrospective cohort"], StudyDesign::Cohort),
    (&["cross-sectional", "cross sectional"], StudyDesign::CrossSectional),
    (&["case-control", "case control"], StudyDesign::CaseControl),
    (&["case report"], StudyDesign::CaseReport),
    (&["review"], StudyDesign::Review),
];

fn classify_design(text: &str) -> StudyDesign {
    let lowered = text.to_lowercase();
    for (keywords, design) in DESIGN_KEYWORDS {
        if keywords.iter().any(|k| lowered.contains(k)) {
            return *design;
        }
    }
    StudyDesign::Unknown
}

fn extract_sample_size(text: &str) -> Option<i64> {
    let caps = patterns::sample_size().captures(text)?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();
    let value: i64 = raw.parse().ok()?;
    if (2..=10_000_000).contains(&value) {
        Some(value)
    } else {
        None
    }
}

fn extract_population(text: &str) -> Option<String> {
    for sentence in text.split(['.', '!', '?']) {
        let trimmed = sentence.trim();
        if patterns::population_sentence().is_match(trimmed) {
            return Some(trimmed.chars().take(220).collect());
        }
    }
    None
}

fn extract_groups(sentence: &str) -> (Option<String>, Option<String>) {
    if let Some(caps) = patterns::versus_groups().captures(sentence) {
        return (caps.get(1).map(|m| m.as_str().trim().to_string()), caps.get(2).map(|m| m.as_str().trim().to_string()));
    }
    if let Some(caps) = patterns::randomized_to().captures(sentence) {
        return (caps.get(1).map(|m| m.as_str().trim().to_string()), caps.get(2).map(|m| m.as_str().trim().to_string()));
    }
    (None, None)
}

fn extract_outcome(sentence: &str) -> Option<Outcome> {
    if !patterns::result_bearing().is_match(sentence) {
        return None;
    }

    let (intervention, comparator) = extract_groups(sentence);
    let effect_size = patterns::effect_size().captures(sentence).map(|c| format!("{}={}", &c[1], &c[2]));
    let p_value = patterns::p_value().find(sentence).map(|m| m.as_str().to_string());
    let confidence_interval = patterns::confidence_interval().find(sentence).map(|m| m.as_str().to_string());

    let mut present = 0u32;
    let total = 4u32;
    if intervention.is_some() {
        present += 1;
    }
    if effect_size.is_some() {
        present += 1;
    }
    if p_value.is_some() {
        present += 1;
    }
    if confidence_interval.is_some() {
        present += 1;
    }

    Some(Outcome {
        outcome_measured: Some(sentence.trim().chars().take(160).collect()),
        intervention,
        comparator,
        effect_size,
        p_value,
        confidence_interval,
        key_result: Some(sentence.trim().to_string()),
        citation_snippet: Some(sentence.trim().to_string()),
        score: present as f64 / total as f64,
    })
}

fn dedupe_outcomes(outcomes: Vec<Outcome>) -> Vec<Outcome> {
    let mut seen = std::collections::HashSet::new();
    outcomes
        .into_iter()
        .filter(|o| {
            let key = (o.outcome_measured.clone(), o.effect_size.clone(), o.p_value.clone(), o.citation_snippet.clone());
            seen.insert(key)
        })
        .collect()
}

/// Re-derive the completeness tier for a study. Called both after the
/// deterministic pass and after LLM augmentation merges in new fields,
/// since a merge can move a study from partial to strict_complete.
pub fn classify_completeness(study: &StudyResult) -> CompletenessTier {
    let has_abstract = study.abstract_excerpt.as_deref().map(|a| a.len() >= 50).unwrap_or(false);
    let has_strict_outcome = study
        .outcomes
        .iter()
        .any(|o| o.outcome_measured.is_some() && (o.effect_size.is_some() || o.p_value.is_some() || o.intervention.is_some() || o.comparator.is_some()));
    let has_partial_outcome = study.outcomes.iter().any(|o| o.outcome_measured.is_some() && o.citation_snippet.is_some());

    if study.design != StudyDesign::Unknown && has_abstract && has_strict_outcome {
        CompletenessTier::StrictComplete
    } else if study.design != StudyDesign::Unknown && study.year.is_some() && has_partial_outcome {
        CompletenessTier::Partial
    } else {
        CompletenessTier::Dropped
    }
}

/// Run the rule-based extractor against one canonical paper's title +
/// abstract (§4.5.5). Returns `None` inputs are handled by the caller
/// deciding whether to attempt a PDF-backed extraction instead.
pub fn extract_from_abstract(paper: &CanonicalPaper) -> StudyResult {
    let abstract_text = paper.abstract_text.clone().unwrap_or_default();
    let design = classify_design(&format!("{} {}", paper.title, abstract_text));
    let sample_size = extract_sample_size(&abstract_text);
    let population = extract_population(&abstract_text);

    let outcomes = dedupe_outcomes(
        abstract_text
            .split(['.', '!', '?'])
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    extract_outcome(trimmed)
                }
            })
            .collect(),
    );

    let mut study = StudyResult {
        study_id: paper.paper_id.clone(),
        title: paper.title.clone(),
        year: paper.year,
        design,
        preprint_status: if paper.is_preprint { PreprintStatus::Preprint } else { PreprintStatus::None },
        review_type: None,
        sample_size,
        population,
        abstract_excerpt: if abstract_text.is_empty() { None } else { Some(abstract_text.clone()) },
        outcomes,
        doi: paper.doi.clone(),
        pubmed_id: paper.pubmed_id.clone(),
        openalex_id: paper.openalex_id.clone(),
        citation_count: paper.citation_count,
        pdf_url: paper.pdf_url.clone(),
        landing_page_url: paper.landing_page_url.clone(),
        used_pdf: false,
        fallback_reason: None,
        llm_fallback_applied: false,
        completeness: CompletenessTier::Dropped,
    };
    study.completeness = classify_completeness(&study);
    study
}

#[cfg(test)]
mod tests {
    use super::*;
    use litreview_common::types::{ProvenanceEntry, Source, StudyDesignHint};

    fn paper(abstract_text: &str) -> CanonicalPaper {
        CanonicalPaper {
            paper_id: "paper_x".into(),
            title: "A Randomized Controlled Trial of X".into(),
            year: Some(2021),
            abstract_text: Some(abstract_text.into()),
            authors: vec![],
            venue: None,
            doi: Some("10.1/xyz".into()),
            pubmed_id: None,
            openalex_id: None,
            arxiv_id: None,
            citation_count: Some(10),
            provenance: vec![ProvenanceEntry { source: Source::Pubmed, rank_signal: 1.0, metadata_confidence: 0.9 }],
            referenced_ids: vec![],
            is_preprint: false,
            is_retracted: false,
            methods_present: true,
            study_design_hint: StudyDesignHint::Rct,
            source_confidence: 0.9,
            relevance_score: 1.0,
            pdf_url: None,
            landing_page_url: None,
            quality: None,
        }
    }

    #[test]
    fn strict_complete_study_has_design_and_effect_size() {
        let p = paper(
            "We enrolled n=120 adults with hypertension. Patients were randomized to drug X or placebo. \
             Drug X significantly reduced blood pressure versus placebo, OR: 1.8, p<0.05.",
        );
        let study = extract_from_abstract(&p);
        assert_eq!(study.design, StudyDesign::Rct);
        assert_eq!(study.sample_size, Some(120));
        assert_eq!(study.completeness, CompletenessTier::StrictComplete);
    }

    #[test]
    fn empty_abstract_is_dropped() {
        let p = paper("");
        let study = extract_from_abstract(&p);
        assert_eq!(study.completeness, CompletenessTier::Dropped);
    }

    #[test]
    fn sample_size_out_of_bounds_is_rejected() {
        assert_eq!(extract_sample_size("n=1 participant"), None);
        assert_eq!(extract_sample_size("n=50000000 participants"), None);
    }
}
