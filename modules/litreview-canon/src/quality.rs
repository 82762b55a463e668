use litreview_common::types::{CanonicalPaper, Filters, QualityScoreBreakdown, StudyDesignHint};

const METHODS_TOKENS: &[&str] = &["method", "methods", "participants", "sample", "dataset", "randomized", "protocol"];

fn methods_transparency(abstract_text: &str) -> f64 {
    let lowered = abstract_text.to_lowercase();
    let present = METHODS_TOKENS.iter().filter(|t| lowered.contains(*t)).count();
    let token_score = present as f64 / METHODS_TOKENS.len() as f64 * 0.75;
    let has_digits = lowered.chars().collect::<Vec<_>>().windows(2).any(|w| w[0].is_ascii_digit() && w[1].is_ascii_digit());
    token_score + if has_digits { 0.25 } else { 0.0 }
}

fn citation_impact(citations: i64, age_years: f64) -> f64 {
    let rate = citations as f64 / (age_years.max(1.0) * 10.0);
    (rate.ln_1p() / 20f64.ln_1p()).clamp(0.0, 1.0)
}

fn recency_fit(age_years: f64, year: Option<i32>, filters: &Filters) -> f64 {
    let base = (-age_years / 8.0).exp();
    let in_timeframe = match (year, filters.from_year, filters.to_year) {
        (Some(y), Some(from), Some(to)) => y >= from && y <= to,
        (Some(y), Some(from), None) => y >= from,
        (Some(y), None, Some(to)) => y <= to,
        _ => false,
    };
    base + if in_timeframe { 0.15 } else { 0.0 }
}

fn design_strength(hint: StudyDesignHint, is_preprint: bool) -> f64 {
    if is_preprint {
        return 0.45;
    }
    hint.design_strength()
}

fn has_empirical_signal(text: &str) -> bool {
    const SIGNALS: &[&str] = &["trial", "cohort", "experiment", "randomized", "participants", "subjects"];
    let lowered = text.to_lowercase();
    SIGNALS.iter().any(|s| lowered.contains(s))
}

/// Score and hard-reject a canonical paper (§4.5.4). `current_year` is
/// passed in rather than read from the clock so scoring is deterministic
/// in tests.
pub fn score(paper: &CanonicalPaper, filters: &Filters, current_year: i32) -> QualityScoreBreakdown {
    let age_years = (current_year - paper.year.unwrap_or(current_year)).max(0) as f64;
    let abstract_text = paper.abstract_text.as_deref().unwrap_or("");

    let source_authority = paper.source_confidence.max(0.25);
    let study_design_strength = design_strength(paper.study_design_hint, paper.is_preprint);
    let methods = methods_transparency(abstract_text);
    let citations = citation_impact(paper.citation_count.unwrap_or(0), age_years);
    let recency = recency_fit(age_years, paper.year, filters);

    let q_total = 0.30 * source_authority + 0.25 * study_design_strength + 0.20 * methods + 0.15 * citations + 0.10 * recency;

    let mut reject_reason = None;
    if paper.is_retracted {
        reject_reason = Some("retracted".to_string());
    } else if filters.exclude_preprints && paper.is_preprint {
        reject_reason = Some("preprint_excluded".to_string());
    } else if let Some(year) = paper.year {
        let out_of_range = filters.from_year.is_some_and(|from| year < from) || filters.to_year.is_some_and(|to| year > to);
        if out_of_range {
            reject_reason = Some("year_out_of_filter".to_string());
        }
    }
    if reject_reason.is_none() && has_empirical_signal(abstract_text) && !paper.methods_present && methods < 0.35 {
        reject_reason = Some("methods_not_transparent".to_string());
    }
    if reject_reason.is_none() && q_total < 0.6 {
        reject_reason = Some("quality_below_threshold".to_string());
    }

    QualityScoreBreakdown {
        source_authority,
        study_design_strength,
        methods_transparency: methods,
        citation_impact: citations,
        recency_fit: recency,
        q_total,
        hard_rejected: reject_reason.is_some(),
        hard_reject_reason: reject_reason,
    }
}

/// Sort kept papers by q_total desc, then relevance_score, then citations.
pub fn sort_kept(papers: &mut [CanonicalPaper]) {
    papers.sort_by(|a, b| {
        let qa = a.quality.as_ref().map(|q| q.q_total).unwrap_or(0.0);
        let qb = b.quality.as_ref().map(|q| q.q_total).unwrap_or(0.0);
        qb.partial_cmp(&qa)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.relevance_score.partial_cmp(&a.relevance_score).unwrap_or(std::cmp::Ordering::Equal))
            .then(b.citation_count.unwrap_or(0).cmp(&a.citation_count.unwrap_or(0)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use litreview_common::types::ProvenanceEntry;

    fn paper() -> CanonicalPaper {
        CanonicalPaper {
            paper_id: "paper_x".into(),
            title: "A Randomized Trial of X on Y Outcomes".into(),
            year: Some(2022),
            abstract_text: Some(
                "We conducted a randomized protocol with 120 participants and sampled a dataset of methods."
                    .into(),
            ),
            authors: vec!["A. Researcher".into()],
            venue: None,
            doi: Some("10.1/xyz".into()),
            pubmed_id: None,
            openalex_id: None,
            arxiv_id: None,
            citation_count: Some(40),
            provenance: vec![ProvenanceEntry { source: litreview_common::types::Source::Pubmed, rank_signal: 1.0, metadata_confidence: 0.95 }],
            referenced_ids: vec![],
            is_preprint: false,
            is_retracted: false,
            methods_present: true,
            study_design_hint: litreview_common::types::StudyDesignHint::Rct,
            source_confidence: 0.95,
            relevance_score: 1.0,
            pdf_url: None,
            landing_page_url: None,
            quality: None,
        }
    }

    #[test]
    fn retracted_papers_are_hard_rejected() {
        let mut p = paper();
        p.is_retracted = true;
        let score = score(&p, &Filters::default(), 2024);
        assert!(score.hard_rejected);
        assert_eq!(score.hard_reject_reason.as_deref(), Some("retracted"));
    }

    #[test]
    fn strong_rct_with_methods_is_kept() {
        let p = paper();
        let score = score(&p, &Filters::default(), 2024);
        assert!(!score.hard_rejected, "{:?}", score);
        assert!(score.q_total >= 0.6);
    }

    #[test]
    fn sort_orders_by_q_total_descending() {
        let mut a = paper();
        a.paper_id = "a".into();
        a.quality = Some(score(&a, &Filters::default(), 2024));
        let mut b = paper();
        b.paper_id = "b".into();
        b.study_design_hint = litreview_common::types::StudyDesignHint::Unknown;
        b.source_confidence = 0.3;
        b.quality = Some(score(&b, &Filters::default(), 2024));

        let mut papers = vec![b.clone(), a.clone()];
        sort_kept(&mut papers);
        assert_eq!(papers[0].paper_id, "a");
    }
}
