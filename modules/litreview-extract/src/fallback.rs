use litreview_common::types::{CanonicalPaper, CompletenessTier, Outcome, PreprintStatus, StudyDesign, StudyResult};

/// When both completeness tiers end up empty but quality-kept papers
/// exist, synthesize up to 50 "fallback" partial studies straight from
/// canonical records, using the first abstract sentence as the key
/// result (§4.5.6). This keeps `COMPILE_REPORT` from emitting a report
/// with zero studies whenever extraction entirely failed to find
/// result-bearing sentences.
pub fn synthesize_fallback_studies(papers: &[CanonicalPaper]) -> Vec<StudyResult> {
    papers
        .iter()
        .take(50)
        .map(|paper| {
            let first_sentence = paper
                .abstract_text
                .as_deref()
                .and_then(|text| text.split(['.', '!', '?']).map(str::trim).find(|s| !s.is_empty()))
                .map(|s| s.to_string());

            StudyResult {
                study_id: paper.paper_id.clone(),
                title: paper.title.clone(),
                year: paper.year,
                design: StudyDesign::Unknown,
                preprint_status: if paper.is_preprint { PreprintStatus::Preprint } else { PreprintStatus::None },
                review_type: None,
                sample_size: None,
                population: None,
                abstract_excerpt: paper.abstract_text.clone(),
                outcomes: vec![Outcome {
                    outcome_measured: first_sentence.clone(),
                    intervention: None,
                    comparator: None,
                    effect_size: None,
                    p_value: None,
                    confidence_interval: None,
                    key_result: first_sentence,
                    citation_snippet: paper.abstract_text.clone(),
                    score: 0.1,
                }],
                doi: paper.doi.clone(),
                pubmed_id: paper.pubmed_id.clone(),
                openalex_id: paper.openalex_id.clone(),
                citation_count: paper.citation_count,
                pdf_url: paper.pdf_url.clone(),
                landing_page_url: paper.landing_page_url.clone(),
                used_pdf: false,
                fallback_reason: Some("synthesized_from_canonical_record".to_string()),
                llm_fallback_applied: false,
                completeness: CompletenessTier::Partial,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use litreview_common::types::{ProvenanceEntry, Source, StudyDesignHint};

    #[test]
    fn synthesizes_at_most_fifty_studies() {
        let papers: Vec<CanonicalPaper> = (0..75)
            .map(|i| CanonicalPaper {
                paper_id: format!("paper_{i}"),
                title: "t".into(),
                year: Some(2020),
                abstract_text: Some("Outcomes improved overall.".into()),
                authors: vec![],
                venue: None,
                doi: None,
                pubmed_id: None,
                openalex_id: None,
                arxiv_id: None,
                citation_count: None,
                provenance: vec![ProvenanceEntry { source: Source::Openalex, rank_signal: 1.0, metadata_confidence: 0.5 }],
                referenced_ids: vec![],
                is_preprint: false,
                is_retracted: false,
                methods_present: false,
                study_design_hint: StudyDesignHint::Unknown,
                source_confidence: 0.5,
                relevance_score: 0.1,
                pdf_url: None,
                landing_page_url: None,
                quality: None,
            })
            .collect();
        let studies = synthesize_fallback_studies(&papers);
        assert_eq!(studies.len(), 50);
        assert!(studies.iter().all(|s| s.completeness == CompletenessTier::Partial));
    }
}
