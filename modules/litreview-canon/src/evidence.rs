use litreview_common::types::{
    Brief, CanonicalPaper, CitationAnchor, ClaimCluster, ClaimDisposition, ClaimSentence, EvidenceRow, Stance,
};

const EFFECT_VOCAB: &[&str] = &[
    "increased", "decreased", "improved", "reduced", "associated", "significant", "no effect", "no significant",
    "worsened", "higher", "lower",
];
const NEGATIVE_HINTS: &[&str] = &["no effect", "no significant", "decreased", "reduced", "worsened", "lower"];

const OUTCOME_JACCARD_THRESHOLD: f64 = 0.42;

fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?']).map(|s| s.trim()).filter(|s| !s.is_empty()).collect()
}

fn sentence_stance(sentence: &str) -> Option<Stance> {
    let lowered = sentence.to_lowercase();
    if !EFFECT_VOCAB.iter().any(|v| lowered.contains(v)) {
        return None;
    }
    if NEGATIVE_HINTS.iter().any(|v| lowered.contains(v)) {
        Some(Stance::Negative)
    } else {
        Some(Stance::Positive)
    }
}

fn outcome_token(sentence: &str) -> std::collections::HashSet<String> {
    sentence
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.len() > 3)
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| !w.is_empty())
        .collect()
}

fn jaccard(a: &std::collections::HashSet<String>, b: &std::collections::HashSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

struct MinedSentence {
    paper_id: String,
    text: String,
    stance: Stance,
    tokens: std::collections::HashSet<String>,
    char_start: usize,
}

fn mine_sentences(papers: &[CanonicalPaper]) -> Vec<MinedSentence> {
    let mut mined = Vec::new();
    for paper in papers {
        let Some(abstract_text) = &paper.abstract_text else { continue };
        let mut offset = 0usize;
        for sentence in split_sentences(abstract_text) {
            if let Some(stance) = sentence_stance(sentence) {
                mined.push(MinedSentence {
                    paper_id: paper.paper_id.clone(),
                    text: sentence.to_string(),
                    stance,
                    tokens: outcome_token(sentence),
                    char_start: offset,
                });
            }
            offset += sentence.len() + 1;
        }
    }
    mined
}

fn disposition(sentences: &[&MinedSentence]) -> ClaimDisposition {
    let has_positive = sentences.iter().any(|s| s.stance == Stance::Positive);
    let has_negative = sentences.iter().any(|s| s.stance == Stance::Negative);
    match (has_positive, has_negative) {
        (true, true) => ClaimDisposition::Conflicting,
        (true, false) => ClaimDisposition::ConsensusPositive,
        (false, true) => ClaimDisposition::ConsensusNegative,
        (false, false) => ClaimDisposition::Mixed,
    }
}

/// Mine abstract sentences for effect-vocabulary, cluster by outcome-token
/// Jaccard, and emit up to 3 claim clusters of 1-4 sentences each (§4.5.4).
pub fn build_brief(papers: &[CanonicalPaper]) -> Brief {
    let mined = mine_sentences(papers);
    let mut clusters: Vec<Vec<&MinedSentence>> = Vec::new();

    'outer: for sentence in &mined {
        for cluster in clusters.iter_mut() {
            let representative = &cluster[0];
            if jaccard(&sentence.tokens, &representative.tokens) >= OUTCOME_JACCARD_THRESHOLD {
                cluster.push(sentence);
                continue 'outer;
            }
        }
        clusters.push(vec![sentence]);
    }

    let claim_clusters = clusters
        .into_iter()
        .take(3)
        .map(|cluster| {
            let outcome_token = cluster[0].tokens.iter().next().cloned().unwrap_or_default();
            let disposition = disposition(&cluster);
            let sentences = cluster
                .into_iter()
                .take(4)
                .map(|s| ClaimSentence {
                    text: s.text.clone(),
                    stance: s.stance,
                    anchor: CitationAnchor::new(s.paper_id.clone(), "abstract", &s.text, s.char_start),
                })
                .collect();
            ClaimCluster { outcome_token, disposition, sentences }
        })
        .collect();

    Brief { clusters: claim_clusters }
}

/// Build the ranked evidence table (§4.5.4), capped at `max_rows`.
pub fn build_evidence_table(papers: &[CanonicalPaper], max_rows: u32) -> Vec<EvidenceRow> {
    papers
        .iter()
        .take(max_rows as usize)
        .map(|paper| {
            let stance = paper
                .abstract_text
                .as_deref()
                .map(|text| split_sentences(text).into_iter().find_map(sentence_stance).unwrap_or(Stance::Neutral))
                .unwrap_or(Stance::Neutral);
            EvidenceRow {
                paper_id: paper.paper_id.clone(),
                title: paper.title.clone(),
                year: paper.year,
                q_total: paper.quality.as_ref().map(|q| q.q_total).unwrap_or(0.0),
                relevance_score: paper.relevance_score,
                citation_count: paper.citation_count,
                outcome_measured: None,
                stance,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use litreview_common::types::{ProvenanceEntry, Source, StudyDesignHint};

    fn paper(id: &str, abstract_text: &str) -> CanonicalPaper {
        CanonicalPaper {
            paper_id: id.into(),
            title: "title".into(),
            year: Some(2021),
            abstract_text: Some(abstract_text.into()),
            authors: vec![],
            venue: None,
            doi: None,
            pubmed_id: None,
            openalex_id: None,
            arxiv_id: None,
            citation_count: Some(5),
            provenance: vec![ProvenanceEntry { source: Source::Openalex, rank_signal: 1.0, metadata_confidence: 0.9 }],
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
    fn brief_has_at_most_three_clusters_and_four_sentences_each() {
        let papers = vec![
            paper("p1", "Treatment significantly increased outcome scores. Treatment significantly increased outcome levels."),
            paper("p2", "Dosage was associated with decreased side effects."),
        ];
        let brief = build_brief(&papers);
        assert!(brief.clusters.len() <= 3);
        for cluster in &brief.clusters {
            assert!(cluster.sentences.len() <= 4);
            assert!(!cluster.sentences.is_empty());
        }
    }

    #[test]
    fn evidence_table_is_capped_at_max_rows() {
        let papers = vec![paper("p1", "x"), paper("p2", "y"), paper("p3", "z")];
        let rows = build_evidence_table(&papers, 2);
        assert_eq!(rows.len(), 2);
    }
}
