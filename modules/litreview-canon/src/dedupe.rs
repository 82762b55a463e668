use litreview_common::hashing::content_hash_str;
use litreview_common::types::{CanonicalPaper, ProvenanceEntry, Source, StudyDesignHint, UnifiedPaper};

use crate::normalize::{author_tokens, jaccard, normalize_arxiv_id, normalize_doi, normalize_pmid, normalize_title, title_tokens};

const TITLE_JACCARD_THRESHOLD: f64 = 0.78;
const AUTHOR_JACCARD_THRESHOLD: f64 = 0.2;
const MAX_YEAR_DELTA: i32 = 1;

/// Stable `paper_id`, grounded on whichever identifier is strongest:
/// DOI, then PMID, then arXiv id, then a title/year/author fingerprint.
pub fn paper_id(paper: &UnifiedPaper) -> String {
    let fingerprint = paper
        .doi
        .as_deref()
        .map(normalize_doi)
        .or_else(|| paper.pubmed_id.as_deref().map(normalize_pmid))
        .or_else(|| paper.arxiv_id.as_deref().map(normalize_arxiv_id))
        .unwrap_or_else(|| {
            let title = normalize_title(&paper.title);
            let authors: Vec<&str> = paper.authors.iter().take(2).map(|s| s.as_str()).collect();
            format!("{title}|{}|{}", paper.year.unwrap_or(0), authors.join(","))
        });
    format!("paper_{}", content_hash_str(&fingerprint))
}

fn matches_identifier(a: &UnifiedPaper, b: &CanonicalPaper) -> bool {
    if let (Some(x), Some(y)) = (&a.doi, &b.doi) {
        if normalize_doi(x) == normalize_doi(y) {
            return true;
        }
    }
    if let (Some(x), Some(y)) = (&a.pubmed_id, &b.pubmed_id) {
        if normalize_pmid(x) == normalize_pmid(y) {
            return true;
        }
    }
    if let (Some(x), Some(y)) = (&a.arxiv_id, &b.arxiv_id) {
        if normalize_arxiv_id(x) == normalize_arxiv_id(y) {
            return true;
        }
    }
    false
}

fn matches_fallback(a: &UnifiedPaper, b: &CanonicalPaper) -> bool {
    let title_sim = jaccard(&title_tokens(&a.title), &title_tokens(&b.title));
    if title_sim < TITLE_JACCARD_THRESHOLD {
        return false;
    }
    let author_sim = jaccard(&author_tokens(&a.authors), &author_tokens(&b.authors));
    if author_sim < AUTHOR_JACCARD_THRESHOLD {
        return false;
    }
    match (a.year, b.year) {
        (Some(x), Some(y)) => (x - y).abs() <= MAX_YEAR_DELTA,
        _ => true,
    }
}

fn merge_into(canonical: &mut CanonicalPaper, incoming: &UnifiedPaper) {
    let trust = incoming.source.base_trust();

    canonical.source_confidence = canonical.source_confidence.max(trust);
    canonical.relevance_score += incoming.rank_signal * trust;
    canonical.citation_count = match (canonical.citation_count, incoming.citation_count) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    for reference in &incoming.references {
        if !canonical.referenced_ids.contains(reference) {
            canonical.referenced_ids.push(reference.clone());
        }
    }
    canonical.is_retracted |= incoming.is_retracted;
    canonical.is_preprint |= !matches!(incoming.preprint_status, litreview_common::types::PreprintStatus::None);

    if canonical.abstract_text.is_none() {
        canonical.abstract_text = incoming.abstract_text.clone();
    }
    if canonical.doi.is_none() {
        canonical.doi = incoming.doi.clone();
    }
    if canonical.pubmed_id.is_none() {
        canonical.pubmed_id = incoming.pubmed_id.clone();
    }
    if canonical.openalex_id.is_none() {
        canonical.openalex_id = incoming.openalex_id.clone();
    }
    if canonical.arxiv_id.is_none() {
        canonical.arxiv_id = incoming.arxiv_id.clone();
    }
    if canonical.venue.is_none() {
        canonical.venue = incoming.venue.clone();
    }
    if canonical.pdf_url.is_none() {
        canonical.pdf_url = incoming.pdf_url.clone();
    }
    if canonical.landing_page_url.is_none() {
        canonical.landing_page_url = incoming.landing_page_url.clone();
    }
    if canonical.year.is_none() {
        canonical.year = incoming.year;
    }

    canonical.provenance.push(ProvenanceEntry {
        source: incoming.source,
        rank_signal: incoming.rank_signal,
        metadata_confidence: trust,
    });
}

fn new_canonical(first: &UnifiedPaper) -> CanonicalPaper {
    let trust = first.source.base_trust();
    CanonicalPaper {
        paper_id: paper_id(first),
        title: first.title.clone(),
        year: first.year,
        abstract_text: first.abstract_text.clone(),
        authors: first.authors.clone(),
        venue: first.venue.clone(),
        doi: first.doi.clone(),
        pubmed_id: first.pubmed_id.clone(),
        openalex_id: first.openalex_id.clone(),
        arxiv_id: first.arxiv_id.clone(),
        citation_count: first.citation_count,
        provenance: vec![ProvenanceEntry { source: first.source, rank_signal: first.rank_signal, metadata_confidence: trust }],
        referenced_ids: first.references.clone(),
        is_preprint: !matches!(first.preprint_status, litreview_common::types::PreprintStatus::None),
        is_retracted: first.is_retracted,
        methods_present: false,
        study_design_hint: StudyDesignHint::Unknown,
        source_confidence: trust,
        relevance_score: first.rank_signal * trust,
        pdf_url: first.pdf_url.clone(),
        landing_page_url: first.landing_page_url.clone(),
        quality: None,
    }
}

/// Merge provider candidates into canonical papers (§4.5.3). Candidates
/// are processed in order; each either joins an existing canonical paper
/// (by identifier match, then title/author/year fallback) or starts a
/// new one.
pub fn canonicalize(candidates: Vec<UnifiedPaper>) -> Vec<CanonicalPaper> {
    let mut canonical: Vec<CanonicalPaper> = Vec::new();

    for candidate in candidates {
        let existing = canonical
            .iter()
            .position(|c| matches_identifier(&candidate, c) || matches_fallback(&candidate, c));

        match existing {
            Some(idx) => merge_into(&mut canonical[idx], &candidate),
            None => canonical.push(new_canonical(&candidate)),
        }
    }

    canonical
}

#[cfg(test)]
mod tests {
    use super::*;
    use litreview_common::types::PreprintStatus;

    fn paper(id: &str, title: &str, doi: Option<&str>, source: Source) -> UnifiedPaper {
        UnifiedPaper {
            id: id.to_string(),
            title: title.to_string(),
            year: Some(2020),
            abstract_text: None,
            authors: vec!["Jane Smith".to_string()],
            venue: None,
            source,
            doi: doi.map(|s| s.to_string()),
            pubmed_id: None,
            openalex_id: None,
            arxiv_id: None,
            citation_count: Some(10),
            publication_types: vec![],
            references: vec![],
            is_retracted: false,
            preprint_status: PreprintStatus::None,
            rank_signal: 1.0,
            pdf_url: None,
            landing_page_url: None,
        }
    }

    #[test]
    fn merges_same_doi_across_sources() {
        let candidates = vec![
            paper("a", "Effects of X on Y in Adults", Some("10.1/xyz"), Source::Openalex),
            paper("b", "Effects of X on Y in Adults", Some("10.1/XYZ"), Source::SemanticScholar),
        ];
        let canonical = canonicalize(candidates);
        assert_eq!(canonical.len(), 1);
        assert_eq!(canonical[0].provenance.len(), 2);
    }

    #[test]
    fn distinct_papers_stay_separate() {
        let candidates = vec![
            paper("a", "Effects of X on Y", Some("10.1/aaa"), Source::Openalex),
            paper("b", "A Completely Unrelated Study of Z", Some("10.1/bbb"), Source::Openalex),
        ];
        let canonical = canonicalize(candidates);
        assert_eq!(canonical.len(), 2);
    }

    #[test]
    fn paper_id_is_stable_for_same_doi() {
        let p1 = paper("a", "Title A", Some("10.1/xyz"), Source::Openalex);
        let p2 = paper("b", "Title B", Some("10.1/XYZ"), Source::Openalex);
        assert_eq!(paper_id(&p1), paper_id(&p2));
    }
}
