/// Normalize a DOI to its bare `10.xxxx/yyyy` form: strip any URL prefix,
/// lowercase, trim whitespace. Idempotent — normalizing twice yields the
/// same string as normalizing once.
pub fn normalize_doi(doi: &str) -> String {
    let trimmed = doi.trim();
    let stripped = trimmed
        .trim_start_matches("https://doi.org/")
        .trim_start_matches("http://doi.org/")
        .trim_start_matches("doi:")
        .trim_start_matches("DOI:");
    stripped.to_lowercase()
}

pub fn normalize_pmid(pmid: &str) -> String {
    pmid.trim().trim_start_matches("PMID:").trim_start_matches("pmid:").trim().to_string()
}

/// Normalize an arXiv id, stripping a version suffix (`v2`) and any URL
/// prefix — two different versions of the same preprint merge as one.
pub fn normalize_arxiv_id(id: &str) -> String {
    let trimmed = id
        .trim()
        .trim_start_matches("https://arxiv.org/abs/")
        .trim_start_matches("http://arxiv.org/abs/")
        .trim_start_matches("arXiv:")
        .trim_start_matches("arxiv:");
    match trimmed.rfind('v') {
        Some(idx) if trimmed[idx + 1..].chars().all(|c| c.is_ascii_digit()) && idx + 1 < trimmed.len() => {
            trimmed[..idx].to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// Lowercase, strip punctuation, collapse whitespace — used as the basis
/// for title Jaccard similarity and for the `paper_id` fingerprint.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn title_tokens(title: &str) -> std::collections::HashSet<String> {
    normalize_title(title).split(' ').filter(|s| !s.is_empty()).map(|s| s.to_string()).collect()
}

/// First-and-last-name-insensitive author token: last name, lowercased.
pub fn author_tokens(authors: &[String]) -> std::collections::HashSet<String> {
    authors
        .iter()
        .filter_map(|a| a.split_whitespace().last())
        .map(|s| s.to_lowercase())
        .collect()
}

pub fn jaccard(a: &std::collections::HashSet<String>, b: &std::collections::HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doi_normalization_is_idempotent() {
        let raw = "https://doi.org/10.1234/ABCD";
        let once = normalize_doi(raw);
        let twice = normalize_doi(&once);
        assert_eq!(once, twice);
        assert_eq!(once, "10.1234/abcd");
    }

    #[test]
    fn arxiv_id_strips_version_suffix() {
        assert_eq!(normalize_arxiv_id("1234.5678v3"), "1234.5678");
        assert_eq!(normalize_arxiv_id("https://arxiv.org/abs/1234.5678v2"), "1234.5678");
    }

    #[test]
    fn jaccard_of_identical_sets_is_one() {
        let a = title_tokens("Effects of X on Y");
        let b = title_tokens("effects of x on y!!");
        assert_eq!(jaccard(&a, &b), 1.0);
    }
}
