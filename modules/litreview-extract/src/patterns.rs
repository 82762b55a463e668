use std::sync::OnceLock;

use regex::Regex;

macro_rules! lazy_regex {
    ($name:ident, $pattern:expr) => {
        pub fn $name() -> &'static Regex {
            static CELL: OnceLock<Regex> = OnceLock::new();
            CELL.get_or_init(|| Regex::new($pattern).expect("static regex is valid"))
        }
    };
}

lazy_regex!(sample_size, r"(?i)\bn\s*=\s*(\d{1,9})\b|\b(\d{1,9})\s+(?:participants|patients|subjects|adults|children)\b");
lazy_regex!(
    population_sentence,
    r"(?i)\b(patients|participants|subjects|adults|children|women|men|individuals)\s+(with|aged|who|diagnosed)\b"
);
lazy_regex!(
    result_bearing,
    r"(?i)\b(significant|associated|\bOR\b|\bRR\b|\bHR\b|\bCI\b|\bp\b|\bvs\b|versus)\b"
);
lazy_regex!(versus_groups, r"(?i)\b([A-Za-z][A-Za-z0-9 \-]{1,40}?)\s+(?:vs\.?|versus)\s+([A-Za-z][A-Za-z0-9 \-]{1,40}?)\b");
lazy_regex!(
    randomized_to,
    r"(?i)randomi[sz]ed\s+to\s+([A-Za-z][A-Za-z0-9 \-]{1,40}?)\s+or\s+([A-Za-z][A-Za-z0-9 \-]{1,40}?)\b"
);
lazy_regex!(
    effect_size,
    r"(?i)\b(OR|RR|HR|SMD|MD|IRR|β|Cohen's d)\s*[:=]?\s*(-?\d+(?:\.\d+)?)"
);
lazy_regex!(p_value, r"(?i)\bp\s*[<>=]\s*\.?\d+(?:\.\d+)?");
lazy_regex!(confidence_interval, r"(?i)95%\s*CI[:\s]*[\[(]?-?\d+(?:\.\d+)?\s*[,\-–to]+\s*-?\d+(?:\.\d+)?[\])]?");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_size_matches_n_equals_form() {
        let caps = sample_size().captures("The trial enrolled n=120 adults.").unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "120");
    }

    #[test]
    fn sample_size_matches_count_noun_form() {
        let caps = sample_size().captures("A total of 84 participants were enrolled.").unwrap();
        assert_eq!(caps.get(2).unwrap().as_str(), "84");
    }

    #[test]
    fn effect_size_matches_or_with_colon() {
        let caps = effect_size().captures("the odds ratio OR: 1.8 was significant").unwrap();
        assert_eq!(caps.get(2).unwrap().as_str(), "1.8");
    }

    #[test]
    fn p_value_matches_strict_inequality() {
        assert!(p_value().is_match("the effect was significant (p<0.05)"));
    }
}
