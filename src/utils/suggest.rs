//! "Did you mean" suggestions for names that failed to resolve.

use strsim::levenshtein;

use crate::constants::MAX_SUGGESTIONS;

/// Maximum allowed Levenshtein distance as a percentage of target length for suggestions.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Find names similar to `target`, closest first.
///
/// At most [`MAX_SUGGESTIONS`] names within half the target's length in edit
/// distance are returned. Exact matches are skipped.
pub fn similar_names<'a, I>(target: &str, available: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let threshold = (target.len() * SIMILARITY_THRESHOLD_PERCENT / 100).max(1);
    let mut scored: Vec<(&str, usize)> = available
        .into_iter()
        .filter(|name| *name != target)
        .map(|name| (name, levenshtein(target, name)))
        .filter(|(_, dist)| *dist <= threshold)
        .collect();

    scored.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    scored.dedup_by(|a, b| a.0 == b.0);

    scored.into_iter().take(MAX_SUGGESTIONS).map(|(name, _)| name.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similar_names_orders_by_distance() {
        let found = similar_names("data", ["date", "getData", "dta", "unrelated"]);
        assert_eq!(found, vec!["date".to_string(), "dta".to_string()]);
    }

    #[test]
    fn test_similar_names_empty_when_nothing_close() {
        assert!(similar_names("render", ["x", "completely_different"]).is_empty());
    }
}
