//! Deterministic, case-insensitive token-overlap scoring used when no
//! semantic backend is available to run a native similarity search (§4.3).

use std::collections::HashSet;

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Overlap coefficient between the query tokens and a candidate document's
/// tokens: `|intersection| / |query tokens|`. Ties break on insertion order,
/// which callers preserve by sorting candidates before scoring.
pub fn score(query: &str, candidate_text: &str) -> f64 {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return 0.0;
    }
    let candidate_tokens = tokenize(candidate_text);
    let overlap = query_tokens.intersection(&candidate_tokens).count();
    overlap as f64 / query_tokens.len() as f64
}

/// Ranks `candidates` (id, text) by lexical overlap with `query`, returning
/// the top `k` ids in descending score order.
pub fn top_k(query: &str, candidates: &[(String, String)], k: usize) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = candidates
        .iter()
        .map(|(id, text)| (score(query, text), id.as_str()))
        .filter(|(s, _)| *s > 0.0)
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(k).map(|(_, id)| id.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_more_overlapping_candidates_first() {
        let candidates = vec![
            ("a".to_string(), "ladder for blue u10".to_string()),
            ("b".to_string(), "fixture for white u10".to_string()),
        ];
        let ranked = top_k("ladder blue", &candidates, 2);
        assert_eq!(ranked[0], "a");
    }

    #[test]
    fn excludes_zero_overlap_candidates() {
        let candidates = vec![("a".to_string(), "completely unrelated text".to_string())];
        let ranked = top_k("ladder blue", &candidates, 5);
        assert!(ranked.is_empty());
    }
}
