//! # Similarity Matcher
//!
//! Jaccard overlap between two keyword lists after normalization.
//! Two empty lists score 0: titles without keywords never match.

use std::collections::HashSet;

use crate::keywords::is_keyword_char;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;

/// Lowercase, then drop everything outside the CJK/alphanumeric set.
pub fn normalize_keyword(keyword: &str) -> String {
    keyword
        .to_lowercase()
        .chars()
        .filter(|c| is_keyword_char(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

fn normalized_set(keywords: &[String]) -> HashSet<String> {
    keywords.iter().map(|k| normalize_keyword(k)).collect()
}

/// `|A ∩ B| / |A ∪ B|` over normalized sets, in `[0, 1]`.
pub fn similarity(a: &[String], b: &[String]) -> f64 {
    let sa = normalized_set(a);
    let sb = normalized_set(b);
    if sa.is_empty() && sb.is_empty() {
        return 0.0;
    }
    let inter = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

pub fn should_group(a: &[String], b: &[String], threshold: f64) -> bool {
    similarity(a, b) >= threshold
}
