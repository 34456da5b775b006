use std::collections::BTreeSet;

/// Tokens dropped before scoring. Deliberately small and ad hoc; only the
/// resulting overlap score is load-bearing, not the exact token sets.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "to", "of", "in", "on", "for",
    "with", "at", "by", "from", "is", "are", "was", "were", "be", "been",
    "this", "that", "it", "its", "as", "into", "so", "then", "when", "up",
    "out", "all", "some", "also", "we", "i", "you",
];

/// Crude suffix-stripping stemmer. Intentionally not a real stemmer:
/// strips one of "ing", "ed", "es", "ly", or a trailing "s" (not "ss")
/// when the remaining stem is longer than 2 characters.
pub fn stem(token: &str) -> String {
    if let Some(s) = token.strip_suffix("ing") {
        if s.len() > 2 {
            return s.to_string();
        }
    }
    if let Some(s) = token.strip_suffix("ed") {
        if s.len() > 2 {
            return s.to_string();
        }
    }
    if let Some(s) = token.strip_suffix("es") {
        if s.len() > 2 {
            return s.to_string();
        }
    }
    if let Some(s) = token.strip_suffix("ly") {
        if s.len() > 2 {
            return s.to_string();
        }
    }
    if let Some(s) = token.strip_suffix("s") {
        if !token.ends_with("ss") && s.len() > 2 {
            return s.to_string();
        }
    }
    token.to_string()
}

/// Lowercase, strip non-alphanumerics, split on whitespace, drop stop
/// words and single-character tokens, stem the rest.
pub fn token_set(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|t| t.len() > 1 && !STOP_WORDS.contains(t))
        .map(stem)
        .collect()
}

/// Jaccard similarity of the stemmed token sets of two texts.
pub fn similarity(a: &str, b: &str) -> f64 {
    let sa = token_set(a);
    let sb = token_set(b);
    jaccard(&sa, &sb)
}

pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}
