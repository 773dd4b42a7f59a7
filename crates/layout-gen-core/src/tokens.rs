//! Space-delimited string tokenization for commands and artifact rules.
//!
//! The split is deliberately naive: single ASCII spaces only, no quoting or
//! escaping, and consecutive spaces produce empty tokens. Verifiers consume
//! the resulting lists as-is, so changing the split changes what they check.

/// Split `s` on every ASCII space.
pub fn tokenize(s: &str) -> Vec<String> {
    s.split(' ').map(str::to_string).collect()
}

/// Tokenize each artifact rule independently.
pub fn tokenize_rules(rules: &[String]) -> Vec<Vec<String>> {
    rules.iter().map(|rule| tokenize(rule)).collect()
}
