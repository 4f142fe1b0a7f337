//! Query normalization.

/// Collapse whitespace runs to a single space, trim, and lowercase.
///
/// Normalization is idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
