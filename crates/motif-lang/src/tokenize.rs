//! Identifier tokenisation over normalised text.

/// Split normalised text into comparable tokens: split on non-identifier
/// characters, drop tokens shorter than 2 characters, drop pure integers,
/// lowercase, preserve source order.
pub fn tokenize(normalized: &str) -> Vec<String> {
    normalized
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| t.chars().count() >= 2)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_lowercase)
        .collect()
}
