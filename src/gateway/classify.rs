use super::patterns::{catalog, PatternCategory};

/// True if any catalog rule matches anywhere in `text`. Stops at the first
/// hit; never computes replacement spans.
pub fn has_risk(text: &str) -> bool {
    catalog().iter().any(|rule| rule.regex.is_match(text))
}

/// Categories present in `text`, in catalog order. For audit logging: the
/// category names are safe to log, the matched text is not.
pub fn detect_categories(text: &str) -> Vec<PatternCategory> {
    catalog()
        .iter()
        .filter(|rule| rule.regex.is_match(text))
        .map(|rule| rule.category)
        .collect()
}
