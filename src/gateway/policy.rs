use serde_json::{Map, Value};

use super::classify::detect_categories;
use super::patterns::{redact, PatternCategory};
use super::GatewayError;
use crate::config::GatewayConfig;

/// Text that has passed the policy gate. Only `apply_policy` constructs one,
/// so every prompt builder input is known to have been screened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionOutcome {
    text: String,
    was_redacted: bool,
}

impl RedactionOutcome {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the redactor changed the text.
    pub fn was_redacted(&self) -> bool {
        self.was_redacted
    }
}

/// What the gate decided for one piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    PassThrough,
    Redact,
    Reject,
}

/// The decision table. Risk only matters outside HIPAA mode, where it
/// always rejects; inside HIPAA mode the redaction flag alone decides.
pub fn decide(config: &GatewayConfig, risky: bool) -> PolicyDecision {
    match (config.hipaa_mode, config.deidentify_before_call, risky) {
        (false, _, true) => PolicyDecision::Reject,
        (false, _, false) => PolicyDecision::PassThrough,
        (true, true, _) => PolicyDecision::Redact,
        (true, false, _) => PolicyDecision::PassThrough,
    }
}

/// Screen raw caller text before it can reach a prompt. Fails closed.
pub fn apply_policy(config: &GatewayConfig, raw: &str) -> Result<RedactionOutcome, GatewayError> {
    let categories = detect_categories(raw);
    gate(config, &categories, raw, || redact(raw))
}

/// Screen a structured payload. Classification runs on each string, key and
/// number as the provider will read it, not on the escaped JSON text, so
/// `"Jane\nDoe"` is a name. Redaction rewrites those leaves before the tree
/// is serialized.
pub fn apply_policy_json(
    config: &GatewayConfig,
    raw: &Value,
) -> Result<RedactionOutcome, GatewayError> {
    let serialized = raw.to_string();
    let mut categories = detect_categories(&serialized);
    collect_categories(raw, &mut categories);
    categories.sort();
    categories.dedup();

    gate(config, &categories, &serialized, || {
        redact(&redact_value(raw).to_string())
    })
}

fn gate(
    config: &GatewayConfig,
    categories: &[PatternCategory],
    raw: &str,
    redact_all: impl FnOnce() -> String,
) -> Result<RedactionOutcome, GatewayError> {
    match decide(config, !categories.is_empty()) {
        PolicyDecision::Reject => {
            let labels: Vec<&'static str> = categories.iter().map(|c| c.as_str()).collect();
            tracing::warn!(
                categories = ?labels,
                "PHI policy violation: identifiable content outside HIPAA mode"
            );
            Err(GatewayError::PolicyViolation { categories: labels })
        }
        PolicyDecision::PassThrough => Ok(RedactionOutcome {
            text: raw.to_string(),
            was_redacted: false,
        }),
        PolicyDecision::Redact => {
            let text = redact_all();
            let was_redacted = text != raw;
            if was_redacted {
                tracing::debug!(
                    categories = ?categories.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
                    "De-identified input before provider call"
                );
            }
            Ok(RedactionOutcome { text, was_redacted })
        }
    }
}

fn collect_categories(value: &Value, found: &mut Vec<PatternCategory>) {
    match value {
        Value::String(s) => found.extend(detect_categories(s)),
        Value::Number(n) => found.extend(detect_categories(&n.to_string())),
        Value::Array(items) => {
            for item in items {
                collect_categories(item, found);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                found.extend(detect_categories(key));
                collect_categories(item, found);
            }
        }
        Value::Null | Value::Bool(_) => {}
    }
}

/// Redact every leaf and key. A number that redacts becomes its placeholder
/// string; keys that collapse onto the same placeholder get a ` (n)` suffix
/// so no entry is lost.
fn redact_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(redact(s)),
        Value::Number(n) => {
            let text = n.to_string();
            let redacted = redact(&text);
            if redacted == text {
                value.clone()
            } else {
                Value::String(redacted)
            }
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, item) in map {
                let base = redact(key);
                let mut key = base.clone();
                let mut n = 2;
                while out.contains_key(&key) {
                    key = format!("{base} ({n})");
                    n += 1;
                }
                out.insert(key, redact_value(item));
            }
            Value::Object(out)
        }
        Value::Null | Value::Bool(_) => value.clone(),
    }
}
