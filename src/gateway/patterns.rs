use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Kind of identifiable content a rule detects.
/// Declaration order is catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    Name,
    Phone,
    Ssn,
    Email,
    Date,
    Address,
}

impl PatternCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Ssn => "ssn",
            Self::Email => "email",
            Self::Date => "date",
            Self::Address => "address",
        }
    }
}

/// One identifiable-content rule: matcher plus the tag that replaces a match.
pub struct PatternRule {
    pub category: PatternCategory,
    pub regex: Regex,
    pub placeholder: &'static str,
}

/// Tag for any detected person name. Distinct from the follow-up recipient
/// placeholder so detected third-party names are never re-identified.
pub const NAME_PLACEHOLDER: &str = "[PERSON_NAME]";
pub const PHONE_PLACEHOLDER: &str = "[PHONE]";
pub const SSN_PLACEHOLDER: &str = "[SSN]";
pub const EMAIL_PLACEHOLDER: &str = "[EMAIL]";
pub const DATE_PLACEHOLDER: &str = "[DATE]";
pub const ADDRESS_PLACEHOLDER: &str = "[ADDRESS]";

/// The catalog, in application order. Names run before dates and dates
/// before addresses, so "123 Main Street" resolves to a single name tag
/// instead of a half-replaced address. Placeholders are all-caps inside
/// brackets and match no rule. Name letters are Unicode classes, matching
/// the Unicode-aware `\b`, so accented names are caught.
static CATALOG: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    vec![
        rule(
            PatternCategory::Name,
            r"\b\p{Lu}\p{Ll}+\s+\p{Lu}\p{Ll}+\b",
            NAME_PLACEHOLDER,
        ),
        rule(
            PatternCategory::Phone,
            r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b",
            PHONE_PLACEHOLDER,
        ),
        rule(PatternCategory::Ssn, r"\b\d{3}-\d{2}-\d{4}\b", SSN_PLACEHOLDER),
        rule(
            PatternCategory::Email,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            EMAIL_PLACEHOLDER,
        ),
        rule(
            PatternCategory::Date,
            r"\b\d{1,2}/\d{1,2}/\d{2,4}\b",
            DATE_PLACEHOLDER,
        ),
        rule(
            PatternCategory::Address,
            r"(?i)\b\d+\s+[a-z\s]+(?:street|st|avenue|ave|road|rd|drive|dr|lane|ln|boulevard|blvd)\b",
            ADDRESS_PLACEHOLDER,
        ),
    ]
});

fn rule(category: PatternCategory, pattern: &str, placeholder: &'static str) -> PatternRule {
    PatternRule {
        category,
        regex: Regex::new(pattern).expect("valid regex"),
        placeholder,
    }
}

/// All rules in the order `redact` applies them.
pub fn catalog() -> &'static [PatternRule] {
    &CATALOG
}

/// Replace every catalog match with its placeholder. Pure, infallible, and
/// idempotent: the output contains no substring any rule matches.
pub fn redact(text: &str) -> String {
    let mut current = text.to_string();
    for rule in catalog() {
        current = rule.regex.replace_all(&current, rule.placeholder).into_owned();
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_rule_matches(text: &str) -> bool {
        catalog().iter().all(|r| !r.regex.is_match(text))
    }

    #[test]
    fn catalog_order_is_fixed() {
        let order: Vec<PatternCategory> = catalog().iter().map(|r| r.category).collect();
        assert_eq!(
            order,
            vec![
                PatternCategory::Name,
                PatternCategory::Phone,
                PatternCategory::Ssn,
                PatternCategory::Email,
                PatternCategory::Date,
                PatternCategory::Address,
            ]
        );
    }

    #[test]
    fn placeholders_match_no_rule() {
        for rule in catalog() {
            assert!(no_rule_matches(rule.placeholder), "{} matches a rule", rule.placeholder);
        }
    }

    #[test]
    fn redacts_each_category() {
        assert_eq!(redact("patient Jane Doe arrived"), "patient [PERSON_NAME] arrived");
        assert_eq!(redact("patient Jane\nDoe arrived"), "patient [PERSON_NAME] arrived");
        assert_eq!(redact("José Martínez called"), "[PERSON_NAME] called");
        assert_eq!(redact("with Zoë Adams"), "with [PERSON_NAME]");
        assert_eq!(redact("Ana María López"), "[PERSON_NAME] López");
        assert_eq!(redact("call 555-123-4567 today"), "call [PHONE] today");
        assert_eq!(redact("call 555.123.4567 today"), "call [PHONE] today");
        assert_eq!(redact("ssn 123-45-6789 on file"), "ssn [SSN] on file");
        assert_eq!(redact("mail jane.doe@example.com now"), "mail [EMAIL] now");
        assert_eq!(redact("seen 3/4/24 and 12/31/2023"), "seen [DATE] and [DATE]");
        assert_eq!(redact("lives at 42 elm street"), "lives at [ADDRESS]");
        assert_eq!(redact("lives at 7 oak blvd"), "lives at [ADDRESS]");
    }

    #[test]
    fn name_rule_wins_over_address_overlap() {
        // "Main Street" is a capitalized pair; names run first.
        assert_eq!(redact("123 Main Street"), "123 [PERSON_NAME]");
        assert!(no_rule_matches(&redact("123 Main Street")));
    }

    #[test]
    fn text_without_matches_is_unchanged() {
        let text = "follow-up in two weeks, blood pressure stable";
        assert_eq!(redact(text), text);
        assert_eq!(redact(""), "");
    }

    #[test]
    fn redaction_is_idempotent() {
        let samples = [
            "Jane Doe, 555-123-4567, 123-45-6789, jane@example.com, 1/2/2024, 12 Oak Lane",
            "Alice Bob Carol visited",
            "Mr Alice Bob Carol",
            "1 x 2 main st",
            "Referred by Dr Smith on 10/10/23",
            "[PERSON_NAME] [PHONE] [SSN] [EMAIL] [DATE] [ADDRESS]",
            "plain lowercase text with 12 numbers",
        ];
        for sample in samples {
            let once = redact(sample);
            assert_eq!(redact(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn redacted_output_has_no_residual_matches() {
        let samples = [
            "John Smith (SSN 123-45-6789) can be reached at 555.867.5309 or john@clinic.org",
            "Appointment 04/15/2025 at 900 Sunset Boulevard",
            "Jane Doe@Example.com",
            "10 Downing St and 221 baker street",
            "Emergency contact Mary Ann Jones 5551234567",
        ];
        for sample in samples {
            let redacted = redact(sample);
            assert!(no_rule_matches(&redacted), "residual match in {redacted:?}");
        }
    }

    /// Every three-token sequence over a vocabulary that puts placeholders
    /// next to capitalized, accented and numeric tokens.
    fn generated_inputs() -> Vec<String> {
        const TOKENS: [&str; 14] = [
            "[PERSON_NAME]",
            "[PHONE]",
            "[DATE]",
            "[ADDRESS]",
            "Jane",
            "Doe",
            "José",
            "Main",
            "st",
            "555",
            "123",
            "4567",
            "1/2/24",
            "a@b.io",
        ];
        const SEPARATORS: [&str; 5] = [" ", "", "-", ".", "/"];

        let mut inputs = Vec::new();
        for a in TOKENS {
            for b in TOKENS {
                for c in TOKENS {
                    for s1 in SEPARATORS {
                        for s2 in SEPARATORS {
                            inputs.push(format!("{a}{s1}{b}{s2}{c}"));
                        }
                    }
                }
            }
        }
        inputs
    }

    #[test]
    fn generated_inputs_redact_idempotently_without_residue() {
        let inputs = generated_inputs();
        assert_eq!(inputs.len(), 14 * 14 * 14 * 25);
        for input in &inputs {
            let once = redact(input);
            assert!(no_rule_matches(&once), "residual match in {once:?} from {input:?}");
            assert_eq!(redact(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn category_order_follows_catalog() {
        let mut categories: Vec<PatternCategory> = catalog().iter().map(|r| r.category).collect();
        let expected = categories.clone();
        categories.reverse();
        categories.sort();
        assert_eq!(categories, expected);
    }

    #[test]
    fn category_labels_are_stable() {
        assert_eq!(PatternCategory::Ssn.as_str(), "ssn");
        assert_eq!(PatternCategory::Address.as_str(), "address");
    }
}
