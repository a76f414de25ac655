use serde_json::{Map, Value};

use super::types::{
    AppointmentSuggestion, InsuranceVerificationResult, Level, PatientInsight, CHAT_EMPTY_REPLY,
    FOLLOW_UP_FALLBACK,
};
use super::GatewayError;

/// Form analysis. Missing or ill-typed fields fall back one by one.
pub fn parse_patient_insight(response: &str) -> Result<PatientInsight, GatewayError> {
    let obj = decode_object(response)?;
    Ok(PatientInsight {
        summary: string_field(&obj, &["summary"]).unwrap_or_else(|| "No summary available".into()),
        risk_level: level_field(&obj, &["riskLevel", "risk_level"]).unwrap_or(Level::Low),
        recommendations: string_list_field(&obj, &["recommendations"]).unwrap_or_default(),
        flagged_items: string_list_field(&obj, &["flaggedItems", "flagged_items"])
            .unwrap_or_default(),
    })
}

/// Insurance verification. Absent evidence never reads as coverage:
/// a missing `isValid` is false, missing amounts are zero.
pub fn parse_insurance_verification(
    response: &str,
) -> Result<InsuranceVerificationResult, GatewayError> {
    let obj = decode_object(response)?;
    Ok(InsuranceVerificationResult {
        is_valid: bool_field(&obj, &["isValid", "is_valid"]).unwrap_or(false),
        coverage: string_list_field(&obj, &["coverage"]).unwrap_or_default(),
        copay: amount_field(&obj, &["copay"]).unwrap_or(0.0),
        deductible: amount_field(&obj, &["deductible"]).unwrap_or(0.0),
        notes: string_field(&obj, &["notes"])
            .unwrap_or_else(|| "No verification notes provided".into()),
    })
}

pub fn parse_appointment_suggestion(
    response: &str,
) -> Result<AppointmentSuggestion, GatewayError> {
    let obj = decode_object(response)?;
    Ok(AppointmentSuggestion {
        suggested_time: string_field(&obj, &["suggestedTime", "suggested_time"])
            .unwrap_or_else(|| "Next available".into()),
        duration: minutes_field(&obj, &["duration"]).unwrap_or(30),
        appointment_type: string_field(&obj, &["type", "appointmentType"])
            .unwrap_or_else(|| "standard consultation".into()),
        priority: level_field(&obj, &["priority"]).unwrap_or(Level::Medium),
        reason: string_field(&obj, &["reason"])
            .unwrap_or_else(|| "Standard appointment scheduling".into()),
    })
}

/// Chat output is used verbatim; an empty reply becomes an apology.
pub fn parse_chat_reply(response: &str) -> String {
    if response.trim().is_empty() {
        CHAT_EMPTY_REPLY.to_string()
    } else {
        response.to_string()
    }
}

pub fn parse_follow_up(response: &str) -> String {
    if response.trim().is_empty() {
        FOLLOW_UP_FALLBACK.to_string()
    } else {
        response.to_string()
    }
}

/// Locate the JSON object in the provider output: a ```json fenced block if
/// present, otherwise the outermost `{ ... }` span.
fn extract_json_block(response: &str) -> Option<&str> {
    if let Some(fence) = response.find("```json") {
        let content = &response[fence + 7..];
        if let Some(end) = content.find("```") {
            return Some(content[..end].trim());
        }
    }
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

fn decode_object(response: &str) -> Result<Map<String, Value>, GatewayError> {
    let json = extract_json_block(response)
        .ok_or_else(|| GatewayError::MalformedResponse("No JSON object found".into()))?;
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(obj)) => Ok(obj),
        Ok(_) => Err(GatewayError::MalformedResponse("JSON is not an object".into())),
        Err(e) => Err(GatewayError::MalformedResponse(e.to_string())),
    }
}

/// First present value among the accepted key spellings.
fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null())
}

/// Non-blank string.
fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match lookup(obj, keys)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Array of strings; non-string items are skipped rather than failing the field.
fn string_list_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<Vec<String>> {
    match lookup(obj, keys)? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        _ => None,
    }
}

fn level_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<Level> {
    lookup(obj, keys)?.as_str().and_then(Level::parse)
}

fn bool_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    match lookup(obj, keys)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// JSON number or numeric string; "$25" and "25.00" both read as 25.
fn number_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    let n = match lookup(obj, keys)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_start_matches('$').replace(',', "").parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Money: negative amounts are treated as missing.
fn amount_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    number_field(obj, keys).filter(|n| *n >= 0.0)
}

/// Positive whole minutes, capped at one day.
fn minutes_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    let n = number_field(obj, keys)?.round();
    (n >= 1.0 && n <= 1440.0).then_some(n as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_insight() {
        let raw = r#"{"summary":"Stable","riskLevel":"high","recommendations":["Recheck BP"],"flaggedItems":["Chest pain"]}"#;
        let insight = parse_patient_insight(raw).unwrap();
        assert_eq!(insight.summary, "Stable");
        assert_eq!(insight.risk_level, Level::High);
        assert_eq!(insight.recommendations, vec!["Recheck BP"]);
        assert_eq!(insight.flagged_items, vec!["Chest pain"]);
    }

    #[test]
    fn insight_missing_fields_use_defaults() {
        let insight = parse_patient_insight("{}").unwrap();
        assert_eq!(insight.summary, "No summary available");
        assert_eq!(insight.risk_level, Level::Low);
        assert!(insight.recommendations.is_empty());
        assert!(insight.flagged_items.is_empty());
    }

    #[test]
    fn unknown_risk_level_defaults_low() {
        let insight = parse_patient_insight(r#"{"riskLevel":"catastrophic"}"#).unwrap();
        assert_eq!(insight.risk_level, Level::Low);
        let insight = parse_patient_insight(r#"{"riskLevel":3}"#).unwrap();
        assert_eq!(insight.risk_level, Level::Low);
    }

    #[test]
    fn mixed_arrays_keep_only_strings() {
        let insight =
            parse_patient_insight(r#"{"recommendations":["Hydrate", 4, null, {"x":1}, " "]}"#)
                .unwrap();
        assert_eq!(insight.recommendations, vec!["Hydrate"]);
    }

    #[test]
    fn fenced_json_with_prose_is_extracted() {
        let raw = "Here you go:\n```json\n{\"summary\": \"Fine\", \"riskLevel\": \"Medium\"}\n```\nThanks";
        let insight = parse_patient_insight(raw).unwrap();
        assert_eq!(insight.summary, "Fine");
        assert_eq!(insight.risk_level, Level::Medium);
    }

    #[test]
    fn bare_object_inside_prose_is_extracted() {
        let raw = "Result: {\"priority\": \"high\"} end";
        assert_eq!(parse_appointment_suggestion(raw).unwrap().priority, Level::High);
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            parse_patient_insight("I cannot help with that."),
            Err(GatewayError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_patient_insight("{not json}"),
            Err(GatewayError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_insurance_verification("```json\n[1,2]\n```"),
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[test]
    fn insurance_missing_copay_is_defaulted() {
        let raw = r#"{"isValid": true, "coverage": ["Dental"], "deductible": 1000, "notes": "ok"}"#;
        let result = parse_insurance_verification(raw).unwrap();
        assert!(result.is_valid);
        assert_eq!(result.coverage, vec!["Dental"]);
        assert_eq!(result.copay, 0.0);
        assert_eq!(result.deductible, 1000.0);
        assert_eq!(result.notes, "ok");
    }

    #[test]
    fn insurance_missing_validity_is_not_valid() {
        let result = parse_insurance_verification("{}").unwrap();
        assert!(!result.is_valid);
        assert!(result.coverage.is_empty());
        assert_eq!(result.notes, "No verification notes provided");
    }

    #[test]
    fn insurance_explicit_false_is_preserved() {
        let result = parse_insurance_verification(r#"{"isValid": false}"#).unwrap();
        assert!(!result.is_valid);
        let result = parse_insurance_verification(r#"{"isValid": "TRUE"}"#).unwrap();
        assert!(result.is_valid);
    }

    #[test]
    fn insurance_amounts_accept_numeric_strings() {
        let raw = r#"{"copay": "$25.50", "deductible": "1,500"}"#;
        let result = parse_insurance_verification(raw).unwrap();
        assert_eq!(result.copay, 25.5);
        assert_eq!(result.deductible, 1500.0);
    }

    #[test]
    fn negative_amounts_are_ignored() {
        let result = parse_insurance_verification(r#"{"copay": -10}"#).unwrap();
        assert_eq!(result.copay, 0.0);
    }

    #[test]
    fn scheduling_full_and_defaults() {
        let raw = r#"{"suggestedTime":"Tomorrow 9am","duration":45,"type":"follow-up","priority":"low","reason":"Routine"}"#;
        let s = parse_appointment_suggestion(raw).unwrap();
        assert_eq!(s.suggested_time, "Tomorrow 9am");
        assert_eq!(s.duration, 45);
        assert_eq!(s.appointment_type, "follow-up");
        assert_eq!(s.priority, Level::Low);
        assert_eq!(s.reason, "Routine");

        let s = parse_appointment_suggestion("{}").unwrap();
        assert_eq!(s.suggested_time, "Next available");
        assert_eq!(s.duration, 30);
        assert_eq!(s.appointment_type, "standard consultation");
        assert_eq!(s.priority, Level::Medium);
        assert_eq!(s.reason, "Standard appointment scheduling");
    }

    #[test]
    fn scheduling_duration_out_of_range_defaults() {
        for raw in [r#"{"duration":0}"#, r#"{"duration":-15}"#, r#"{"duration":100000}"#, r#"{"duration":"soon"}"#] {
            assert_eq!(parse_appointment_suggestion(raw).unwrap().duration, 30, "{raw}");
        }
        assert_eq!(parse_appointment_suggestion(r#"{"duration":"20"}"#).unwrap().duration, 20);
    }

    #[test]
    fn snake_case_keys_are_accepted() {
        let s = parse_appointment_suggestion(r#"{"suggested_time":"Friday"}"#).unwrap();
        assert_eq!(s.suggested_time, "Friday");
    }

    #[test]
    fn chat_reply_verbatim_or_apology() {
        assert_eq!(parse_chat_reply("  Sure, Tuesday works.\n"), "  Sure, Tuesday works.\n");
        assert_eq!(parse_chat_reply("   "), CHAT_EMPTY_REPLY);
    }

    #[test]
    fn empty_follow_up_uses_fallback() {
        assert_eq!(parse_follow_up(""), FOLLOW_UP_FALLBACK);
        assert_eq!(parse_follow_up("Dear patient"), "Dear patient");
    }
}
