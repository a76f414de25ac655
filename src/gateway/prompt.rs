use super::policy::RedactionOutcome;
use super::types::{OperationKind, Prompt};

pub const FORM_ANALYSIS_SYSTEM_PROMPT: &str = r#"
You are a medical AI assistant that analyzes patient intake forms for healthcare providers.
The form you receive has been DE-IDENTIFIED: names, phone numbers, SSNs, emails, dates and
addresses were replaced by bracketed placeholders such as [PERSON_NAME] or [DATE].

RULES:
1. NEVER attempt to guess, infer, or reconstruct the identity behind any placeholder.
2. NEVER reference specific patient identifiers.
3. Provide concise, professional insights.
4. Output MUST be a single valid JSON object and nothing else.
"#;

pub const INSURANCE_SYSTEM_PROMPT: &str = r#"
You are an insurance verification system. Provide realistic verification results.
Patient details you receive are DE-IDENTIFIED; bracketed placeholders such as [PERSON_NAME]
stand in for removed identifiers.

RULES:
1. NEVER attempt to guess, infer, or reconstruct the identity behind any placeholder.
2. Output MUST be a single valid JSON object and nothing else.
"#;

pub const SCHEDULING_SYSTEM_PROMPT: &str = r#"
You are a medical scheduling assistant that optimizes appointment timing and duration
based on patient needs. The patient history you receive is DE-IDENTIFIED; bracketed
placeholders such as [PERSON_NAME] or [DATE] stand in for removed identifiers.

RULES:
1. NEVER attempt to guess, infer, or reconstruct the identity behind any placeholder.
2. Output MUST be a single valid JSON object and nothing else.
"#;

pub const CHAT_SYSTEM_PROMPT: &str = r#"
You are a medical practice assistant. Help with scheduling, patient management, and
administrative tasks, and provide professional assistance.
You work only with DE-IDENTIFIED data: bracketed placeholders such as [PERSON_NAME],
[PHONE] or [DATE] stand in for removed identifiers. NEVER attempt to guess, infer, or
reconstruct the identity behind any placeholder.
"#;

pub const FOLLOW_UP_SYSTEM_PROMPT: &str = r#"
You are a medical practice communication assistant. Generate professional, caring
follow-up messages for patients.
The information you receive is DE-IDENTIFIED. If the patient is given as a bracketed
placeholder such as [PATIENT_NAME], write that placeholder verbatim wherever the patient
is addressed. NEVER attempt to guess, infer, or reconstruct the identity behind any
placeholder, and never invent a name.
"#;

/// System prompt for an operation.
pub fn system_prompt(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::FormAnalysis => FORM_ANALYSIS_SYSTEM_PROMPT,
        OperationKind::InsuranceVerification => INSURANCE_SYSTEM_PROMPT,
        OperationKind::SchedulingSuggestion => SCHEDULING_SYSTEM_PROMPT,
        OperationKind::Chat => CHAT_SYSTEM_PROMPT,
        OperationKind::FollowUp => FOLLOW_UP_SYSTEM_PROMPT,
    }
}

fn prompt(kind: OperationKind, user: String) -> Prompt {
    Prompt {
        system: system_prompt(kind),
        user,
        shape: kind.response_shape(),
    }
}

/// Form analysis over a screened, JSON-serialized form.
pub fn build_form_analysis_prompt(form_data: &RedactionOutcome) -> Prompt {
    let form = form_data.text();
    prompt(
        OperationKind::FormAnalysis,
        format!(
            r#"Analyze this de-identified patient intake form and provide medical insights.
Respond with JSON in this format: {{ "summary": string, "riskLevel": "low"|"medium"|"high", "recommendations": string[], "flaggedItems": string[] }}

Form data: {form}"#
        ),
    )
}

/// Simulated insurance verification.
pub fn build_insurance_prompt(
    provider: &RedactionOutcome,
    policy_number: &RedactionOutcome,
    patient_info: &RedactionOutcome,
) -> Prompt {
    let provider = provider.text();
    let policy = policy_number.text();
    let patient = patient_info.text();
    prompt(
        OperationKind::InsuranceVerification,
        format!(
            r#"Simulate insurance verification for:
Provider: {provider}
Policy: {policy}
Patient: {patient}

Respond with JSON: {{ "isValid": boolean, "coverage": string[], "copay": number, "deductible": number, "notes": string }}"#
        ),
    )
}

pub fn build_scheduling_prompt(
    patient_history: &RedactionOutcome,
    urgency: &RedactionOutcome,
) -> Prompt {
    let history = patient_history.text();
    let urgency = urgency.text();
    prompt(
        OperationKind::SchedulingSuggestion,
        format!(
            r#"Based on de-identified patient history and urgency level, suggest optimal appointment scheduling:
Patient history: {history}
Urgency: {urgency}

Respond with JSON: {{ "suggestedTime": string, "duration": number, "type": string, "priority": "low"|"medium"|"high", "reason": string }}"#
        ),
    )
}

pub fn build_chat_prompt(message: &RedactionOutcome, context: &RedactionOutcome) -> Prompt {
    prompt(
        OperationKind::Chat,
        format!("Context: {}\n\nQuestion: {}", context.text(), message.text()),
    )
}

/// `recipient` is either the identity placeholder or, when the operator has
/// opted out of de-identification, the screened real name.
pub fn build_follow_up_prompt(
    recipient: &RedactionOutcome,
    appointment_type: &RedactionOutcome,
    next_steps: &RedactionOutcome,
) -> Prompt {
    let patient = recipient.text();
    let appointment = appointment_type.text();
    let steps = next_steps.text();
    prompt(
        OperationKind::FollowUp,
        format!(
            r#"Generate a professional follow-up message for:
Patient: {patient}
Appointment type: {appointment}
Next steps: {steps}

Keep it warm, professional, and under 200 words."#
        ),
    )
}
