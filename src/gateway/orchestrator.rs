use std::time::Instant;

use serde_json::Value;
use uuid::Uuid;

use super::parser::{
    parse_appointment_suggestion, parse_chat_reply, parse_follow_up, parse_insurance_verification,
    parse_patient_insight,
};
use super::policy::{apply_policy, apply_policy_json, RedactionOutcome};
use super::prompt::{
    build_chat_prompt, build_follow_up_prompt, build_form_analysis_prompt,
    build_insurance_prompt, build_scheduling_prompt,
};
use super::provider::build_provider;
use super::reidentify::{
    address_recipient, limit_words, FOLLOW_UP_MAX_WORDS, IDENTITY_PLACEHOLDER,
};
use super::types::{
    AppointmentSuggestion, InsuranceVerificationResult, LlmProvider, OperationKind,
    OperationRequest, OperationResult, PatientInsight, CHAT_UNAVAILABLE, FOLLOW_UP_FALLBACK,
};
use super::GatewayError;
use crate::config::GatewayConfig;

/// Mediates every call to the text-generation provider:
/// policy gate → prompt → provider → parse → (re-identify, follow-up only)
///
/// Holds no per-call state; one instance can serve concurrent callers.
pub struct SecureAiGateway {
    config: GatewayConfig,
    provider: Box<dyn LlmProvider + Send + Sync>,
}

impl SecureAiGateway {
    pub fn new(config: GatewayConfig, provider: Box<dyn LlmProvider + Send + Sync>) -> Self {
        Self { config, provider }
    }

    /// Validate the configuration and connect the provider it names.
    pub fn from_config(config: GatewayConfig) -> Result<Self, GatewayError> {
        let provider = build_provider(&config)?;
        Ok(Self::new(config, provider))
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn analyze_form(&self, form_data: &Value) -> Result<PatientInsight, GatewayError> {
        self.guarded(OperationKind::FormAnalysis, PatientInsight::unavailable, || {
            let form = self.screen_json(form_data)?;
            let raw = self.provider.invoke(&build_form_analysis_prompt(&form))?;
            parse_patient_insight(&raw)
        })
    }

    pub fn verify_insurance(
        &self,
        provider: &str,
        policy_number: &str,
        patient_info: &Value,
    ) -> Result<InsuranceVerificationResult, GatewayError> {
        self.guarded(
            OperationKind::InsuranceVerification,
            InsuranceVerificationResult::unavailable,
            || {
                let provider = self.screen(provider)?;
                let policy = self.screen(policy_number)?;
                let patient = self.screen_json(patient_info)?;
                let raw = self
                    .provider
                    .invoke(&build_insurance_prompt(&provider, &policy, &patient))?;
                parse_insurance_verification(&raw)
            },
        )
    }

    pub fn suggest_scheduling(
        &self,
        patient_history: &Value,
        urgency: &str,
    ) -> Result<AppointmentSuggestion, GatewayError> {
        self.guarded(
            OperationKind::SchedulingSuggestion,
            AppointmentSuggestion::unavailable,
            || {
                let history = self.screen_json(patient_history)?;
                let urgency = self.screen(urgency)?;
                let raw = self
                    .provider
                    .invoke(&build_scheduling_prompt(&history, &urgency))?;
                parse_appointment_suggestion(&raw)
            },
        )
    }

    pub fn chat(&self, message: &str, context: &Value) -> Result<String, GatewayError> {
        self.guarded(OperationKind::Chat, || CHAT_UNAVAILABLE.to_string(), || {
            let message = self.screen(message)?;
            let context = match context {
                Value::Null => self.screen("{}")?,
                other => self.screen_json(other)?,
            };
            let raw = self.provider.invoke(&build_chat_prompt(&message, &context))?;
            Ok(parse_chat_reply(&raw))
        })
    }

    /// The recipient's name is swapped for a placeholder before the call
    /// and written back into the generated text afterwards. A reply that
    /// dropped the placeholder is prefixed with a greeting by name.
    pub fn generate_follow_up(
        &self,
        patient_name: &str,
        appointment_type: &str,
        next_steps: &[String],
    ) -> Result<String, GatewayError> {
        self.guarded(OperationKind::FollowUp, || FOLLOW_UP_FALLBACK.to_string(), || {
            let masked = self.config.deidentify_before_call;
            let recipient = self.screen(if masked { IDENTITY_PLACEHOLDER } else { patient_name })?;
            let appointment = self.screen(appointment_type)?;
            let steps = self.screen(&next_steps.join(", "))?;

            let raw = self
                .provider
                .invoke(&build_follow_up_prompt(&recipient, &appointment, &steps))?;
            let message = parse_follow_up(&raw);
            let message = if masked && !raw.trim().is_empty() {
                address_recipient(&message, patient_name)
            } else {
                message
            };
            Ok(limit_words(&message, FOLLOW_UP_MAX_WORDS))
        })
    }

    /// Dispatch a typed request to its operation.
    pub fn execute(&self, request: OperationRequest) -> Result<OperationResult, GatewayError> {
        match request {
            OperationRequest::AnalyzeForm { form_data } => self
                .analyze_form(&form_data)
                .map(OperationResult::PatientInsight),
            OperationRequest::VerifyInsurance {
                provider,
                policy_number,
                patient_info,
            } => self
                .verify_insurance(&provider, &policy_number, &patient_info)
                .map(OperationResult::InsuranceVerification),
            OperationRequest::SuggestScheduling {
                patient_history,
                urgency,
            } => self
                .suggest_scheduling(&patient_history, &urgency)
                .map(OperationResult::AppointmentSuggestion),
            OperationRequest::Chat { message, context } => self
                .chat(&message, &context)
                .map(OperationResult::ChatReply),
            OperationRequest::GenerateFollowUp {
                patient_name,
                appointment_type,
                next_steps,
            } => self
                .generate_follow_up(&patient_name, &appointment_type, &next_steps)
                .map(OperationResult::FollowUpMessage),
        }
    }

    fn screen(&self, raw: &str) -> Result<RedactionOutcome, GatewayError> {
        apply_policy(&self.config, raw)
    }

    fn screen_json(&self, raw: &Value) -> Result<RedactionOutcome, GatewayError> {
        apply_policy_json(&self.config, raw)
    }

    /// Run one operation inside its own span. A policy violation is returned
    /// to the caller; any other failure is logged by kind and replaced with
    /// the operation's default.
    fn guarded<T>(
        &self,
        kind: OperationKind,
        fallback: impl FnOnce() -> T,
        run: impl FnOnce() -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        let span = tracing::info_span!(
            "gateway_call",
            op = kind.as_str(),
            request_id = %Uuid::new_v4()
        );
        let _enter = span.enter();
        let start = Instant::now();

        match run() {
            Ok(result) => {
                tracing::info!(
                    provider = self.provider.name(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Gateway call complete"
                );
                Ok(result)
            }
            Err(e) if e.is_policy_violation() => Err(e),
            Err(e) => {
                if let GatewayError::ProviderError { status, .. } = &e {
                    tracing::debug!(status, "Provider rejected request");
                }
                tracing::warn!(
                    provider = self.provider.name(),
                    failure = e.kind(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Gateway call failed, returning default result"
                );
                Ok(fallback())
            }
        }
    }
}
