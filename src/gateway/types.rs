use serde::{Deserialize, Serialize};

use super::GatewayError;

/// The five gateway operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    FormAnalysis,
    InsuranceVerification,
    SchedulingSuggestion,
    Chat,
    FollowUp,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FormAnalysis => "form_analysis",
            Self::InsuranceVerification => "insurance_verification",
            Self::SchedulingSuggestion => "scheduling_suggestion",
            Self::Chat => "chat",
            Self::FollowUp => "follow_up",
        }
    }

    pub fn response_shape(&self) -> ResponseShape {
        match self {
            Self::Chat | Self::FollowUp => ResponseShape::FreeText,
            _ => ResponseShape::Structured,
        }
    }
}

/// low / medium / high, shared by form risk and scheduling priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    /// Case-insensitive parse; anything outside low/medium/high is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Typed payload per operation, as handed in by internal callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OperationRequest {
    AnalyzeForm {
        form_data: serde_json::Value,
    },
    VerifyInsurance {
        provider: String,
        policy_number: String,
        patient_info: serde_json::Value,
    },
    SuggestScheduling {
        patient_history: serde_json::Value,
        urgency: String,
    },
    Chat {
        message: String,
        #[serde(default)]
        context: serde_json::Value,
    },
    GenerateFollowUp {
        patient_name: String,
        appointment_type: String,
        #[serde(default)]
        next_steps: Vec<String>,
    },
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::AnalyzeForm { .. } => OperationKind::FormAnalysis,
            Self::VerifyInsurance { .. } => OperationKind::InsuranceVerification,
            Self::SuggestScheduling { .. } => OperationKind::SchedulingSuggestion,
            Self::Chat { .. } => OperationKind::Chat,
            Self::GenerateFollowUp { .. } => OperationKind::FollowUp,
        }
    }
}

/// Result mirror of `OperationRequest`. Every variant is fully populated,
/// including on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "camelCase")]
pub enum OperationResult {
    PatientInsight(PatientInsight),
    InsuranceVerification(InsuranceVerificationResult),
    AppointmentSuggestion(AppointmentSuggestion),
    ChatReply(String),
    FollowUpMessage(String),
}

impl OperationResult {
    /// The documented default for an operation that could not complete.
    pub fn fallback(kind: OperationKind) -> Self {
        match kind {
            OperationKind::FormAnalysis => Self::PatientInsight(PatientInsight::unavailable()),
            OperationKind::InsuranceVerification => {
                Self::InsuranceVerification(InsuranceVerificationResult::unavailable())
            }
            OperationKind::SchedulingSuggestion => {
                Self::AppointmentSuggestion(AppointmentSuggestion::unavailable())
            }
            OperationKind::Chat => Self::ChatReply(CHAT_UNAVAILABLE.to_string()),
            OperationKind::FollowUp => Self::FollowUpMessage(FOLLOW_UP_FALLBACK.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInsight {
    pub summary: String,
    pub risk_level: Level,
    pub recommendations: Vec<String>,
    pub flagged_items: Vec<String>,
}

impl PatientInsight {
    pub fn unavailable() -> Self {
        Self {
            summary: "Unable to analyze form at this time".into(),
            risk_level: Level::Low,
            recommendations: vec![],
            flagged_items: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceVerificationResult {
    pub is_valid: bool,
    pub coverage: Vec<String>,
    pub copay: f64,
    pub deductible: f64,
    pub notes: String,
}

impl InsuranceVerificationResult {
    pub fn unavailable() -> Self {
        Self {
            is_valid: false,
            coverage: vec![],
            copay: 0.0,
            deductible: 0.0,
            notes: "Unable to verify insurance at this time".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentSuggestion {
    pub suggested_time: String,
    /// Minutes.
    pub duration: u32,
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub priority: Level,
    pub reason: String,
}

impl AppointmentSuggestion {
    pub fn unavailable() -> Self {
        Self {
            suggested_time: "Next available".into(),
            duration: 30,
            appointment_type: "consultation".into(),
            priority: Level::Medium,
            reason: "Unable to analyze scheduling requirements".into(),
        }
    }
}

/// Chat reply when the provider could not be reached.
pub const CHAT_UNAVAILABLE: &str =
    "I'm experiencing technical difficulties. Please try again later.";

/// Chat reply when the provider answered with nothing.
pub const CHAT_EMPTY_REPLY: &str = "I'm sorry, I couldn't process your request at this time.";

/// Follow-up text for both failure and empty output.
pub const FOLLOW_UP_FALLBACK: &str =
    "Thank you for your visit. Please contact us if you have any questions.";

/// Whether the provider must answer with named fields or plain prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Structured,
    FreeText,
}

/// Provider-facing prompt assembled from screened input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: &'static str,
    pub user: String,
    pub shape: ResponseShape,
}

/// External text-generation provider (allows mocking).
pub trait LlmProvider {
    /// Single attempt; transport and provider-side failures are errors,
    /// output content is not interpreted.
    fn invoke(&self, prompt: &Prompt) -> Result<String, GatewayError>;

    fn name(&self) -> &'static str;
}

impl<P: LlmProvider + ?Sized> LlmProvider for std::sync::Arc<P> {
    fn invoke(&self, prompt: &Prompt) -> Result<String, GatewayError> {
        (**self).invoke(prompt)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
