pub mod patterns;
pub mod classify;
pub mod policy;
pub mod types;
pub mod prompt;
pub mod provider;
pub mod parser;
pub mod reidentify;
pub mod orchestrator;

pub use patterns::*;
pub use classify::*;
pub use policy::*;
pub use types::*;
pub use prompt::*;
pub use provider::*;
pub use parser::*;
pub use reidentify::*;
pub use orchestrator::*;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// Risky content outside an acknowledged HIPAA mode. The only error a
    /// caller of a gateway operation ever sees.
    #[error("Potential PHI detected ({}) but HIPAA mode is not enabled; enable HIPAA_MODE or de-identify the data", .categories.join(", "))]
    PolicyViolation { categories: Vec<&'static str> },

    #[error("AI provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("AI provider returned error (status {status}): {body}")]
    ProviderError { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl GatewayError {
    pub fn is_policy_violation(&self) -> bool {
        matches!(self, Self::PolicyViolation { .. })
    }

    /// Short stable label for logs. Never carries payload text.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PolicyViolation { .. } => "policy_violation",
            Self::ProviderUnavailable(_) | Self::ProviderError { .. } => "provider_unavailable",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Config(_) => "config",
        }
    }
}
