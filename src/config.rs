use std::fmt;

use thiserror::Error;
use zeroize::Zeroizing;

/// Application-level constants
pub const APP_NAME: &str = "practice-ai-gateway";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default provider request timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com";
const OLLAMA_DEFAULT_MODEL: &str = "medgemma";
const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,practice_ai_gateway=debug"
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown AI provider '{0}' (expected 'openai' or 'ollama')")]
    UnknownProvider(String),

    #[error("OPENAI_API_KEY must be set when AI_PROVIDER is 'openai'")]
    MissingApiKey,

    #[error("Invalid provider base URL: '{0}'")]
    InvalidBaseUrl(String),

    #[error("Invalid model name: '{0}'")]
    InvalidModelName(String),

    #[error("Invalid AI_TIMEOUT_SECS value: '{0}'")]
    InvalidTimeout(String),
}

/// Which external text-generation provider the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Ollama,
}

impl ProviderKind {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            _ => Err(ConfigError::UnknownProvider(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => OPENAI_DEFAULT_MODEL,
            Self::Ollama => OLLAMA_DEFAULT_MODEL,
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => OPENAI_DEFAULT_BASE_URL,
            Self::Ollama => OLLAMA_DEFAULT_BASE_URL,
        }
    }
}

/// Operating mode of the gateway. Built once at startup and passed by
/// reference into every call; nothing in the gateway reads the environment.
#[derive(Clone)]
pub struct GatewayConfig {
    pub provider: ProviderKind,
    pub model: String,
    /// Operator has accepted HIPAA-mode responsibility for sending PHI-bearing
    /// requests to the provider.
    pub hipaa_mode: bool,
    /// Redact identifiable substrings before the provider call.
    pub deidentify_before_call: bool,
    pub base_url: String,
    pub api_key: Option<Zeroizing<String>>,
    pub timeout_secs: u64,
}

impl GatewayConfig {
    /// Fail-closed defaults: HIPAA mode off (risky text is rejected) and
    /// de-identification on.
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            hipaa_mode: false,
            deidentify_before_call: true,
            base_url: provider.default_base_url().to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_hipaa_mode(mut self, enabled: bool) -> Self {
        self.hipaa_mode = enabled;
        self
    }

    pub fn with_deidentify(mut self, enabled: bool) -> Self {
        self.deidentify_before_call = enabled;
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(Zeroizing::new(api_key.to_string()));
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Load from the process environment. Call once at startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production,
    /// a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match lookup("AI_PROVIDER") {
            Some(raw) if !raw.trim().is_empty() => ProviderKind::parse(&raw)?,
            _ => ProviderKind::OpenAi,
        };

        let mut config = Self::new(provider);

        if let Some(model) = non_empty(lookup("AI_MODEL")) {
            config.model = model;
        }

        // Only the literal "true" enables HIPAA mode; anything else keeps it off.
        config.hipaa_mode = lookup("HIPAA_MODE")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        // Only the literal "false" disables de-identification.
        config.deidentify_before_call = !lookup("DEIDENTIFY_BEFORE_CALL")
            .map(|v| v.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(false);

        if let Some(url) = non_empty(lookup("AI_BASE_URL")) {
            config = config.with_base_url(&url);
        }

        if let Some(key) = non_empty(lookup("OPENAI_API_KEY")) {
            config.api_key = Some(Zeroizing::new(key));
        }

        if let Some(raw) = non_empty(lookup("AI_TIMEOUT_SECS")) {
            config.timeout_secs = match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the provider client cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url(&self.base_url)?;
        validate_model_name(&self.model)?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("0".into()));
        }
        if self.provider == ProviderKind::OpenAi && self.api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("hipaa_mode", &self.hipaa_mode)
            .field("deidentify_before_call", &self.deidentify_before_call)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The base URL must carry an explicit http(s) scheme and a host.
fn validate_base_url(url: &str) -> Result<(), ConfigError> {
    let after_scheme = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| ConfigError::InvalidBaseUrl(url.to_string()))?;

    let host = after_scheme.split('/').next().unwrap_or("");
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidBaseUrl(url.to_string()));
    }
    Ok(())
}

/// Format: [namespace/]model[:tag]. Blocks path traversal and shell
/// metacharacters before the name is placed in any request body.
fn validate_model_name(name: &str) -> Result<(), ConfigError> {
    let valid = regex::Regex::new(
        r"^[a-zA-Z0-9][a-zA-Z0-9._-]*(/[a-zA-Z0-9][a-zA-Z0-9._-]*)?(:[a-zA-Z0-9._-]+)?$",
    )
    .expect("static regex");

    if !valid.is_match(name) {
        return Err(ConfigError::InvalidModelName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_fail_closed() {
        let config = GatewayConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")]))
            .unwrap();
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.model, "gpt-4o-mini");
        assert!(!config.hipaa_mode);
        assert!(config.deidentify_before_call);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.base_url, "https://api.openai.com");
    }

    #[test]
    fn hipaa_mode_requires_literal_true() {
        for (raw, expected) in [("true", true), ("TRUE", true), (" true ", true), ("1", false), ("yes", false)] {
            let config = GatewayConfig::from_lookup(lookup_from(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("HIPAA_MODE", raw),
            ]))
            .unwrap();
            assert_eq!(config.hipaa_mode, expected, "HIPAA_MODE={raw}");
        }
    }

    #[test]
    fn deidentify_only_disabled_by_literal_false() {
        for (raw, expected) in [("false", false), ("False", false), ("0", true), ("no", true), ("", true)] {
            let config = GatewayConfig::from_lookup(lookup_from(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("DEIDENTIFY_BEFORE_CALL", raw),
            ]))
            .unwrap();
            assert_eq!(config.deidentify_before_call, expected, "DEIDENTIFY_BEFORE_CALL={raw}");
        }
    }

    #[test]
    fn ollama_provider_uses_local_defaults() {
        let config = GatewayConfig::from_lookup(lookup_from(&[("AI_PROVIDER", "Ollama")])).unwrap();
        assert_eq!(config.provider, ProviderKind::Ollama);
        assert_eq!(config.model, "medgemma");
        assert_eq!(config.base_url, "http://localhost:11434");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn unknown_provider_rejected() {
        let err = GatewayConfig::from_lookup(lookup_from(&[("AI_PROVIDER", "carrier-pigeon")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownProvider("carrier-pigeon".into()));
    }

    #[test]
    fn openai_requires_api_key() {
        let err = GatewayConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);
    }

    #[test]
    fn model_and_base_url_overrides() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("AI_PROVIDER", "ollama"),
            ("AI_MODEL", "alibayram/medgemma:4b"),
            ("AI_BASE_URL", "http://127.0.0.1:9999/"),
        ]))
        .unwrap();
        assert_eq!(config.model, "alibayram/medgemma:4b");
        assert_eq!(config.base_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn invalid_model_name_rejected() {
        let err = GatewayConfig::from_lookup(lookup_from(&[
            ("AI_PROVIDER", "ollama"),
            ("AI_MODEL", "../etc/passwd"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidModelName(_)));
    }

    #[test]
    fn invalid_base_url_rejected() {
        let err = GatewayConfig::from_lookup(lookup_from(&[
            ("AI_PROVIDER", "ollama"),
            ("AI_BASE_URL", "localhost:11434"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));
    }

    #[test]
    fn invalid_timeout_rejected() {
        for raw in ["0", "-5", "soon"] {
            let err = GatewayConfig::from_lookup(lookup_from(&[
                ("AI_PROVIDER", "ollama"),
                ("AI_TIMEOUT_SECS", raw),
            ]))
            .unwrap_err();
            assert_eq!(err, ConfigError::InvalidTimeout(raw.into()));
        }
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = GatewayConfig::new(ProviderKind::OpenAi).with_api_key("sk-very-secret");
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-very-secret"));
        assert!(printed.contains("[REDACTED]"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
