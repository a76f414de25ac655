use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::types::{LlmProvider, Prompt, ResponseShape};
use super::GatewayError;
use crate::config::{ConfigError, GatewayConfig, ProviderKind};

/// Select and construct the provider client named by the configuration.
pub fn build_provider(
    config: &GatewayConfig,
) -> Result<Box<dyn LlmProvider + Send + Sync>, GatewayError> {
    config.validate()?;
    match config.provider {
        ProviderKind::OpenAi => {
            let api_key = config
                .api_key
                .as_ref()
                .ok_or(ConfigError::MissingApiKey)?;
            Ok(Box::new(OpenAiClient::new(
                &config.base_url,
                &config.model,
                api_key,
                config.timeout_secs,
            )?))
        }
        ProviderKind::Ollama => Ok(Box::new(OllamaClient::new(
            &config.base_url,
            &config.model,
            config.timeout_secs,
        )?)),
    }
}

fn http_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, GatewayError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| GatewayError::ProviderUnavailable(format!("HTTP client setup failed: {e}")))
}

fn map_transport_error(e: reqwest::Error, base_url: &str, timeout_secs: u64) -> GatewayError {
    if e.is_connect() {
        GatewayError::ProviderUnavailable(format!("cannot connect to {base_url}"))
    } else if e.is_timeout() {
        GatewayError::ProviderUnavailable(format!("request timed out after {timeout_secs}s"))
    } else {
        GatewayError::ProviderUnavailable(e.to_string())
    }
}

/// Non-2xx responses become `ProviderError`; the body is kept for operators.
fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(GatewayError::ProviderError {
        status: status.as_u16(),
        body,
    })
}

// ──────────────────────────────────────────────
// OpenAI-compatible chat completions
// ──────────────────────────────────────────────

/// Client for `/v1/chat/completions`.
pub struct OpenAiClient {
    base_url: String,
    model: String,
    api_key: Zeroizing<String>,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout_secs: u64,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: Zeroizing::new(api_key.to_string()),
            client: http_client(timeout_secs)?,
            timeout_secs,
        })
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl LlmProvider for OpenAiClient {
    fn invoke(&self, prompt: &Prompt) -> Result<String, GatewayError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            response_format: match prompt.shape {
                ResponseShape::Structured => Some(ResponseFormat { kind: "json_object" }),
                ResponseShape::FreeText => None,
            },
        };

        tracing::debug!(provider = "openai", model = %self.model, shape = ?prompt.shape, "Calling provider");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.as_str())
            .json(&body)
            .send()
            .map_err(|e| map_transport_error(e, &self.base_url, self.timeout_secs))?;

        let parsed: ChatCompletionResponse = check_status(response)?
            .json()
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ──────────────────────────────────────────────
// Ollama
// ──────────────────────────────────────────────

/// Client for a local Ollama instance (`/api/generate`).
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, GatewayError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: http_client(timeout_secs)?,
            timeout_secs,
        })
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl LlmProvider for OllamaClient {
    fn invoke(&self, prompt: &Prompt) -> Result<String, GatewayError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt: &prompt.user,
            system: prompt.system,
            stream: false,
            format: match prompt.shape {
                ResponseShape::Structured => Some("json"),
                ResponseShape::FreeText => None,
            },
        };

        tracing::debug!(provider = "ollama", model = %self.model, shape = ?prompt.shape, "Calling provider");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| map_transport_error(e, &self.base_url, self.timeout_secs))?;

        let parsed: OllamaGenerateResponse = check_status(response)?
            .json()
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        Ok(parsed.response)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

// ──────────────────────────────────────────────
// Mock
// ──────────────────────────────────────────────

/// Mock provider for testing: returns a scripted reply (or failure) and
/// records every prompt it is sent.
pub struct MockProvider {
    reply: Result<String, String>,
    received: Mutex<Vec<Prompt>>,
}

impl MockProvider {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            received: Mutex::new(Vec::new()),
        }
    }

    /// A provider that fails every call with `ProviderUnavailable`.
    pub fn unavailable() -> Self {
        Self {
            reply: Err("mock provider offline".to_string()),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    pub fn received(&self) -> Vec<Prompt> {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl LlmProvider for MockProvider {
    fn invoke(&self, prompt: &Prompt) -> Result<String, GatewayError> {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(prompt.clone());
        self.reply
            .clone()
            .map_err(GatewayError::ProviderUnavailable)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
