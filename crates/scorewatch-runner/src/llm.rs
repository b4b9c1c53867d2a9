//! Summarizer backends for the commentary path.
//!
//! Enum dispatch over the supported HTTP APIs. Both variants send the
//! rendered prompt as a single user message and return the model's text
//! verbatim; the engine decides what to do with failures.

use scorewatch_core::enricher::{SummarizeError, Summarizer};

use crate::config::{BackendType, LlmBackendConfig};

/// Anthropic caps sampling temperature at 1.0.
const ANTHROPIC_MAX_TEMPERATURE: f64 = 1.0;

/// A summarizer backend reachable over HTTP.
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
}

impl LlmBackend {
    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }

    /// Model identifier sent with each request.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi(backend) => &backend.settings.model,
            Self::Anthropic(backend) => &backend.settings.model,
        }
    }
}

impl Summarizer for LlmBackend {
    async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError> {
        match self {
            Self::OpenAi(backend) => backend.complete(prompt).await,
            Self::Anthropic(backend) => backend.complete(prompt).await,
        }
    }
}

/// Connection settings shared by both backends.
struct Settings {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl Settings {
    fn new(client: reqwest::Client, config: &LlmBackendConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Sends requests to `{api_url}/chat/completions`.
pub struct OpenAiBackend {
    settings: Settings,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(client: reqwest::Client, config: &LlmBackendConfig) -> Self {
        Self {
            settings: Settings::new(client, config),
        }
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        let s = &self.settings;
        serde_json::json!({
            "model": s.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "max_tokens": s.max_tokens,
            "temperature": s.temperature
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String, SummarizeError> {
        let s = &self.settings;
        let url = format!("{}/chat/completions", s.api_url);

        let response = s
            .client
            .post(&url)
            .bearer_auth(&s.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| SummarizeError::Backend(format!("OpenAI request failed: {e}")))?;

        let json = read_json(response, "OpenAI").await?;
        extract_openai_content(&json)
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, SummarizeError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            SummarizeError::Backend(
                "OpenAI response missing choices[0].message.content".to_owned(),
            )
        })
}

/// Backend for the Anthropic Messages API.
///
/// Authenticates with `x-api-key` and reads the reply from
/// `content[0].text`.
pub struct AnthropicBackend {
    settings: Settings,
}

impl AnthropicBackend {
    /// Create a new Anthropic Messages API backend.
    pub fn new(client: reqwest::Client, config: &LlmBackendConfig) -> Self {
        Self {
            settings: Settings::new(client, config),
        }
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        let s = &self.settings;
        serde_json::json!({
            "model": s.model,
            "max_tokens": s.max_tokens,
            "temperature": s.temperature.min(ANTHROPIC_MAX_TEMPERATURE),
            "messages": [
                {"role": "user", "content": prompt}
            ]
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String, SummarizeError> {
        let s = &self.settings;
        let url = format!("{}/messages", s.api_url);

        let response = s
            .client
            .post(&url)
            .header("x-api-key", &s.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| SummarizeError::Backend(format!("Anthropic request failed: {e}")))?;

        let json = read_json(response, "Anthropic").await?;
        extract_anthropic_content(&json)
    }
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, SummarizeError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            SummarizeError::Backend("Anthropic response missing content[0].text".to_owned())
        })
}

/// Check the status and decode the body as JSON.
async fn read_json(
    response: reqwest::Response,
    provider: &str,
) -> Result<serde_json::Value, SummarizeError> {
    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(SummarizeError::Backend(format!(
            "{provider} returned {status}: {error_body}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| SummarizeError::Backend(format!("{provider} response parse failed: {e}")))
}

/// Create a backend from configuration, sharing the given HTTP client.
pub fn create_backend(client: reqwest::Client, config: &LlmBackendConfig) -> LlmBackend {
    match config.backend_type {
        BackendType::OpenAi => LlmBackend::OpenAi(OpenAiBackend::new(client, config)),
        BackendType::Anthropic => LlmBackend::Anthropic(AnthropicBackend::new(client, config)),
    }
}
