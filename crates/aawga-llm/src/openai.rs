//! OpenAI-compatible chat completions provider.
//!
//! Sends the prompt as a single user message to `{base_url}/chat/completions`
//! and returns `choices[0].message.content`.

use std::time::Duration;

use aawga_settings::GenerationSettings;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::error_parsing::error_for_status;
use crate::provider::{CompletionOptions, Provider, ProviderError, ProviderResult};

/// Configuration for [`OpenAiProvider`].
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API root; `/chat/completions` is appended.
    pub base_url: String,
    /// Chat model identifier.
    pub model: String,
    /// Bearer token.
    pub api_key: Option<String>,
    /// Defaults applied when a call leaves an option unset.
    pub defaults: CompletionOptions,
    /// Deadline for a single call.
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Build from generation settings plus the resolved API key.
    pub fn from_settings(s: &GenerationSettings, api_key: Option<String>) -> Self {
        Self {
            base_url: s.base_url.clone(),
            model: s.model.clone(),
            api_key: api_key.or_else(|| s.api_key.clone()),
            defaults: CompletionOptions {
                temperature: Some(s.temperature),
                max_tokens: s.max_tokens,
            },
            timeout: Duration::from_millis(s.timeout_ms),
        }
    }
}

/// Chat completions client.
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: reqwest::Client,
    endpoint: String,
}

impl OpenAiProvider {
    /// Create a new provider. Fails without an API key.
    pub fn new(config: OpenAiConfig) -> ProviderResult<Self> {
        if config.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(ProviderError::Auth {
                message: "no API key configured (set OPENAI_API_KEY)".into(),
            });
        }
        let endpoint = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        Ok(Self {
            config,
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    fn build_headers(&self) -> ProviderResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key.trim())).map_err(|e| {
                ProviderError::Auth {
                    message: format!("Invalid authorization header: {e}"),
                }
            })?;
            let _ = headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn build_request<'a>(&'a self, prompt: &'a str, options: &CompletionOptions) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature.or(self.config.defaults.temperature),
            max_tokens: options.max_tokens.or(self.config.defaults.max_tokens),
        }
    }

    async fn send(&self, request: &ChatRequest<'_>) -> ProviderResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.build_headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            let body = response.text().await.unwrap_or_default();
            let err = error_for_status(status.as_u16(), &body, retry_after.as_deref());
            error!(
                status = status.as_u16(),
                category = err.category(),
                retryable = err.is_retryable(),
                "chat completions request failed"
            );
            return Err(err);
        }

        let parsed: ChatResponse = serde_json::from_str(&response.text().await?)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyResponse)?;
        debug!(chars = content.chars().count(), "completion received");
        Ok(content)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn model(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip_all, fields(provider = "openai", model = %self.config.model))]
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> ProviderResult<String> {
        let request = self.build_request(prompt, options);
        let timeout_ms = u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX);
        tokio::time::timeout(self.config.timeout, self.send(&request))
            .await
            .map_err(|_| ProviderError::Timeout { ms: timeout_ms })?
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
