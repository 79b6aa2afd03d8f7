//! Live embedder for OpenAI-compatible `/embeddings` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use aawga_settings::{BackendKind, EmbeddingSettings};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::errors::{EmbeddingError, Result};
use crate::service::EmbeddingService;

/// Configuration for [`HttpEmbeddingService`].
#[derive(Clone, Debug)]
pub struct HttpEmbeddingConfig {
    /// API root; `/embeddings` is appended.
    pub base_url: String,
    /// Embedding model identifier.
    pub model: String,
    /// Bearer token; omitted from requests when `None`.
    pub api_key: Option<String>,
    /// Requested output dimensions.
    pub dimensions: Option<usize>,
    /// Maximum inputs per request.
    pub batch_size: usize,
    /// Deadline for each request.
    pub timeout: Duration,
}

impl HttpEmbeddingConfig {
    /// Build from settings plus the resolved API key.
    pub fn from_settings(s: &EmbeddingSettings, api_key: Option<String>) -> Self {
        Self {
            base_url: s.base_url.clone(),
            model: s.model.clone(),
            api_key,
            dimensions: s.dimensions,
            batch_size: s.batch_size.max(1),
            timeout: Duration::from_millis(s.timeout_ms),
        }
    }
}

/// Embeddings client that talks to OpenAI-compatible endpoints.
pub struct HttpEmbeddingService {
    config: HttpEmbeddingConfig,
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEmbeddingService {
    /// Create a new client.
    pub fn new(config: HttpEmbeddingConfig) -> Result<Self> {
        if config.model.trim().is_empty() {
            return Err(EmbeddingError::Config("missing embedding model name".into()));
        }
        let endpoint = format!("{}/embeddings", config.base_url.trim_end_matches('/'));
        Ok(Self {
            config,
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key.trim()))
                .map_err(|e| EmbeddingError::Config(format!("invalid API key header: {e}")))?;
            let _ = headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// One request, bounded end to end: send, status check and body decode
    /// all count against `timeout`.
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let timeout_ms = u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX);
        tokio::time::timeout(self.config.timeout, self.fetch_batch(inputs))
            .await
            .map_err(|_| EmbeddingError::Timeout { ms: timeout_ms })?
    }

    async fn fetch_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: inputs,
            dimensions: self.config.dimensions,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.build_headers()?)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "embeddings request failed");
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let mut parsed: EmbeddingResponse = response.json().await?;
        parsed.data.sort_by_key(|entry| entry.index);
        if parsed.data.len() != inputs.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: inputs.len(),
                got: parsed.data.len(),
            });
        }
        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingService for HttpEmbeddingService {
    #[instrument(skip_all, fields(model = %self.config.model, count = texts.len()))]
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size) {
            debug!(batch = batch.len(), "sending embeddings batch");
            out.extend(self.embed_batch(batch).await?);
        }
        Ok(out)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Live
    }

    fn dimensions(&self) -> Option<usize> {
        self.config.dimensions
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
