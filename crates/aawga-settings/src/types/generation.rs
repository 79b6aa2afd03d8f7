use serde::{Deserialize, Serialize};

use super::BackendKind;

/// Default OpenAI-compatible API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Text-generation backend settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    /// `stub` returns placeholder items without any network call.
    pub backend: BackendKind,
    /// Chat model identifier.
    pub model: String,
    /// API root; `/chat/completions` is appended.
    pub base_url: String,
    /// Bearer token. Usually supplied through `OPENAI_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Completion token cap; provider default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Upper bound for a single generation call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Live,
            model: "gpt-4".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            temperature: 0.0,
            max_tokens: None,
            timeout_ms: 60_000,
        }
    }
}

/// Embedding backend settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// `stub` embeds every text as the constant 5-dimensional vector.
    pub backend: BackendKind,
    /// Embedding model identifier (live only).
    pub model: String,
    /// API root; `/embeddings` is appended.
    pub base_url: String,
    /// Requested output dimensions (live only; model default when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    /// Maximum texts per embeddings request.
    pub batch_size: usize,
    /// Upper bound for a single embeddings call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Stub,
            model: "text-embedding-3-small".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            dimensions: None,
            batch_size: 64,
            timeout_ms: 30_000,
        }
    }
}
