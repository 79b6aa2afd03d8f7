//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`
//! so a settings file may name any subset of fields; missing fields keep
//! their compiled default.

mod generation;
mod retrieval;

pub use generation::*;
pub use retrieval::*;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// # JSON Format
///
/// ```json
/// {
///   "generation": { "backend": "stub" },
///   "retrieval": { "topK": 5 }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AawgaSettings {
    /// Text-generation backend.
    pub generation: GenerationSettings,
    /// Embedding backend.
    pub embedding: EmbeddingSettings,
    /// Chunking, index location and similarity search.
    pub retrieval: RetrievalSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

/// Which implementation backs a capability.
///
/// `Stub` never performs network calls: generation returns deterministic
/// placeholder items and embeddings are the constant vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Deterministic, offline substitute.
    Stub,
    /// Real remote service.
    Live,
}

impl BackendKind {
    /// Parse `stub` / `live` (case-insensitive).
    pub fn parse(val: &str) -> Option<Self> {
        match val.trim().to_lowercase().as_str() {
            "stub" | "dummy" => Some(Self::Stub),
            "live" | "real" => Some(Self::Live),
            _ => None,
        }
    }

    /// Lowercase name as used in settings and index directory names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stub => "stub",
            Self::Live => "live",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit newline-delimited JSON instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
