//! Workflow error types.
//!
//! Only backend failures are errors. A missing index and unparseable model
//! output are absorbed inside the stages; see [`crate::parse::ParseFailure`].

use aawga_embeddings::EmbeddingError;
use aawga_llm::ProviderError;
use thiserror::Error;

use crate::stage::StageKind;

/// A backend call made by a stage failed.
#[derive(Debug, Error)]
pub enum StageError {
    /// Text generation failed.
    #[error("generation failed: {0}")]
    Generation(#[from] ProviderError),

    /// Embedding the retrieval query failed.
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] EmbeddingError),
}

impl StageError {
    /// Short category label.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Generation(e) => e.category(),
            Self::Retrieval(_) => "retrieval",
        }
    }

    /// Whether repeating the invocation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Generation(e) => e.is_retryable(),
            Self::Retrieval(e) => e.is_backend(),
        }
    }
}

/// An invocation aborted at `stage`.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct WorkflowError {
    /// Stage that failed.
    pub stage: StageKind,
    /// Stages that finished before the failure, in order.
    pub completed: Vec<StageKind>,
    /// Underlying failure.
    #[source]
    pub source: StageError,
}

/// Wiring a workflow from settings failed.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Embedding backend or retrieval configuration is invalid.
    #[error("embedding setup: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Generation backend could not be created.
    #[error("generation setup: {0}")]
    Generation(#[from] ProviderError),
}
