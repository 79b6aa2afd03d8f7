//! Embedding and index error types.
//!
//! A missing or unreadable index is not an error at the retrieval boundary:
//! [`crate::retrieval::RetrievalService`] maps it to "unavailable". The
//! variants here surface only from the lower layers and from backend calls.

use thiserror::Error;

/// Errors from embedding and index operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The embeddings endpoint answered with a non-success status.
    #[error("embeddings API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description (body excerpt).
        message: String,
    },

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A backend call exceeded its deadline.
    #[error("embedding call timed out after {ms}ms")]
    Timeout {
        /// Configured deadline in milliseconds.
        ms: u64,
    },

    /// The backend returned a different number of vectors than inputs.
    #[error("backend returned {got} embeddings for {expected} inputs")]
    CountMismatch {
        /// Number of inputs sent.
        expected: usize,
        /// Number of vectors received.
        got: usize,
    },

    /// Vectors of differing length where one dimension is required.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimension of the first vector / the index.
        expected: usize,
        /// Offending dimension.
        got: usize,
    },

    /// `SQLite` error (preserves source chain).
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem error while persisting the index.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Index contents are inconsistent.
    #[error("Storage failed: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),
}

impl EmbeddingError {
    /// Whether the failure came from the embedding backend rather than local storage.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Api { .. } | Self::Timeout { .. } | Self::CountMismatch { .. }
        )
    }
}

/// Result alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn error_display_variants() {
        let cases = vec![
            (
                EmbeddingError::Api {
                    status: 401,
                    message: "bad key".into(),
                },
                "embeddings API error (401): bad key",
            ),
            (
                EmbeddingError::Timeout { ms: 1500 },
                "embedding call timed out after 1500ms",
            ),
            (
                EmbeddingError::CountMismatch {
                    expected: 3,
                    got: 2,
                },
                "backend returned 2 embeddings for 3 inputs",
            ),
            (
                EmbeddingError::DimensionMismatch {
                    expected: 5,
                    got: 4,
                },
                "dimension mismatch: expected 5, got 4",
            ),
            (
                EmbeddingError::Storage("torn index".into()),
                "Storage failed: torn index",
            ),
            (
                EmbeddingError::Config("chunkOverlap".into()),
                "Config error: chunkOverlap",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EmbeddingError>();
    }

    #[test]
    fn backend_classification() {
        assert!(EmbeddingError::Timeout { ms: 1 }.is_backend());
        assert!(
            EmbeddingError::Api {
                status: 500,
                message: String::new()
            }
            .is_backend()
        );
        assert!(!EmbeddingError::Storage("x".into()).is_backend());
        assert!(!EmbeddingError::Sqlite(rusqlite::Error::QueryReturnedNoRows).is_backend());
    }

    #[test]
    fn error_source_chain_preserved() {
        let err: EmbeddingError = rusqlite::Error::QueryReturnedNoRows.into();
        let source = err.source().expect("should have source");
        assert!(source.to_string().contains("Query returned no rows"));
    }
}
