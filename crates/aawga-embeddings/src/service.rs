//! Embedding service trait and the constant stub implementation.

use async_trait::async_trait;
use aawga_settings::BackendKind;

use crate::errors::{EmbeddingError, Result};

/// Dimension of the stub embedder's vectors.
pub const STUB_DIMENSIONS: usize = 5;

/// Component value of every stub vector.
pub const STUB_COMPONENT: f32 = 0.1;

/// Maps text to fixed-length vectors.
///
/// The backend that built an index must also embed the queries against it.
/// [`crate::retrieval::RetrievalService`] enforces this structurally by
/// keying the index directory on [`EmbeddingService::kind`].
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text (default: calls `embed_many` with one item).
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_many(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or(EmbeddingError::CountMismatch {
                expected: 1,
                got: 0,
            })
    }

    /// Which backend this is; selects the index location.
    fn kind(&self) -> BackendKind;

    /// Output dimensions, when known before the first call.
    fn dimensions(&self) -> Option<usize>;
}

/// Deterministic embedder returning `[0.1; 5]` for every input.
///
/// All chunks embed identically, so ranking against a stub index is
/// degenerate; it exists to exercise ingest, persistence and lookup
/// without a network.
#[derive(Clone, Copy, Debug, Default)]
pub struct StubEmbeddingService;

impl StubEmbeddingService {
    /// Create the stub embedder.
    pub fn new() -> Self {
        Self
    }

    fn constant_vector() -> Vec<f32> {
        vec![STUB_COMPONENT; STUB_DIMENSIONS]
    }
}

#[async_trait]
impl EmbeddingService for StubEmbeddingService {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| Self::constant_vector()).collect())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Stub
    }

    fn dimensions(&self) -> Option<usize> {
        Some(STUB_DIMENSIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_single_is_constant_vector() {
        let svc = StubEmbeddingService::new();
        let v = svc.embed_one("anything").await.unwrap();
        assert_eq!(v, vec![0.1_f32; 5]);
    }

    #[tokio::test]
    async fn stub_batch_one_vector_per_input() {
        let svc = StubEmbeddingService::new();
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let results = svc.embed_many(&texts).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.len() == STUB_DIMENSIONS));
    }

    #[tokio::test]
    async fn stub_empty_batch() {
        let svc = StubEmbeddingService::new();
        assert!(svc.embed_many(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn stub_reports_kind_and_dims() {
        let svc = StubEmbeddingService::new();
        assert_eq!(svc.kind(), BackendKind::Stub);
        assert_eq!(svc.dimensions(), Some(5));
    }
}
