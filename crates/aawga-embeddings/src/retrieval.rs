//! Retrieval service: ingest documents into a vector index and answer
//! similarity queries with grounding context.
//!
//! The service owns its embedder and configuration; it keeps no index in
//! memory between calls. Every query reloads the index from disk, so a
//! rebuild by `ingest` (in this process or another) is picked up by the
//! next query.
//!
//! A missing, unreadable, empty or dimension-incompatible index is not an
//! error here. It surfaces as [`Retrieved::Unavailable`], and
//! [`RetrievalService::query`] turns that into the [`UNAVAILABLE`] sentinel
//! so generation can proceed without context. Backend (embedding) failures
//! do propagate.

use std::path::PathBuf;
use std::sync::Arc;

use aawga_settings::BackendKind;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{RetrievalConfig, index_dir_for};
use crate::errors::Result;
use crate::service::EmbeddingService;
use crate::vector_index::{IndexMeta, ScoredChunk, VectorIndex, source_digest};

/// Context returned when no usable index exists.
pub const UNAVAILABLE: &str = "벡터 인덱스가 존재하지 않습니다. 먼저 ingest를 실행하세요.";

/// Outcome of an ingest.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Backend that embedded the chunks.
    pub provider: BackendKind,
    /// Directory the index was written to.
    pub index_dir: PathBuf,
    /// Number of chunks indexed.
    pub chunk_count: usize,
    /// Vector dimension (0 for an empty index).
    pub dimensions: usize,
    /// SHA-256 of the ingested text.
    pub source_digest: String,
}

/// Result of a similarity search.
#[derive(Clone, Debug, PartialEq)]
pub enum Retrieved {
    /// No usable index; `reason` says why.
    Unavailable {
        /// Human-readable cause.
        reason: String,
    },
    /// Nearest chunks, nearest first.
    Chunks(Vec<ScoredChunk>),
}

/// State of one index directory.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStatus {
    /// Backend the directory belongs to.
    pub provider: BackendKind,
    /// Index directory.
    pub index_dir: PathBuf,
    /// Whether an index file is present.
    pub exists: bool,
    /// Stored metadata, when readable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<IndexMeta>,
    /// Why the metadata could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Chunk, embed, persist and search.
pub struct RetrievalService {
    embedder: Arc<dyn EmbeddingService>,
    config: RetrievalConfig,
    index_lock: RwLock<()>,
}

impl RetrievalService {
    /// Create a service over `embedder`.
    pub fn new(embedder: Arc<dyn EmbeddingService>, config: RetrievalConfig) -> Self {
        Self {
            embedder,
            config,
            index_lock: RwLock::new(()),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Backend kind of the embedder.
    pub fn provider(&self) -> BackendKind {
        self.embedder.kind()
    }

    /// Index directory for this service's embedder.
    pub fn index_dir(&self) -> PathBuf {
        self.config.index_dir(self.embedder.kind())
    }

    /// Rebuild the index from `text`.
    ///
    /// The previous index is replaced wholesale; there is no incremental
    /// update.
    #[instrument(skip_all, fields(provider = %self.embedder.kind(), chars = text.chars().count()))]
    pub async fn ingest(&self, text: &str) -> Result<IngestReport> {
        let chunks = self.config.chunking.split(text);
        debug!(chunks = chunks.len(), "document chunked");

        let embeddings = self.embedder.embed_many(&chunks).await?;
        let index =
            VectorIndex::build(self.embedder.kind(), chunks, embeddings, source_digest(text))?;

        let dir = self.index_dir();
        {
            let _guard = self.index_lock.write();
            let _ = index.save(&dir)?;
        }

        let meta = index.meta();
        info!(
            index_dir = %dir.display(),
            chars = text.chars().count(),
            chunks = meta.chunk_count,
            dimensions = meta.dimensions,
            "index rebuilt"
        );
        Ok(IngestReport {
            provider: meta.provider,
            index_dir: dir,
            chunk_count: meta.chunk_count,
            dimensions: meta.dimensions,
            source_digest: meta.source_digest.clone(),
        })
    }

    /// The `k` chunks nearest to `text`.
    #[instrument(skip_all, fields(provider = %self.embedder.kind(), k = k))]
    pub async fn search(&self, text: &str, k: usize) -> Result<Retrieved> {
        let dir = self.index_dir();
        let index = match self.load_usable(&dir) {
            Ok(index) => index,
            Err(reason) => {
                warn!(index_dir = %dir.display(), %reason, "retrieval unavailable");
                return Ok(Retrieved::Unavailable { reason });
            }
        };

        let query = self.embedder.embed_one(text).await?;
        match index.search(&query, k.max(1)) {
            Ok(hits) => {
                debug!(hits = hits.len(), "retrieved chunks");
                Ok(Retrieved::Chunks(hits))
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(index_dir = %dir.display(), %reason, "retrieval unavailable");
                Ok(Retrieved::Unavailable { reason })
            }
        }
    }

    /// Grounding context for `text`: the `k` nearest chunks joined by the
    /// configured separator, or [`UNAVAILABLE`].
    pub async fn query(&self, text: &str, k: usize) -> Result<String> {
        Ok(match self.search(text, k).await? {
            Retrieved::Unavailable { .. } => UNAVAILABLE.to_string(),
            Retrieved::Chunks(hits) => hits
                .into_iter()
                .map(|hit| hit.text)
                .collect::<Vec<_>>()
                .join(&self.config.separator),
        })
    }

    /// Status of this service's index.
    pub fn status(&self) -> IndexStatus {
        self.status_for(self.embedder.kind())
    }

    /// Status of the index belonging to `kind` under the same root.
    pub fn status_for(&self, kind: BackendKind) -> IndexStatus {
        let _guard = self.index_lock.read();
        index_status(&self.config.index_root, kind)
    }

    fn load_usable(&self, dir: &std::path::Path) -> std::result::Result<VectorIndex, String> {
        let index = {
            let _guard = self.index_lock.read();
            if !VectorIndex::exists(dir) {
                return Err("no index has been built".to_string());
            }
            VectorIndex::load(dir).map_err(|e| format!("index unreadable: {e}"))?
        };

        if index.is_empty() {
            return Err("index holds no chunks".to_string());
        }
        if let Some(expected) = self.embedder.dimensions() {
            if expected != index.meta().dimensions {
                return Err(format!(
                    "index dimension {} does not match embedder dimension {expected}",
                    index.meta().dimensions
                ));
            }
        }
        Ok(index)
    }
}

/// Status of the `kind` index under `root`, without a service.
pub fn index_status(root: &std::path::Path, kind: BackendKind) -> IndexStatus {
    let index_dir = index_dir_for(root, kind);
    let exists = VectorIndex::exists(&index_dir);
    let (meta, error) = if exists {
        match VectorIndex::read_meta(&index_dir) {
            Ok(meta) => (Some(meta), None),
            Err(e) => (None, Some(e.to_string())),
        }
    } else {
        (None, None)
    };
    IndexStatus {
        provider: kind,
        index_dir,
        exists,
        meta,
        error,
    }
}
