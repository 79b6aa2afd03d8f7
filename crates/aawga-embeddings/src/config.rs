//! Retrieval configuration.

use std::path::{Path, PathBuf};

use aawga_settings::{BackendKind, RetrievalSettings};

use crate::chunking::ChunkingConfig;
use crate::errors::Result;

/// Explicit configuration for [`crate::retrieval::RetrievalService`].
#[derive(Clone, Debug)]
pub struct RetrievalConfig {
    /// Directory holding one index directory per embedding backend.
    pub index_root: PathBuf,
    /// Chunking policy used at ingest.
    pub chunking: ChunkingConfig,
    /// Default number of chunks returned by a query.
    pub top_k: usize,
    /// Joins retrieved chunks into one context string.
    pub separator: String,
}

impl RetrievalConfig {
    /// Build from settings, validating the chunking policy.
    pub fn from_settings(s: &RetrievalSettings) -> Result<Self> {
        Ok(Self {
            index_root: PathBuf::from(&s.index_root),
            chunking: ChunkingConfig::retrieval_from_settings(s)?,
            top_k: s.top_k.max(1),
            separator: s.separator.clone(),
        })
    }

    /// Default policy rooted at `index_root`.
    pub fn with_root(index_root: impl Into<PathBuf>) -> Self {
        Self {
            index_root: index_root.into(),
            chunking: ChunkingConfig::RETRIEVAL,
            top_k: 3,
            separator: "\n---\n".to_string(),
        }
    }

    /// Index directory for the given embedding backend.
    pub fn index_dir(&self, kind: BackendKind) -> PathBuf {
        index_dir_for(&self.index_root, kind)
    }
}

/// `{root}/index_{kind}`: stub and live indexes never share a directory.
pub fn index_dir_for(root: &Path, kind: BackendKind) -> PathBuf {
    root.join(format!("index_{}", kind.as_str()))
}
