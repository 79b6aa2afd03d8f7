//! # aawga-embeddings
//!
//! Retrieval for grounding requirement generation:
//!
//! - [`chunking`]: recursive character splitter with fixed window/overlap policies
//! - [`service`] / [`http_service`]: embedding backends (constant stub, OpenAI-compatible)
//! - [`vector_index`]: `SQLite`-backed index with brute-force L2 search
//! - [`retrieval`]: ingest and query, with graceful degradation when no index exists
//!
//! Stub and live backends write to separate index directories, so an index
//! is only ever queried with the kind of embedder that built it.

#![deny(unsafe_code)]

pub mod chunking;
pub mod config;
pub mod distance;
pub mod errors;
pub mod http_service;
pub mod retrieval;
pub mod service;
pub mod vector_index;

pub use chunking::ChunkingConfig;
pub use config::{RetrievalConfig, index_dir_for};
pub use errors::{EmbeddingError, Result};
pub use http_service::{HttpEmbeddingConfig, HttpEmbeddingService};
pub use retrieval::{IndexStatus, IngestReport, RetrievalService, Retrieved, UNAVAILABLE, index_status};
pub use service::{EmbeddingService, StubEmbeddingService};
pub use vector_index::{IndexMeta, ScoredChunk, VectorIndex};
