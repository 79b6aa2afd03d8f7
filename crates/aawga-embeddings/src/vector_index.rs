//! On-disk vector index: `SQLite` BLOB storage with brute-force L2 search.
//!
//! An index lives in its own directory as a single `index.sqlite` file with
//! two tables:
//!
//! - `chunks(position, text, embedding)`: one row per chunk, embeddings as
//!   little-endian `f32` BLOBs
//! - `meta(key, value)`: provider kind, dimensions, chunk count, source
//!   digest and creation time
//!
//! Indexes are immutable once written. [`VectorIndex::save`] writes a fresh
//! database to a temporary file in the target directory and renames it over
//! `index.sqlite`, so a concurrent reader opens either the old file or the
//! new one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use aawga_settings::BackendKind;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags, params};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::distance::squared_l2;
use crate::errors::{EmbeddingError, Result};

/// File name of the index database inside an index directory.
pub const INDEX_FILE: &str = "index.sqlite";

/// Convert an f32 slice to a byte blob for storage.
pub fn f32_slice_to_blob(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a byte blob back to an f32 vector.
pub fn blob_to_f32_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Hex SHA-256 of the ingested source text.
pub fn source_digest(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Descriptive metadata stored alongside the chunks.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMeta {
    /// Embedding backend that produced the vectors.
    pub provider: BackendKind,
    /// Length of every stored vector.
    pub dimensions: usize,
    /// Number of stored chunks.
    pub chunk_count: usize,
    /// SHA-256 of the source text.
    pub source_digest: String,
    /// When the index was built.
    pub created_at: DateTime<Utc>,
}

/// A search hit.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredChunk {
    /// Position of the chunk in the source document.
    pub position: usize,
    /// Chunk text.
    pub text: String,
    /// Squared L2 distance to the query (smaller is nearer).
    pub distance: f32,
}

#[derive(Clone, Debug)]
struct IndexedChunk {
    text: String,
    embedding: Vec<f32>,
}

/// In-memory vector index.
#[derive(Clone, Debug)]
pub struct VectorIndex {
    meta: IndexMeta,
    chunks: Vec<IndexedChunk>,
}

impl VectorIndex {
    /// Pair chunks with their embeddings.
    ///
    /// All embeddings must share one dimension and there must be exactly one
    /// per chunk.
    pub fn build(
        provider: BackendKind,
        chunks: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        source_digest: String,
    ) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: chunks.len(),
                got: embeddings.len(),
            });
        }
        let dimensions = embeddings.first().map_or(0, Vec::len);
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimensions,
                got: bad.len(),
            });
        }

        let chunks: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| IndexedChunk { text, embedding })
            .collect();

        Ok(Self {
            meta: IndexMeta {
                provider,
                dimensions,
                chunk_count: chunks.len(),
                source_digest,
                created_at: Utc::now(),
            },
            chunks,
        })
    }

    /// Index metadata.
    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Path of the index database inside `dir`.
    pub fn file_path(dir: &Path) -> PathBuf {
        dir.join(INDEX_FILE)
    }

    /// Whether `dir` contains an index file.
    pub fn exists(dir: &Path) -> bool {
        Self::file_path(dir).is_file()
    }

    /// Persist into `dir`, replacing any previous index atomically.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let staging = NamedTempFile::new_in(dir)?;
        {
            let mut conn = Connection::open(staging.path())?;
            self.write_to(&mut conn)?;
            conn.close().map_err(|(_, e)| EmbeddingError::Sqlite(e))?;
        }
        let target = Self::file_path(dir);
        let _ = staging
            .persist(&target)
            .map_err(|e| EmbeddingError::Io(e.error))?;
        Ok(target)
    }

    fn write_to(&self, conn: &mut Connection) -> Result<()> {
        let tx = conn.transaction()?;
        tx.execute_batch(
            "CREATE TABLE chunks (
                position INTEGER PRIMARY KEY,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL
            );
            CREATE TABLE meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        {
            let mut insert =
                tx.prepare("INSERT INTO chunks (position, text, embedding) VALUES (?1, ?2, ?3)")?;
            for (position, chunk) in self.chunks.iter().enumerate() {
                let position = i64::try_from(position)
                    .map_err(|_| EmbeddingError::Storage("chunk position overflow".into()))?;
                let _ = insert.execute(params![
                    position,
                    chunk.text,
                    f32_slice_to_blob(&chunk.embedding)
                ])?;
            }

            let mut meta = tx.prepare("INSERT INTO meta (key, value) VALUES (?1, ?2)")?;
            for (key, value) in [
                ("provider", self.meta.provider.as_str().to_string()),
                ("dimensions", self.meta.dimensions.to_string()),
                ("chunk_count", self.meta.chunk_count.to_string()),
                ("source_digest", self.meta.source_digest.clone()),
                ("created_at", self.meta.created_at.to_rfc3339()),
            ] {
                let _ = meta.execute(params![key, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Load the index stored in `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let conn = open_read_only(dir)?;
        let meta = read_meta_from(&conn)?;

        let mut stmt = conn.prepare("SELECT text, embedding FROM chunks ORDER BY position")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut chunks = Vec::with_capacity(meta.chunk_count);
        for row in rows {
            let (text, blob) = row?;
            let embedding = blob_to_f32_vec(&blob);
            if embedding.len() != meta.dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: meta.dimensions,
                    got: embedding.len(),
                });
            }
            chunks.push(IndexedChunk { text, embedding });
        }

        if chunks.len() != meta.chunk_count {
            return Err(EmbeddingError::Storage(format!(
                "index declares {} chunks but holds {}",
                meta.chunk_count,
                chunks.len()
            )));
        }
        Ok(Self { meta, chunks })
    }

    /// Read only the metadata of the index in `dir`.
    pub fn read_meta(dir: &Path) -> Result<IndexMeta> {
        let conn = open_read_only(dir)?;
        read_meta_from(&conn)
    }

    /// The `k` chunks nearest to `query`, nearest first.
    ///
    /// Ties keep chunk order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if !self.is_empty() && query.len() != self.meta.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.meta.dimensions,
                got: query.len(),
            });
        }

        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .enumerate()
            .filter_map(|(position, chunk)| {
                squared_l2(query, &chunk.embedding).map(|distance| ScoredChunk {
                    position,
                    text: chunk.text.clone(),
                    distance,
                })
            })
            .collect();

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);
        Ok(scored)
    }
}

fn open_read_only(dir: &Path) -> Result<Connection> {
    let path = VectorIndex::file_path(dir);
    if !path.is_file() {
        return Err(EmbeddingError::Storage(format!(
            "no index at {}",
            path.display()
        )));
    }
    Ok(Connection::open_with_flags(
        &path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?)
}

fn read_meta_from(conn: &Connection) -> Result<IndexMeta> {
    let mut stmt = conn.prepare("SELECT key, value FROM meta")?;
    let values: HashMap<String, String> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;

    let get = |key: &str| {
        values
            .get(key)
            .ok_or_else(|| EmbeddingError::Storage(format!("index metadata missing `{key}`")))
    };
    let parse_count = |key: &str| -> Result<usize> {
        get(key)?
            .parse()
            .map_err(|_| EmbeddingError::Storage(format!("index metadata `{key}` is not a number")))
    };

    let provider = BackendKind::parse(get("provider")?)
        .ok_or_else(|| EmbeddingError::Storage("unknown provider in index metadata".into()))?;
    let created_at = DateTime::parse_from_rfc3339(get("created_at")?)
        .map_err(|e| EmbeddingError::Storage(format!("bad created_at: {e}")))?
        .with_timezone(&Utc);

    Ok(IndexMeta {
        provider,
        dimensions: parse_count("dimensions")?,
        chunk_count: parse_count("chunk_count")?,
        source_digest: get("source_digest")?.clone(),
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn sample() -> VectorIndex {
        VectorIndex::build(
            BackendKind::Live,
            texts(&["alpha", "beta", "gamma"]),
            vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![5.0, 5.0]],
            source_digest("alpha beta gamma"),
        )
        .unwrap()
    }

    #[test]
    fn blob_roundtrip_preserves_values() {
        let v = vec![0.1_f32, -2.5, 3.0e-7];
        assert_eq!(blob_to_f32_vec(&f32_slice_to_blob(&v)), v);
    }

    #[test]
    fn digest_is_hex_sha256() {
        let d = source_digest("");
        assert_eq!(
            d,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn build_rejects_count_mismatch() {
        let err = VectorIndex::build(
            BackendKind::Stub,
            texts(&["a", "b"]),
            vec![vec![0.1]],
            String::new(),
        )
        .unwrap_err();
        assert_matches!(err, EmbeddingError::CountMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn build_rejects_ragged_dimensions() {
        let err = VectorIndex::build(
            BackendKind::Stub,
            texts(&["a", "b"]),
            vec![vec![0.1, 0.2], vec![0.1]],
            String::new(),
        )
        .unwrap_err();
        assert_matches!(err, EmbeddingError::DimensionMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn search_is_nearest_first() {
        let index = sample();
        let hits = index.search(&[0.9, 0.0], 2).unwrap();
        let found: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(found, vec!["beta", "alpha"]);
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[test]
    fn search_ties_keep_chunk_order() {
        let index = VectorIndex::build(
            BackendKind::Stub,
            texts(&["first", "second", "third", "fourth"]),
            vec![vec![0.1; 5]; 4],
            String::new(),
        )
        .unwrap();
        let hits = index.search(&[0.1; 5], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn search_rejects_wrong_query_dimension() {
        let err = sample().search(&[1.0, 2.0, 3.0], 3).unwrap_err();
        assert_matches!(err, EmbeddingError::DimensionMismatch { expected: 2, got: 3 });
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let index = sample();
        let path = index.save(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(INDEX_FILE));
        assert!(VectorIndex::exists(dir.path()));

        let loaded = VectorIndex::load(dir.path()).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.meta().provider, BackendKind::Live);
        assert_eq!(loaded.meta().dimensions, 2);
        assert_eq!(loaded.meta().source_digest, index.meta().source_digest);
        let hits = loaded.search(&[5.0, 5.0], 1).unwrap();
        assert_eq!(hits[0].text, "gamma");
    }

    #[test]
    fn save_replaces_previous_index() {
        let dir = tempfile::tempdir().unwrap();
        sample().save(dir.path()).unwrap();

        let smaller = VectorIndex::build(
            BackendKind::Live,
            texts(&["only"]),
            vec![vec![1.0, 1.0]],
            source_digest("only"),
        )
        .unwrap();
        smaller.save(dir.path()).unwrap();

        let meta = VectorIndex::read_meta(dir.path()).unwrap();
        assert_eq!(meta.chunk_count, 1);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_name() != INDEX_FILE)
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn load_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!VectorIndex::exists(&dir.path().join("absent")));
        assert!(VectorIndex::load(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn load_garbage_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), b"definitely not sqlite").unwrap();
        assert!(VectorIndex::load(dir.path()).is_err());
        assert!(VectorIndex::read_meta(dir.path()).is_err());
    }

    #[test]
    fn empty_index_saves_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let empty =
            VectorIndex::build(BackendKind::Stub, Vec::new(), Vec::new(), source_digest(""))
                .unwrap();
        empty.save(dir.path()).unwrap();
        let loaded = VectorIndex::load(dir.path()).unwrap();
        assert!(loaded.is_empty());
        assert!(loaded.search(&[0.1; 5], 3).unwrap().is_empty());
    }
}
