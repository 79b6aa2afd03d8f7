//! Recursive character chunking.
//!
//! Text is split on the coarsest separator present (`"\n\n"`, then `"\n"`,
//! then `" "`, then individual characters). Pieces that still exceed the
//! window are split again with the next separator. Small pieces are then
//! merged back into windows of at most `chunk_size` characters, carrying up
//! to `chunk_overlap` characters from the tail of one window into the next.
//!
//! Sizes count Unicode scalar values, not bytes. Every produced chunk is a
//! contiguous, trimmed substring of the input; whitespace-only chunks are
//! dropped.

use std::collections::VecDeque;

use aawga_settings::RetrievalSettings;
use serde::{Deserialize, Serialize};

use crate::errors::{EmbeddingError, Result};

/// Separators tried in order, coarsest first. `""` splits into characters.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Window/overlap policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkingConfig {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl ChunkingConfig {
    /// Policy for retrieval ingestion: 500-character windows, 50 overlap.
    pub const RETRIEVAL: Self = Self {
        chunk_size: 500,
        chunk_overlap: 50,
    };

    /// Policy for cutting whole documents into sections: 1000/100.
    pub const DOCUMENT: Self = Self {
        chunk_size: 1000,
        chunk_overlap: 100,
    };

    /// Create a policy. `chunk_overlap` must be smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(EmbeddingError::Config("chunk size must be at least 1".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(EmbeddingError::Config(format!(
                "chunk overlap ({chunk_overlap}) must be smaller than chunk size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Ingest policy from settings.
    pub fn retrieval_from_settings(s: &RetrievalSettings) -> Result<Self> {
        Self::new(s.chunk_size, s.chunk_overlap)
    }

    /// Document-section policy from settings.
    pub fn document_from_settings(s: &RetrievalSettings) -> Result<Self> {
        Self::new(s.document_chunk_size, s.document_chunk_overlap)
    }

    /// Maximum characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters carried between neighbouring chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    /// First chunk of `text`, or `None` when it is blank.
    pub fn first_chunk(&self, text: &str) -> Option<String> {
        self.split(text).into_iter().next()
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, rest) = pick_separator(text, separators);

        let mut chunks = Vec::new();
        let mut small: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }
            if rest.is_empty() {
                push_trimmed(&mut chunks, piece);
            } else {
                chunks.extend(self.split_recursive(piece, rest));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }
        chunks
    }

    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_trimmed(&mut chunks, &window.iter().copied().collect::<String>());
                while total > self.chunk_overlap
                    || (total + len > self.chunk_size && total > 0)
                {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }
            window.push_back(piece);
            total += len;
        }

        push_trimmed(&mut chunks, &window.iter().copied().collect::<String>());
        chunks
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self::RETRIEVAL
    }
}

fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() || text.contains(sep) {
            return (*sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Split so that concatenating the pieces reproduces `text` exactly.
fn split_keeping_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        text.char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect()
    } else {
        text.split_inclusive(separator).collect()
    }
}

fn push_trimmed(chunks: &mut Vec<String>, candidate: &str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
