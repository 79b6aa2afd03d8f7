use serde::{Deserialize, Serialize};

/// Retrieval settings: chunking policy, index location, search size.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalSettings {
    /// When false the requirement stage generates without grounding context.
    pub enabled: bool,
    /// Directory holding one index directory per embedding backend.
    pub index_root: String,
    /// Ingest chunk window, in characters.
    pub chunk_size: usize,
    /// Characters shared between neighbouring ingest chunks.
    pub chunk_overlap: usize,
    /// Window used to cut the requirement-stage retrieval query from a document.
    pub document_chunk_size: usize,
    /// Overlap for the document window.
    pub document_chunk_overlap: usize,
    /// Chunks returned per query.
    pub top_k: usize,
    /// Joins retrieved chunks into one context string.
    pub separator: String,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            index_root: "vector_store".to_string(),
            chunk_size: 500,
            chunk_overlap: 50,
            document_chunk_size: 1000,
            document_chunk_overlap: 100,
            top_k: 3,
            separator: "\n---\n".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_chunking_policy() {
        let s = RetrievalSettings::default();
        assert!(s.enabled);
        assert_eq!((s.chunk_size, s.chunk_overlap), (500, 50));
        assert_eq!((s.document_chunk_size, s.document_chunk_overlap), (1000, 100));
        assert_eq!(s.top_k, 3);
        assert_eq!(s.separator, "\n---\n");
    }
}
