//! Core data types for the mdrag pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ChunkError;

// ============================================================================
// Documents
// ============================================================================

/// A document after markup has been stripped away.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Path the document was read from.
    pub path: PathBuf,
    /// Plain text content with markup removed.
    pub text: String,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

// ============================================================================
// Chunking
// ============================================================================

/// Configuration for splitting text into chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Number of characters carried over between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Validate the configuration before any splitting happens.
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.chunk_size == 0 {
            return Err(ChunkError::InvalidConfig(
                "chunk_size must be > 0".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ChunkError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Storage
// ============================================================================

/// A chunk with its embedding, ready to be persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredRecord {
    /// Identifier, unique within the collection. Writing an existing id
    /// overwrites the previous record.
    pub id: String,
    /// Embedding vector, fixed dimension per store.
    pub embedding: Vec<f32>,
    /// The chunk text.
    pub text: String,
    /// Free-form metadata attached to the chunk.
    pub metadata: HashMap<String, String>,
}

impl StoredRecord {
    pub fn new(id: impl Into<String>, embedding: Vec<f32>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            embedding,
            text: text.into(),
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A search hit returned by a vector store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryMatch {
    /// Id of the matching record.
    pub id: String,
    /// Text of the matching chunk.
    pub text: String,
    /// Distance to the query vector. Lower means more similar.
    pub distance: f32,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Summary of one ingestion run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of documents extracted.
    pub documents: usize,
    /// Number of chunks embedded and stored.
    pub chunks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== ChunkConfig Tests ==========

    #[test]
    fn test_chunk_config_default() {
        let config = ChunkConfig::default();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_chunk_config_zero_size_invalid() {
        let config = ChunkConfig::new(0, 0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn test_chunk_config_overlap_equal_to_size_invalid() {
        let config = ChunkConfig::new(100, 100);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_chunk_config_overlap_larger_than_size_invalid() {
        let config = ChunkConfig::new(100, 150);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_chunk_config_serialization() {
        let config = ChunkConfig::new(256, 32);
        let json = serde_json::to_string(&config).unwrap();
        let back: ChunkConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    // ========== Document Tests ==========

    #[test]
    fn test_document_new() {
        let doc = Document::new("/tmp/notes.md", "Hello world");
        assert_eq!(doc.path, PathBuf::from("/tmp/notes.md"));
        assert_eq!(doc.text, "Hello world");
    }

    // ========== StoredRecord Tests ==========

    #[test]
    fn test_stored_record_new() {
        let record = StoredRecord::new("0", vec![0.1, 0.2], "chunk text");
        assert_eq!(record.id, "0");
        assert_eq!(record.embedding, vec![0.1, 0.2]);
        assert_eq!(record.text, "chunk text");
        assert!(record.metadata.is_empty());
    }

    #[test]
    fn test_stored_record_with_metadata() {
        let record = StoredRecord::new("3", vec![0.0; 4], "text")
            .with_metadata("source", "Markdown Chunk 3");
        assert_eq!(
            record.metadata.get("source").map(String::as_str),
            Some("Markdown Chunk 3")
        );
    }

    #[test]
    fn test_stored_record_serialization() {
        let record =
            StoredRecord::new("1", vec![1.0, 0.0], "alpha").with_metadata("source", "test");
        let json = serde_json::to_string(&record).unwrap();
        let back: StoredRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }

    // ========== QueryMatch Tests ==========

    #[test]
    fn test_query_match_serialization() {
        let m = QueryMatch {
            id: "2".to_string(),
            text: "matched text".to_string(),
            distance: 0.25,
        };
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("matched text"));
        let back: QueryMatch = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }

    // ========== IngestReport Tests ==========

    #[test]
    fn test_ingest_report_default() {
        let report = IngestReport::default();
        assert_eq!(report.documents, 0);
        assert_eq!(report.chunks, 0);
    }
}
