//! Component traits for the mdrag pipeline.
//!
//! Each pipeline stage is defined by a trait so implementations can be
//! swapped without changing the driver:
//!
//! - [`DocumentExtractor`]: read a file and strip its markup
//! - [`Chunker`]: split plain text into overlapping chunks
//! - [`Embedder`]: turn chunks into vectors
//! - [`VectorStore`]: persist vectors and answer similarity queries

use async_trait::async_trait;
use std::path::Path;

use crate::error::{ChunkError, EmbedError, ExtractError, StoreError};
use crate::types::{ChunkConfig, Document, QueryMatch, StoredRecord};

// ============================================================================
// Extraction
// ============================================================================

/// Trait for turning files into plain-text documents.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// File extensions this extractor handles (lowercase, without the dot).
    fn supported_extensions(&self) -> &[&str];

    /// Check whether this extractor handles the given file.
    fn can_extract(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.supported_extensions().contains(&ext.as_str())
            })
    }

    /// Extract plain text from a file.
    async fn extract(&self, path: &Path) -> Result<Document, ExtractError>;
}

// ============================================================================
// Chunking
// ============================================================================

/// Trait for splitting documents into chunks.
#[async_trait]
pub trait Chunker: Send + Sync {
    /// Name of this chunking strategy.
    fn name(&self) -> &str;

    /// Split each text into chunks of at most `config.chunk_size` characters.
    ///
    /// Texts are processed independently and in order; the returned list is
    /// the concatenation of each text's chunks. Empty chunks are never
    /// returned.
    async fn chunk(
        &self,
        texts: &[String],
        config: &ChunkConfig,
    ) -> Result<Vec<String>, ChunkError>;
}

// ============================================================================
// Embedding
// ============================================================================

/// Trait for generating embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model name/identifier.
    fn model_name(&self) -> &str;

    /// Embedding dimension.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts.
    ///
    /// Returns one vector per input, in input order, each of [`dimension`]
    /// length. Equal inputs produce equal outputs for the same instance.
    ///
    /// [`dimension`]: Embedder::dimension
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Embed a single query string.
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbedError> {
        let results = self.embed(&[query]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Inference("empty embedding result".to_string()))
    }
}

// ============================================================================
// Vector Storage
// ============================================================================

/// Trait for vector storage and similarity search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Open or create the backing collection.
    async fn init(&self) -> Result<(), StoreError>;

    /// Insert records, overwriting any existing record with the same id.
    ///
    /// An empty slice is a no-op.
    async fn upsert(&self, records: &[StoredRecord]) -> Result<(), StoreError>;

    /// Return up to `top_n` records nearest to `embedding`, ascending by
    /// distance.
    ///
    /// Fails with [`StoreError::CollectionMissing`] when the collection was
    /// never created.
    async fn query(&self, embedding: &[f32], top_n: usize)
        -> Result<Vec<QueryMatch>, StoreError>;

    /// Number of records currently stored.
    async fn count(&self) -> Result<u64, StoreError>;
}
