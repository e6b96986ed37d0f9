//! Query execution.

use mdrag_core::{Embedder, Error, QueryMatch, Result, VectorStore};
use std::sync::Arc;
use tracing::debug;

/// Query executor.
///
/// Embeds the query text with the same model that embedded the chunks and
/// ranks stored records by ascending distance.
pub struct QueryExecutor {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl QueryExecutor {
    /// Create a new query executor.
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Execute a similarity query, returning up to `top_n` matches.
    pub async fn execute(&self, text: &str, top_n: usize) -> Result<Vec<QueryMatch>> {
        debug!("Executing query: {text}");

        let embedding = self
            .embedder
            .embed_query(text)
            .await
            .map_err(Error::Embedding)?;

        let matches = self
            .store
            .query(&embedding, top_n)
            .await
            .map_err(Error::Store)?;

        debug!("Found {} results", matches.len());
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mdrag_core::{EmbedError, StoredRecord};
    use mdrag_store::MemoryStore;

    // Maps known words onto fixed unit vectors so distances are predictable.
    struct WordEmbedder;

    #[async_trait]
    impl Embedder for WordEmbedder {
        fn model_name(&self) -> &str {
            "word-mock"
        }

        fn dimension(&self) -> usize {
            3
        }

        async fn embed(&self, texts: &[&str]) -> std::result::Result<Vec<Vec<f32>>, EmbedError> {
            texts
                .iter()
                .map(|text| match *text {
                    "apple" => Ok(vec![1.0, 0.0, 0.0]),
                    "banana" => Ok(vec![0.0, 1.0, 0.0]),
                    "cherry" => Ok(vec![0.0, 0.0, 1.0]),
                    other => Err(EmbedError::Inference(format!("unknown word: {other}"))),
                })
                .collect()
        }
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new(3));
        store.init().await.unwrap();
        store
            .upsert(&[
                StoredRecord::new("0", vec![1.0, 0.0, 0.0], "apple text"),
                StoredRecord::new("1", vec![0.0, 1.0, 0.0], "banana text"),
                StoredRecord::new("2", vec![0.0, 0.0, 1.0], "cherry text"),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_execute_returns_nearest_first() {
        let store = seeded_store().await;
        let executor = QueryExecutor::new(store, Arc::new(WordEmbedder));

        let matches = executor.execute("banana", 3).await.unwrap();

        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].text, "banana text");
        assert!(matches[0].distance < 1e-6);
        assert!(matches[0].distance <= matches[1].distance);
        assert!(matches[1].distance <= matches[2].distance);
    }

    #[tokio::test]
    async fn test_execute_truncates_to_top_n() {
        let store = seeded_store().await;
        let executor = QueryExecutor::new(store, Arc::new(WordEmbedder));

        let matches = executor.execute("apple", 1).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "0");
    }

    #[tokio::test]
    async fn test_execute_surfaces_embed_errors() {
        let store = seeded_store().await;
        let executor = QueryExecutor::new(store, Arc::new(WordEmbedder));

        let result = executor.execute("durian", 3).await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[tokio::test]
    async fn test_execute_against_uninitialized_store_fails() {
        let store = Arc::new(MemoryStore::new(3));
        let executor = QueryExecutor::new(store, Arc::new(WordEmbedder));

        let result = executor.execute("apple", 3).await;
        assert!(matches!(result, Err(Error::Store(_))));
    }
}
