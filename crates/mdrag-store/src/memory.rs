//! In-memory store for testing without `LanceDB`.
//!
//! [`MemoryStore`] keeps records in a `HashMap` and ranks query results by
//! brute-force squared euclidean distance. Useful for unit tests and
//! development builds that do not need persistence.

use async_trait::async_trait;
use mdrag_core::{QueryMatch, StoreError, StoredRecord, VectorStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory vector store for testing.
///
/// Mirrors the trait semantics of the persistent store: querying before
/// [`init`](VectorStore::init) fails with [`StoreError::CollectionMissing`],
/// and upserting an existing id overwrites the previous record.
pub struct MemoryStore {
    dimension: usize,
    records: Arc<RwLock<HashMap<String, StoredRecord>>>,
    initialized: Arc<RwLock<bool>>,
}

impl MemoryStore {
    /// Create a new in-memory store with the given embedding dimension.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            records: Arc::new(RwLock::new(HashMap::new())),
            initialized: Arc::new(RwLock::new(false)),
        }
    }

    /// Ids of all stored records, unordered.
    pub async fn ids(&self) -> Vec<String> {
        let records = self.records.read().await;
        records.keys().cloned().collect()
    }

    /// Squared euclidean distance between two vectors.
    fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn init(&self) -> Result<(), StoreError> {
        let mut initialized = self.initialized.write().await;
        *initialized = true;
        debug!("MemoryStore initialized (dimension: {})", self.dimension);
        Ok(())
    }

    async fn upsert(&self, records: &[StoredRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut store = self.records.write().await;
        for record in records {
            if record.embedding.len() != self.dimension {
                return Err(StoreError::Upsert(format!(
                    "embedding dimension {} does not match store dimension {}",
                    record.embedding.len(),
                    self.dimension
                )));
            }
            store.insert(record.id.clone(), record.clone());
        }
        debug!("Upserted {} records", records.len());
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_n: usize,
    ) -> Result<Vec<QueryMatch>, StoreError> {
        if top_n == 0 {
            return Err(StoreError::Query("top_n must be positive".to_string()));
        }

        {
            let initialized = self.initialized.read().await;
            if !*initialized {
                return Err(StoreError::CollectionMissing("memory".to_string()));
            }
        }

        let records = self.records.read().await;
        let mut scored: Vec<(f32, &StoredRecord)> = records
            .values()
            .map(|record| (Self::squared_l2(embedding, &record.embedding), record))
            .collect();

        // Ascending: smaller distance is a better match
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(top_n)
            .map(|(distance, record)| QueryMatch {
                id: record.id.clone(),
                text: record.text.clone(),
                distance,
            })
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let records = self.records.read().await;
        Ok(records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, embedding: Vec<f32>, text: &str) -> StoredRecord {
        StoredRecord::new(id, embedding, text)
    }

    #[tokio::test]
    async fn test_upsert_and_count() {
        let store = MemoryStore::new(3);
        store.init().await.unwrap();

        let records = vec![
            record("0", vec![1.0, 0.0, 0.0], "first"),
            record("1", vec![0.0, 1.0, 0.0], "second"),
        ];
        store.upsert(&records).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing_id() {
        let store = MemoryStore::new(3);
        store.init().await.unwrap();

        store
            .upsert(&[record("0", vec![1.0, 0.0, 0.0], "old")])
            .await
            .unwrap();
        store
            .upsert(&[record("0", vec![0.0, 1.0, 0.0], "new")])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let matches = store.query(&[0.0, 1.0, 0.0], 1).await.unwrap();
        assert_eq!(matches[0].text, "new");
    }

    #[tokio::test]
    async fn test_upsert_empty_is_noop() {
        let store = MemoryStore::new(3);
        store.init().await.unwrap();
        store.upsert(&[]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_rejects_wrong_dimension() {
        let store = MemoryStore::new(3);
        store.init().await.unwrap();

        let result = store.upsert(&[record("0", vec![1.0, 0.0], "short")]).await;
        assert!(matches!(result, Err(StoreError::Upsert(_))));
    }

    #[tokio::test]
    async fn test_query_orders_by_ascending_distance() {
        let store = MemoryStore::new(3);
        store.init().await.unwrap();

        let records = vec![
            record("0", vec![1.0, 0.0, 0.0], "exact"),
            record("1", vec![0.0, 1.0, 0.0], "far"),
            record("2", vec![0.9, 0.1, 0.0], "near"),
        ];
        store.upsert(&records).await.unwrap();

        let matches = store.query(&[1.0, 0.0, 0.0], 3).await.unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].id, "0");
        assert_eq!(matches[1].id, "2");
        assert_eq!(matches[2].id, "1");
        assert!(matches[0].distance <= matches[1].distance);
        assert!(matches[1].distance <= matches[2].distance);
        assert!(matches[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_query_truncates_to_top_n() {
        let store = MemoryStore::new(2);
        store.init().await.unwrap();

        let records: Vec<_> = (0..5)
            .map(|i| record(&i.to_string(), vec![i as f32, 0.0], &format!("chunk {i}")))
            .collect();
        store.upsert(&records).await.unwrap();

        let matches = store.query(&[0.0, 0.0], 3).await.unwrap();
        assert_eq!(matches.len(), 3);
    }

    #[tokio::test]
    async fn test_query_fewer_records_than_top_n() {
        let store = MemoryStore::new(2);
        store.init().await.unwrap();
        store
            .upsert(&[record("0", vec![1.0, 0.0], "only")])
            .await
            .unwrap();

        let matches = store.query(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[tokio::test]
    async fn test_query_before_init_fails() {
        let store = MemoryStore::new(3);
        let result = store.query(&[1.0, 0.0, 0.0], 3).await;
        assert!(matches!(result, Err(StoreError::CollectionMissing(_))));
    }

    #[tokio::test]
    async fn test_query_zero_top_n_rejected() {
        let store = MemoryStore::new(3);
        store.init().await.unwrap();
        let result = store.query(&[1.0, 0.0, 0.0], 0).await;
        assert!(matches!(result, Err(StoreError::Query(_))));
    }

    #[test]
    fn test_squared_l2() {
        assert_eq!(MemoryStore::squared_l2(&[1.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(MemoryStore::squared_l2(&[1.0, 0.0], &[0.0, 0.0]), 1.0);
        assert_eq!(MemoryStore::squared_l2(&[3.0, 0.0], &[0.0, 4.0]), 25.0);
    }
}
