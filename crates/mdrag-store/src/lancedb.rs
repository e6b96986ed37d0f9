//! `LanceDB` implementation of `VectorStore`.

use arrow_array::{
    Array, ArrayRef, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, Table};
use mdrag_core::{QueryMatch, StoreError, StoredRecord, VectorStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Name of the single collection holding markdown chunks.
pub const COLLECTION: &str = "markdown_docs";

/// LanceDB-based vector store.
///
/// One table, one row per chunk. Upserts are keyed on `id`, so re-ingesting
/// overwrites rows with the same positional id and leaves others untouched.
pub struct LanceStore {
    /// Path to the `LanceDB` database
    db_path: PathBuf,
    /// Embedding dimension
    dimension: usize,
    /// Database connection (lazy initialized)
    connection: RwLock<Option<Connection>>,
    /// Table handle (lazy initialized)
    table: RwLock<Option<Table>>,
}

impl LanceStore {
    /// Create a new `LanceStore`.
    #[must_use]
    pub fn new(db_path: PathBuf, dimension: usize) -> Self {
        Self {
            db_path,
            dimension,
            connection: RwLock::new(None),
            table: RwLock::new(None),
        }
    }

    /// Get the database path.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Get the embedding dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get or create connection.
    async fn get_connection(&self) -> Result<Connection, StoreError> {
        {
            let conn = self.connection.read().await;
            if let Some(ref c) = *conn {
                return Ok(c.clone());
            }
        }

        let mut conn = self.connection.write().await;
        if conn.is_none() {
            let db_path_str = self.db_path.to_string_lossy().to_string();
            let new_conn = connect(&db_path_str)
                .execute()
                .await
                .map_err(|e| StoreError::Init(format!("failed to connect to LanceDB: {e}")))?;
            *conn = Some(new_conn);
        }
        Ok(conn.as_ref().cloned().ok_or_else(|| {
            StoreError::Init("connection unavailable after connect".to_string())
        })?)
    }

    /// Get or open the collection table.
    ///
    /// Fails with [`StoreError::CollectionMissing`] when the table was never
    /// created, so querying a store that has not been ingested into is a
    /// visible error rather than an empty result.
    async fn get_table(&self) -> Result<Table, StoreError> {
        {
            let table = self.table.read().await;
            if let Some(ref t) = *table {
                return Ok(t.clone());
            }
        }

        let conn = self.get_connection().await?;

        let tables = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| StoreError::Init(format!("failed to list tables: {e}")))?;
        if !tables.contains(&COLLECTION.to_string()) {
            return Err(StoreError::CollectionMissing(COLLECTION.to_string()));
        }

        let mut table_lock = self.table.write().await;
        if table_lock.is_none() {
            let t = conn
                .open_table(COLLECTION)
                .execute()
                .await
                .map_err(|e| StoreError::Init(format!("failed to open table: {e}")))?;
            *table_lock = Some(t);
        }

        Ok(table_lock.as_ref().cloned().ok_or_else(|| {
            StoreError::Init("table unavailable after open".to_string())
        })?)
    }

    /// Build the collection schema.
    fn schema(&self) -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.dimension as i32,
                ),
                false,
            ),
            Field::new("text", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, true),
        ])
    }

    /// Convert records to an Arrow `RecordBatch`.
    fn records_to_batch(&self, records: &[StoredRecord]) -> Result<RecordBatch, StoreError> {
        let ids: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
        let texts: Vec<_> = records.iter().map(|r| r.text.clone()).collect();
        let sources: Vec<Option<String>> = records
            .iter()
            .map(|r| r.metadata.get("source").cloned())
            .collect();
        let embeddings: Vec<&[f32]> = records.iter().map(|r| r.embedding.as_slice()).collect();

        let schema = Arc::new(self.schema());
        let vector_array = build_vector_array(&embeddings, self.dimension)?;

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(ids)),
                vector_array,
                Arc::new(StringArray::from(texts)),
                Arc::new(StringArray::from(sources)),
            ],
        )
        .map_err(|e| StoreError::Upsert(format!("failed to create RecordBatch: {e}")))
    }
}

#[async_trait]
impl VectorStore for LanceStore {
    async fn init(&self) -> Result<(), StoreError> {
        info!("Initializing LanceDB at {:?}", self.db_path);

        tokio::fs::create_dir_all(&self.db_path)
            .await
            .map_err(|e| StoreError::Init(format!("failed to create db directory: {e}")))?;

        let conn = self.get_connection().await?;

        let tables = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| StoreError::Init(format!("failed to list tables: {e}")))?;

        if !tables.contains(&COLLECTION.to_string()) {
            info!("Creating collection {COLLECTION}");
            let schema = Arc::new(self.schema());
            conn.create_empty_table(COLLECTION, schema)
                .execute()
                .await
                .map_err(|e| StoreError::Init(format!("failed to create table: {e}")))?;
        }

        info!("LanceDB initialized successfully");
        Ok(())
    }

    async fn upsert(&self, records: &[StoredRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        for record in records {
            if record.embedding.len() != self.dimension {
                return Err(StoreError::Upsert(format!(
                    "embedding dimension {} does not match store dimension {}",
                    record.embedding.len(),
                    self.dimension
                )));
            }
        }

        debug!("Upserting {} records", records.len());

        let table = self.get_table().await?;
        let batch = self.records_to_batch(records)?;
        let schema = batch.schema();
        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);

        // Insert-or-overwrite keyed on id, so positional ids from a
        // re-ingestion replace their previous rows.
        let mut merge = table.merge_insert(&["id"]);
        merge
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge
            .execute(Box::new(batches))
            .await
            .map_err(|e| StoreError::Upsert(format!("failed to merge records: {e}")))?;

        debug!("Successfully upserted {} records", records.len());
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

        debug!("Searching with top_n {top_n}");

        let table = self.get_table().await?;

        let mut results = table
            .vector_search(embedding.to_vec())
            .map_err(|e| StoreError::Query(format!("failed to create search query: {e}")))?
            .limit(top_n)
            .execute()
            .await
            .map_err(|e| StoreError::Query(format!("failed to execute search: {e}")))?;

        let mut matches = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| StoreError::Query(format!("failed to fetch results: {e}")))?
        {
            matches.extend(batch_to_matches(&batch)?);
        }

        debug!("Found {} results", matches.len());
        Ok(matches)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let table = self.get_table().await?;
        let rows = table
            .count_rows(None)
            .await
            .map_err(|e| StoreError::Query(format!("failed to count rows: {e}")))?;
        Ok(rows as u64)
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn build_vector_array(embeddings: &[&[f32]], dim: usize) -> Result<ArrayRef, StoreError> {
    use arrow_array::builder::{FixedSizeListBuilder, Float32Builder};

    let mut builder = FixedSizeListBuilder::new(Float32Builder::new(), dim as i32);

    for embedding in embeddings {
        let values_builder = builder.values();
        for &v in *embedding {
            values_builder.append_value(v);
        }
        builder.append(true);
    }

    Ok(Arc::new(builder.finish()))
}

fn batch_to_matches(batch: &RecordBatch) -> Result<Vec<QueryMatch>, StoreError> {
    let ids = batch
        .column_by_name("id")
        .and_then(|c| c.as_any().downcast_ref::<StringArray>());
    let texts = batch
        .column_by_name("text")
        .and_then(|c| c.as_any().downcast_ref::<StringArray>());
    let distances = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

    let (Some(ids), Some(texts)) = (ids, texts) else {
        return Err(StoreError::Query("missing required columns".to_string()));
    };

    let mut matches = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let distance = distances.map_or(0.0, |d| {
            if d.is_null(i) {
                0.0
            } else {
                d.value(i)
            }
        });
        matches.push(QueryMatch {
            id: ids.value(i).to_string(),
            text: texts.value(i).to_string(),
            distance,
        });
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(id: &str, embedding: Vec<f32>, text: &str) -> StoredRecord {
        StoredRecord::new(id, embedding, text).with_metadata("source", format!("Markdown Chunk {id}"))
    }

    #[tokio::test]
    async fn test_init_creates_collection() {
        let dir = tempdir().unwrap();
        let store = LanceStore::new(dir.path().join("db"), 4);

        store.init().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_query_without_init_fails() {
        let dir = tempdir().unwrap();
        let store = LanceStore::new(dir.path().join("db"), 4);

        let result = store.query(&[0.0; 4], 3).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_upsert_and_query_round_trip() {
        let dir = tempdir().unwrap();
        let store = LanceStore::new(dir.path().join("db"), 4);
        store.init().await.unwrap();

        let records = vec![
            record("0", vec![1.0, 0.0, 0.0, 0.0], "alpha"),
            record("1", vec![0.0, 1.0, 0.0, 0.0], "beta"),
            record("2", vec![0.0, 0.0, 1.0, 0.0], "gamma"),
        ];
        store.upsert(&records).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 3);

        let matches = store.query(&[1.0, 0.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "0");
        assert_eq!(matches[0].text, "alpha");
        assert!(matches[0].distance < 1e-6);
        assert!(matches[0].distance <= matches[1].distance);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_id() {
        let dir = tempdir().unwrap();
        let store = LanceStore::new(dir.path().join("db"), 4);
        store.init().await.unwrap();

        store
            .upsert(&[record("0", vec![1.0, 0.0, 0.0, 0.0], "old text")])
            .await
            .unwrap();
        store
            .upsert(&[record("0", vec![0.0, 1.0, 0.0, 0.0], "new text")])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let matches = store.query(&[0.0, 1.0, 0.0, 0.0], 1).await.unwrap();
        assert_eq!(matches[0].text, "new text");
    }

    #[tokio::test]
    async fn test_upsert_empty_is_noop() {
        let dir = tempdir().unwrap();
        let store = LanceStore::new(dir.path().join("db"), 4);
        store.init().await.unwrap();

        store.upsert(&[]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_rejects_wrong_dimension() {
        let dir = tempdir().unwrap();
        let store = LanceStore::new(dir.path().join("db"), 4);
        store.init().await.unwrap();

        let result = store.upsert(&[record("0", vec![1.0, 0.0], "short")]).await;
        assert!(matches!(result, Err(StoreError::Upsert(_))));
    }

    #[tokio::test]
    async fn test_query_zero_top_n_rejected() {
        let dir = tempdir().unwrap();
        let store = LanceStore::new(dir.path().join("db"), 4);
        store.init().await.unwrap();

        let result = store.query(&[0.0; 4], 0).await;
        assert!(matches!(result, Err(StoreError::Query(_))));
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("db");

        {
            let store = LanceStore::new(db_path.clone(), 4);
            store.init().await.unwrap();
            store
                .upsert(&[record("0", vec![1.0, 0.0, 0.0, 0.0], "persisted")])
                .await
                .unwrap();
        }

        let store = LanceStore::new(db_path, 4);
        assert_eq!(store.count().await.unwrap(), 1);
        let matches = store.query(&[1.0, 0.0, 0.0, 0.0], 1).await.unwrap();
        assert_eq!(matches[0].text, "persisted");
    }
}
