//! Ingestion driver.
//!
//! Runs the batch flow end to end: walk the document root, extract plain
//! text, chunk, embed, and upsert into the vector store. Stages run
//! sequentially and any failure aborts the run.

use mdrag_core::{
    ChunkConfig, Chunker, DocumentExtractor, Embedder, Error, IngestReport, Result, StoredRecord,
    VectorStore,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::walker::markdown_files;

/// Batch ingestion pipeline.
///
/// All collaborators are injected, so tests can swap in mock embedders and
/// in-memory stores without touching the flow.
pub struct IngestPipeline {
    extractor: Arc<dyn DocumentExtractor>,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    config: ChunkConfig,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline.
    pub fn new(
        extractor: Arc<dyn DocumentExtractor>,
        chunker: Arc<dyn Chunker>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        config: ChunkConfig,
    ) -> Self {
        Self {
            extractor,
            chunker,
            embedder,
            store,
            config,
        }
    }

    /// Ingest every Markdown file under `root`.
    ///
    /// Records are written with positional ids `"0"` through `"N-1"` over
    /// the concatenated chunk sequence, so a re-run over the same tree
    /// overwrites the same ids. An empty root ingests cleanly.
    pub async fn run(&self, root: &Path) -> Result<IngestReport> {
        info!("Ingesting markdown from {}", root.display());

        let files = markdown_files(root)?;

        let mut texts = Vec::with_capacity(files.len());
        for file in &files {
            let document = self.extractor.extract(file).await?;
            debug!(path = %document.path.display(), "extracted document");
            texts.push(document.text);
        }

        let chunks = self.chunker.chunk(&texts, &self.config).await?;

        let chunk_refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed(&chunk_refs).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::Other(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let records: Vec<StoredRecord> = chunks
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (text, embedding))| {
                StoredRecord::new(i.to_string(), embedding, text.clone())
                    .with_metadata("source", format!("Markdown Chunk {i}"))
            })
            .collect();

        self.store.init().await?;
        self.store.upsert(&records).await?;

        let report = IngestReport {
            documents: files.len(),
            chunks: records.len(),
        };
        info!(
            documents = report.documents,
            chunks = report.chunks,
            "ingestion complete"
        );
        Ok(report)
    }
}
