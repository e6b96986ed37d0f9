//! # mdrag-core
//!
//! Core types and traits for the mdrag pipeline.
//!
//! The pipeline turns a folder of Markdown files into searchable vector
//! embeddings:
//!
//! ```text
//! File -> DocumentExtractor -> Chunker -> Embedder -> VectorStore
//!                                                        |
//!                                        query text -> QueryMatch
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Document`] | Plain text extracted from a file |
//! | [`ChunkConfig`] | Chunk size and overlap settings |
//! | [`StoredRecord`] | A chunk with its embedding and metadata |
//! | [`QueryMatch`] | A search hit with its distance |
//! | [`IngestReport`] | Summary of an ingestion run |
//!
//! ## Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`DocumentExtractor`] | Strip markup from source files |
//! | [`Chunker`] | Split text into overlapping chunks |
//! | [`Embedder`] | Generate vector embeddings |
//! | [`VectorStore`] | Persist and search embeddings |
//!
//! ## Related Crates
//!
//! - `mdrag-extract`: Markdown text extraction
//! - `mdrag-chunker`: Recursive character chunking
//! - `mdrag-embed`: Embedding generation with Candle
//! - `mdrag-store`: `LanceDB` vector storage
//! - `mdrag-pipeline`: Ingestion driver and query executor

pub mod error;
pub mod traits;
pub mod types;

pub use error::{ChunkError, EmbedError, Error, ExtractError, Result, StoreError};
pub use traits::*;
pub use types::*;
