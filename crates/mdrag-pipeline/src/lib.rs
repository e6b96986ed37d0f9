//! # mdrag-pipeline
//!
//! Ingestion driver and query executor for the mdrag pipeline.
//!
//! [`IngestPipeline`] runs the batch flow (walk, extract, chunk, embed,
//! store); [`QueryExecutor`] answers similarity queries against the same
//! store. [`walker::markdown_files`] does the deterministic directory walk.

pub mod ingest;
pub mod query;
pub mod walker;

pub use ingest::IngestPipeline;
pub use query::QueryExecutor;
pub use walker::markdown_files;
