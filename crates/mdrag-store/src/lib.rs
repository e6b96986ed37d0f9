//! # mdrag-store
//!
//! Vector storage for the mdrag pipeline.
//!
//! [`LanceStore`] persists chunk embeddings in a local `LanceDB` table and
//! answers nearest-neighbor queries. [`MemoryStore`] provides the same trait
//! semantics in memory for tests.

pub mod lancedb;
pub mod memory;

pub use lancedb::{LanceStore, COLLECTION};
pub use memory::MemoryStore;
