//! # mdrag-chunker
//!
//! Chunking for the mdrag pipeline.
//!
//! [`RecursiveCharacterChunker`] implements [`mdrag_core::Chunker`] with a
//! separator ladder (paragraphs, lines, sentences, words, characters) and
//! overlap between consecutive chunks.

pub mod recursive;

pub use recursive::RecursiveCharacterChunker;
