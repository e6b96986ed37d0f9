//! # mdrag-extract
//!
//! Markdown text extraction for the mdrag pipeline.
//!
//! [`MarkdownExtractor`] implements [`mdrag_core::DocumentExtractor`] by
//! parsing CommonMark and keeping only the visible text content.

pub mod markdown;

pub use markdown::MarkdownExtractor;
