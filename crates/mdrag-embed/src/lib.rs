//! # mdrag-embed
//!
//! Embedding generation for the mdrag pipeline.
//!
//! ## Implementations
//!
//! | Embedder | Feature | Description |
//! |----------|---------|-------------|
//! | [`CandleEmbedder`] | `candle` (default) | all-MiniLM-L6-v2 via Candle |
//! | [`NoopEmbedder`] | always | Zero-vectors for tests |
//!
//! Disable default features to build without the ML stack:
//!
//! ```toml
//! mdrag-embed = { version = "0.1", default-features = false }
//! ```

#[cfg(feature = "candle")]
pub mod candle;
pub mod noop;

#[cfg(feature = "candle")]
pub use candle::CandleEmbedder;
pub use noop::NoopEmbedder;
