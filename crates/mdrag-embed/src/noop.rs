//! No-op embedder for testing without Candle.

use async_trait::async_trait;
use mdrag_core::{EmbedError, Embedder};

/// No-op embedder that returns zero-vectors.
///
/// Always available, even without the `candle` feature. Returns
/// 384-dimensional zero-vectors for all inputs, which is enough for wiring
/// tests and development builds with faster compilation.
pub struct NoopEmbedder {
    dimension: usize,
}

impl NoopEmbedder {
    /// Create a new no-op embedder with default dimension (384).
    #[must_use]
    pub fn new() -> Self {
        Self { dimension: 384 }
    }

    /// Create a new no-op embedder with custom dimension.
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for NoopEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for NoopEmbedder {
    fn model_name(&self) -> &str {
        "noop"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|_| vec![0.0; self.dimension]).collect())
    }
}
