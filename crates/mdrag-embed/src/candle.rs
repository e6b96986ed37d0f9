//! MiniLM sentence embedder using Candle.
//!
//! Runs sentence-transformers/all-MiniLM-L6-v2 locally:
//! - 384 dimensions
//! - 256 max tokens
//! - BERT architecture with mean pooling and L2 normalization

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::api::tokio::ApiBuilder;
use hf_hub::{Repo, RepoType};
use mdrag_core::{EmbedError, Embedder};
use std::path::PathBuf;
use std::sync::Arc;
use tokenizers::Tokenizer;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Model identifier on HuggingFace Hub.
const MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Embedding dimension for all-MiniLM-L6-v2.
const EMBEDDING_DIM: usize = 384;

/// Maximum sequence length.
const MAX_TOKENS: usize = 256;

/// Number of texts encoded per forward pass.
const BATCH_SIZE: usize = 32;

struct ModelState {
    model: BertModel,
    tokenizer: Tokenizer,
}

/// MiniLM embedder using Candle.
///
/// The model is loaded once via [`init`](CandleEmbedder::init) and reused
/// for every batch afterwards. Dropping the embedder releases the weights.
pub struct CandleEmbedder {
    /// Device to run inference on (CPU or CUDA)
    device: Device,
    /// Loaded model and tokenizer, populated by `init`
    state: Arc<RwLock<Option<ModelState>>>,
    /// Cache directory for downloaded model files
    cache_dir: PathBuf,
}

impl CandleEmbedder {
    /// Create a new embedder. No weights are loaded until [`init`].
    ///
    /// [`init`]: CandleEmbedder::init
    pub fn new(cache_dir: PathBuf) -> Self {
        // Try CUDA first, fall back to CPU
        let device = Device::cuda_if_available(0).unwrap_or(Device::Cpu);
        info!("CandleEmbedder using device: {:?}", device);

        Self {
            device,
            state: Arc::new(RwLock::new(None)),
            cache_dir,
        }
    }

    /// Create with a specific device.
    pub fn with_device(cache_dir: PathBuf, device: Device) -> Self {
        Self {
            device,
            state: Arc::new(RwLock::new(None)),
            cache_dir,
        }
    }

    /// Initialize the model (download if needed, load into memory).
    ///
    /// Idempotent. Callers that want model-load failures surfaced before
    /// any document work should call this up front.
    pub async fn init(&self) -> Result<(), EmbedError> {
        {
            let state = self.state.read().await;
            if state.is_some() {
                return Ok(());
            }
        }

        info!("Initializing CandleEmbedder with model: {}", MODEL_ID);

        let api = ApiBuilder::new()
            .with_cache_dir(self.cache_dir.clone())
            .build()
            .map_err(|e| EmbedError::ModelLoad(format!("failed to create HF API: {e}")))?;

        let repo = api.repo(Repo::new(MODEL_ID.to_string(), RepoType::Model));

        debug!("Downloading tokenizer...");
        let tokenizer_path = repo
            .get("tokenizer.json")
            .await
            .map_err(|e| EmbedError::ModelLoad(format!("failed to download tokenizer: {e}")))?;

        debug!("Downloading config...");
        let config_path = repo
            .get("config.json")
            .await
            .map_err(|e| EmbedError::ModelLoad(format!("failed to download config: {e}")))?;

        debug!("Downloading model weights...");
        let weights_path = repo
            .get("model.safetensors")
            .await
            .map_err(|e| EmbedError::ModelLoad(format!("failed to download weights: {e}")))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbedError::ModelLoad(format!("failed to load tokenizer: {e}")))?;

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| EmbedError::ModelLoad(format!("failed to read config: {e}")))?;
        let config: Config = serde_json::from_str(&config_str)
            .map_err(|e| EmbedError::ModelLoad(format!("failed to parse config: {e}")))?;

        // SAFETY: The safetensors file is downloaded from HuggingFace Hub
        // and only mapped for read access.
        #[allow(unsafe_code)]
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &self.device)
                .map_err(|e| EmbedError::ModelLoad(format!("failed to load weights: {e}")))?
        };

        let model = BertModel::load(vb, &config)
            .map_err(|e| EmbedError::ModelLoad(format!("failed to create BERT model: {e}")))?;

        let mut state = self.state.write().await;
        *state = Some(ModelState { model, tokenizer });

        info!("CandleEmbedder initialized successfully");
        Ok(())
    }

    /// Mean pooling with attention mask.
    fn mean_pooling(
        &self,
        token_embeddings: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor, EmbedError> {
        let mask = attention_mask
            .unsqueeze(2)
            .map_err(|e| EmbedError::Inference(format!("unsqueeze failed: {e}")))?
            .broadcast_as(token_embeddings.shape())
            .map_err(|e| EmbedError::Inference(format!("broadcast failed: {e}")))?
            .to_dtype(DType::F32)
            .map_err(|e| EmbedError::Inference(format!("dtype conversion failed: {e}")))?;

        let masked = token_embeddings
            .mul(&mask)
            .map_err(|e| EmbedError::Inference(format!("mul failed: {e}")))?;

        let sum = masked
            .sum(1)
            .map_err(|e| EmbedError::Inference(format!("sum failed: {e}")))?;

        let mask_sum = mask
            .sum(1)
            .map_err(|e| EmbedError::Inference(format!("mask sum failed: {e}")))?
            .clamp(1e-9, f64::MAX)
            .map_err(|e| EmbedError::Inference(format!("clamp failed: {e}")))?;

        sum.div(&mask_sum)
            .map_err(|e| EmbedError::Inference(format!("div failed: {e}")))
    }

    /// L2 normalize embeddings.
    fn normalize(&self, embeddings: &Tensor) -> Result<Tensor, EmbedError> {
        let norm = embeddings
            .sqr()
            .map_err(|e| EmbedError::Inference(format!("sqr failed: {e}")))?
            .sum_keepdim(1)
            .map_err(|e| EmbedError::Inference(format!("sum_keepdim failed: {e}")))?
            .sqrt()
            .map_err(|e| EmbedError::Inference(format!("sqrt failed: {e}")))?
            .clamp(1e-12, f64::MAX)
            .map_err(|e| EmbedError::Inference(format!("clamp failed: {e}")))?;

        embeddings
            .broadcast_div(&norm)
            .map_err(|e| EmbedError::Inference(format!("div failed: {e}")))
    }

    /// Encode one batch of texts.
    async fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.init().await?;

        let state = self.state.read().await;
        let state = state
            .as_ref()
            .ok_or_else(|| EmbedError::Inference("model not loaded".to_string()))?;

        let encodings = state
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbedError::Inference(format!("tokenization failed: {e}")))?;

        // Pad to the longest sequence, capped at the model limit
        let max_len = encodings.iter().map(|e| e.len()).max().unwrap_or(0);
        let max_len = max_len.min(MAX_TOKENS);

        let mut input_ids_vec: Vec<u32> = Vec::new();
        let mut attention_mask_vec: Vec<u32> = Vec::new();
        let mut token_type_ids_vec: Vec<u32> = Vec::new();

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let len = ids.len().min(max_len);

            for i in 0..max_len {
                if i < len {
                    input_ids_vec.push(ids[i]);
                    attention_mask_vec.push(1);
                } else {
                    input_ids_vec.push(0); // PAD token
                    attention_mask_vec.push(0);
                }
                token_type_ids_vec.push(0);
            }
        }

        let batch_size = texts.len();

        let input_ids = Tensor::from_vec(input_ids_vec, (batch_size, max_len), &self.device)
            .map_err(|e| EmbedError::Inference(format!("failed to create input_ids tensor: {e}")))?;

        let attention_mask =
            Tensor::from_vec(attention_mask_vec, (batch_size, max_len), &self.device).map_err(
                |e| EmbedError::Inference(format!("failed to create attention_mask tensor: {e}")),
            )?;

        let token_type_ids =
            Tensor::from_vec(token_type_ids_vec, (batch_size, max_len), &self.device).map_err(
                |e| EmbedError::Inference(format!("failed to create token_type_ids tensor: {e}")),
            )?;

        let output = state
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| EmbedError::Inference(format!("model forward failed: {e}")))?;

        let pooled = self.mean_pooling(&output, &attention_mask)?;
        let normalized = self.normalize(&pooled)?;

        let mut results = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let embedding = normalized
                .get(i)
                .map_err(|e| EmbedError::Inference(format!("failed to get embedding {i}: {e}")))?
                .to_vec1::<f32>()
                .map_err(|e| EmbedError::Inference(format!("failed to convert to vec: {e}")))?;
            results.push(embedding);
        }

        Ok(results)
    }
}

#[async_trait]
impl Embedder for CandleEmbedder {
    fn model_name(&self) -> &str {
        MODEL_ID
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Embedding {} texts with batch_size {}", texts.len(), BATCH_SIZE);

        let mut all_results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            let batch_results = self.encode_batch(batch).await?;
            all_results.extend(batch_results);
        }

        Ok(all_results)
    }
}
