// Local sentence embeddings via Candle (BERT-family models from the HF hub)
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use crate::errors::{Result, SupportError};
use crate::knowledge::Embedder;

/// Default sentence-embedding model
pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Longest token sequence fed to the model
const MAX_SEQUENCE_LENGTH: usize = 256;

fn embedding_err(context: &str) -> impl Fn(candle_core::Error) -> SupportError + '_ {
    move |e| SupportError::Embedding(format!("{}: {}", context, e))
}

/// Embedding engine running a BERT sentence encoder on the CPU
pub struct EmbeddingEngine {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimension: usize,
    normalize: bool,
}

impl EmbeddingEngine {
    /// Load the default model
    pub fn new() -> Result<Self> {
        Self::load(DEFAULT_MODEL_ID, true)
    }

    /// Download (first use only) and load a model from the HuggingFace hub
    pub fn load(model_id: &str, normalize: bool) -> Result<Self> {
        info!(model = model_id, "loading embedding model");
        let device = Device::Cpu;

        let api = Api::new().map_err(|e| {
            SupportError::Embedding(format!("Failed to create HuggingFace API client: {}", e))
        })?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let fetch = |file: &str| {
            repo.get(file).map_err(|e| {
                SupportError::Embedding(format!("Failed to download {} for {}: {}", file, model_id, e))
            })
        };
        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let config_contents = std::fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_contents)?;
        let dimension = serde_json::from_str::<serde_json::Value>(&config_contents)?
            .get("hidden_size")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .ok_or_else(|| SupportError::Embedding("model config has no hidden_size".to_string()))?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| SupportError::Embedding(format!("Failed to load tokenizer: {}", e)))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| SupportError::Embedding(format!("Failed to configure tokenizer: {}", e)))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .map_err(embedding_err("Failed to load model weights"))?
        };
        let model = BertModel::load(vb, &config).map_err(embedding_err("Failed to create BERT model"))?;

        Ok(Self {
            model,
            tokenizer,
            device,
            dimension,
            normalize,
        })
    }

    fn forward(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| SupportError::Embedding(format!("Tokenization failed: {}", e)))?;

        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        let batch_size = texts.len();

        // Right-pad every sequence to the longest one
        let mut flat_ids = vec![0u32; batch_size * max_len];
        let mut flat_mask = vec![0u32; batch_size * max_len];
        for (row, encoding) in encodings.iter().enumerate() {
            let offset = row * max_len;
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            flat_ids[offset..offset + ids.len()].copy_from_slice(ids);
            flat_mask[offset..offset + mask.len()].copy_from_slice(mask);
        }

        let tensor_err = embedding_err("Tensor operation failed");
        let token_ids =
            Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device).map_err(&tensor_err)?;
        let attention_mask =
            Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device).map_err(&tensor_err)?;
        let token_type_ids = token_ids.zeros_like().map_err(&tensor_err)?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))
            .map_err(embedding_err("Model forward pass failed"))?;

        let mut pooled = Self::mean_pool(&hidden, &attention_mask).map_err(&tensor_err)?;
        if self.normalize {
            pooled = Self::l2_normalize(&pooled).map_err(&tensor_err)?;
        }

        pooled.to_vec2::<f32>().map_err(&tensor_err)
    }

    /// Mean pooling with attention mask
    fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .expand(embeddings.shape())?
            .to_dtype(embeddings.dtype())?;

        let sum_embeddings = (embeddings * &mask_expanded)?.sum(1)?;
        let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;

        sum_embeddings.broadcast_div(&sum_mask)
    }

    fn l2_normalize(pooled: &Tensor) -> candle_core::Result<Tensor> {
        let norms = pooled.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
        pooled.broadcast_div(&norms)
    }
}

impl Embedder for EmbeddingEngine {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.forward(texts)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
