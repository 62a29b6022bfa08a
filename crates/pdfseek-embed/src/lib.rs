//! Embedding providers.
//!
//! [`SentenceEmbedder`] runs a BERT-family sentence encoder with candle and
//! returns mean-pooled, L2-normalized vectors. [`HashEmbedder`] is a
//! deterministic stand-in used when `embedding.use_fake` or
//! `APP_USE_FAKE_EMBEDDINGS=1` is set.

use anyhow::{anyhow, Result};
use std::hash::Hasher;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use twox_hash::XxHash64;

use pdfseek_core::config::{expand_path, EmbeddingConfig};
use pdfseek_core::traits::Embedder;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use pool::masked_mean_l2;

pub struct SentenceEmbedder { model: BertModel, tokenizer: Tokenizer, device: Device, dim: usize, max_len: usize, pad_id: u32 }

impl SentenceEmbedder {
    /// Load `config.json`, `tokenizer.json` and weights (`model.safetensors`,
    /// else `pytorch_model.bin`) from `model_dir`.
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = device::select_device();
        tracing::info!(model_dir = %model_dir.display(), "loading sentence encoder");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)
            .map_err(|e| anyhow!("Failed to parse {}: {}", config_path.display(), e))?;
        let vb = load_weights(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        let max_len = max_len.min(config.max_position_embeddings);
        tracing::info!(dim = config.hidden_size, max_len, "sentence encoder ready");
        Ok(Self { model, tokenizer, device, dim: config.hidden_size, max_len, pad_id: config.pad_token_id as u32 })
    }
}

/// Weights from `model.safetensors` when present, else `pytorch_model.bin`.
pub fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        let bytes = std::fs::read(&safetensors)?;
        return VarBuilder::from_buffered_safetensors(bytes, DType::F32, device)
            .map_err(|e| anyhow!("Failed to read {}: {}", safetensors.display(), e));
    }
    let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?;
    let weights_map: std::collections::HashMap<String, candle_core::Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, DType::F32, device))
}

impl Embedder for SentenceEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize::tokenize_batch(&self.tokenizer, texts, self.max_len, self.pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let rows: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        tracing::debug!(texts = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(rows)
    }
}

/// Feature-hashing embedder: every lower-cased token adds a signed unit to one
/// bucket, and the result is L2-normalized. Texts sharing words get positive
/// similarity, disjoint texts are (almost always) orthogonal.
pub struct HashEmbedder { dim: usize }

impl HashEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(token.to_lowercase().as_bytes());
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        v
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn max_len(&self) -> usize { usize::MAX }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Build the configured provider. When the primary model cannot be loaded and
/// `fallback_model_dir` is set, the fallback model is loaded instead.
pub fn get_default_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    if config.use_fake || env_flag("APP_USE_FAKE_EMBEDDINGS") {
        tracing::info!(dim = config.fake_dim, "using HashEmbedder");
        return Ok(Box::new(HashEmbedder::new(config.fake_dim)));
    }
    let primary = resolve_model_dir(config.model_dir.as_deref()).and_then(|dir| SentenceEmbedder::load(&dir, config.max_len));
    match (primary, config.fallback_model_dir.as_deref()) {
        (Ok(model), _) => Ok(Box::new(model)),
        (Err(e), Some(fallback)) => {
            tracing::warn!(error = %e, fallback, "primary embedding model unavailable, loading fallback");
            Ok(Box::new(SentenceEmbedder::load(&expand_path(fallback), config.max_len)?))
        }
        (Err(e), None) => Err(e),
    }
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() { return Ok(p); }
        return Err(anyhow!("Configured model directory {} does not exist", p.display()));
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) { let p = expand_path(&dir); if p.exists() { tracing::info!(var, dir = %p.display(), "model dir from environment"); return Ok(p); } }
    }
    for candidate in ["../models/all-MiniLM-L6-v2", "models/all-MiniLM-L6-v2"] {
        let p = Path::new(candidate); if p.exists() { return Ok(p.to_path_buf()); }
    }
    Err(anyhow!("Could not locate a sentence encoder model directory"))
}
