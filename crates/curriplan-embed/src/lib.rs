//! Sentence encoders for the curriculum corpus.
//!
//! `CandleEmbedder` runs a BERT-family sentence-transformer (all-MiniLM-L6-v2
//! by default) on candle with masked mean pooling and L2 normalisation.
//! `FakeEmbedder` hashes whitespace tokens into a fixed-size vector and is
//! used by tests and offline dry runs.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use curriplan_core::config::{EmbeddingBackend, EmbeddingSettings};
use curriplan_core::traits::Embedder;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

mod device;
mod pool;
mod tokenize;

pub use device::select_device;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_batch;

pub struct CandleEmbedder {
    id: String,
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    pad_id: u32,
}

impl CandleEmbedder {
    /// Loads `tokenizer.json`, `config.json` and the weights
    /// (`model.safetensors` or `pytorch_model.bin`) from `model_dir`.
    pub fn load(model_dir: &Path, model_name: &str, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading sentence encoder");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let pad_id = tokenizer.get_padding().map_or(0, |p| p.pad_id);

        let config_path = model_dir.join("config.json");
        let raw: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?,
        )
        .with_context(|| format!("parsing {}", config_path.display()))?;
        let dim = raw
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| anyhow!("{} has no hidden_size", config_path.display()))? as usize;
        let config: BertConfig = serde_json::from_value(raw)
            .with_context(|| format!("parsing {}", config_path.display()))?;

        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config)?;
        info!(dim, "sentence encoder ready");

        let fingerprint = model_fingerprint(model_dir)?;
        Ok(Self {
            id: encoder_id(model_name, dim, &fingerprint),
            model,
            tokenizer,
            device,
            dim,
            max_len,
            pad_id,
        })
    }
}

/// Pinned id of a candle encoder. The fingerprint ties it to the model
/// files, not just the configured name.
pub fn encoder_id(model_name: &str, dim: usize, fingerprint: &str) -> String {
    format!("candle-bert:{}:d{}:{}", model_name, dim, fingerprint)
}

/// Short blake3 digest over `config.json`, `tokenizer.json` and the weights
/// file. Changes whenever any of them does.
pub fn model_fingerprint(model_dir: &Path) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    for path in [model_dir.join("config.json"), model_dir.join("tokenizer.json"), weights_path(model_dir)?] {
        let mut file = File::open(&path).with_context(|| format!("reading {}", path.display()))?;
        io::copy(&mut file, &mut hasher).with_context(|| format!("hashing {}", path.display()))?;
    }
    let hex = hasher.finalize().to_hex();
    Ok(hex.as_str()[..16].to_string())
}

fn weights_path(model_dir: &Path) -> Result<PathBuf> {
    ["model.safetensors", "pytorch_model.bin"]
        .iter()
        .map(|name| model_dir.join(name))
        .find(|p| p.is_file())
        .ok_or_else(|| anyhow!("no model.safetensors or pytorch_model.bin in {}", model_dir.display()))
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let path = weights_path(model_dir)?;
    if path.extension().and_then(|e| e.to_str()) == Some("safetensors") {
        return candle_core::safetensors::load(&path, device)
            .with_context(|| format!("reading {}", path.display()));
    }
    let weights = candle_core::pickle::read_all(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(weights.into_iter().collect())
}

impl Embedder for CandleEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let start = Instant::now();
        let (input_ids, attention_mask) =
            tokenize_batch(&self.tokenizer, texts, self.max_len, self.pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        if vectors.iter().any(|v| v.len() != self.dim) {
            return Err(anyhow!("encoder produced vectors of unexpected width"));
        }
        let elapsed = start.elapsed().as_millis();
        if elapsed > 1000 {
            warn!(batch = texts.len(), elapsed_ms = elapsed as u64, "slow embedding batch");
        } else {
            debug!(batch = texts.len(), elapsed_ms = elapsed as u64, "embedded batch");
        }
        Ok(vectors)
    }
}

/// Deterministic token-hash encoder. Same text, same vector; not semantic.
pub struct FakeEmbedder {
    id: String,
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { id: format!("fake-xxhash64:d{}", dim), dim }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;

        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Builds the encoder selected by `settings.backend`.
pub fn load_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    match settings.backend {
        EmbeddingBackend::Fake => {
            info!(dim = settings.fake_dim, "using fake encoder");
            Ok(Box::new(FakeEmbedder::new(settings.fake_dim)))
        }
        EmbeddingBackend::Candle => {
            let dir = resolve_model_dir(&settings.model_dir)?;
            Ok(Box::new(CandleEmbedder::load(&dir, &settings.model_name, settings.max_len)?))
        }
    }
}

fn resolve_model_dir(configured: &str) -> Result<PathBuf> {
    let dir = curriplan_core::config::expand_path(configured);
    if dir.is_dir() {
        return Ok(dir);
    }
    Err(anyhow!(
        "model directory {} not found; download the sentence-transformer there or set APP_EMBEDDING__MODEL_DIR",
        dir.display()
    ))
}
