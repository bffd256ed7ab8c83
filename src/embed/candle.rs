use std::{path::PathBuf, sync::Arc};

use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::{Repo, RepoType, api::sync::Api};
use parking_lot::RwLock;
use tokenizers::Tokenizer;

use crate::{
   config::{EMBED_MODEL, MAX_SEQ_LEN, debug_embed, debug_models},
   embed::{Embedder, Embedding},
   error::{Error, Result},
};

/// BERT embedder with lazily loaded weights.
///
/// Inputs are truncated to [`MAX_SEQ_LEN`] tokens, the encoder output is
/// mean-pooled over the token axis and L2-normalized. Padding added for
/// batched inference is excluded from pooling, so batch and single-text
/// paths produce identical vectors.
pub struct CandleEmbedder {
   model:  Arc<RwLock<Option<ModelState>>>,
   device: Device,
}

struct ModelState {
   bert:      BertModel,
   tokenizer: Tokenizer,
}

impl CandleEmbedder {
   pub fn new() -> Result<Self> {
      let device = Device::cuda_if_available(0).unwrap_or(Device::Cpu);

      Ok(Self { model: Arc::new(RwLock::new(None)), device })
   }

   fn ensure_model_loaded(&self) -> Result<()> {
      if self.model.read().is_some() {
         return Ok(());
      }

      let mut guard = self.model.write();
      if guard.is_some() {
         return Ok(());
      }

      let (bert, tokenizer) = Self::load_model(&self.device)?;
      *guard = Some(ModelState { bert, tokenizer });
      Ok(())
   }

   fn load_model(device: &Device) -> Result<(BertModel, Tokenizer)> {
      let model_path = Self::download_model()?;

      if debug_models() {
         tracing::info!("loading model from {:?}, device: {:?}", model_path, device);
      }

      let tokenizer = Tokenizer::from_file(model_path.join("tokenizer.json"))
         .map_err(|e| Error::Embedding(format!("failed to load tokenizer: {}", e)))?;

      let config_path = model_path.join("config.json");
      let config: BertConfig = serde_json::from_str(
         &std::fs::read_to_string(&config_path)
            .map_err(|e| Error::Embedding(format!("failed to read config: {}", e)))?,
      )
      .map_err(|e| Error::Embedding(format!("failed to parse config: {}", e)))?;

      let weights_path = model_path.join("model.safetensors");
      let vb = unsafe {
         VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, device)
            .map_err(|e| Error::Embedding(format!("failed to load weights: {}", e)))?
      };

      let bert = BertModel::load(vb, &config)
         .map_err(|e| Error::Embedding(format!("failed to load model: {}", e)))?;

      if debug_models() {
         tracing::info!("model loaded successfully");
      }

      Ok((bert, tokenizer))
   }

   fn download_model() -> Result<PathBuf> {
      let cache_dir = crate::config::model_dir();
      std::fs::create_dir_all(&cache_dir)
         .map_err(|e| Error::Embedding(format!("failed to create model cache: {}", e)))?;

      let api = Api::new()
         .map_err(|e| Error::Embedding(format!("failed to initialize hf_hub API: {}", e)))?;

      let repo = api.repo(Repo::new(EMBED_MODEL.to_string(), RepoType::Model));

      let model_files = ["config.json", "tokenizer.json", "model.safetensors"];
      let mut paths = Vec::new();

      for filename in &model_files {
         let path = repo.get(filename).map_err(|e| {
            Error::Embedding(format!(
               "failed to download {}: {}. Run 'rankbench setup' to download the model.",
               filename, e
            ))
         })?;
         paths.push(path);
      }

      paths[0]
         .parent()
         .ok_or_else(|| Error::Embedding("invalid model path".to_string()))
         .map(|p| p.to_path_buf())
   }

   fn tokenize(&self, text: &str) -> Result<(Vec<u32>, Vec<u32>)> {
      let model_state = self.model.read();
      let state = model_state
         .as_ref()
         .ok_or_else(|| Error::Embedding("model not loaded".to_string()))?;

      Self::tokenize_with(state, text)
   }

   fn tokenize_with(state: &ModelState, text: &str) -> Result<(Vec<u32>, Vec<u32>)> {
      let encoding = state
         .tokenizer
         .encode(text, true)
         .map_err(|e| Error::Embedding(format!("tokenization failed: {}", e)))?;

      let mut token_ids = encoding.get_ids().to_vec();
      let mut attention_mask = vec![1u32; token_ids.len()];

      // over-length input is silently truncated, never an error
      if token_ids.len() > MAX_SEQ_LEN {
         token_ids.truncate(MAX_SEQ_LEN);
         attention_mask.truncate(MAX_SEQ_LEN);
      }

      Ok((token_ids, attention_mask))
   }

   fn tokenize_batch(&self, texts: &[String]) -> Result<Vec<(Vec<u32>, Vec<u32>)>> {
      let model_state = self.model.read();
      let state = model_state
         .as_ref()
         .ok_or_else(|| Error::Embedding("model not loaded".to_string()))?;

      texts
         .iter()
         .map(|text| Self::tokenize_with(state, text))
         .collect()
   }

   fn normalize_l2(embedding: &mut [f32]) {
      let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
      if norm > 0.0 {
         for x in embedding.iter_mut() {
            *x /= norm;
         }
      }
   }

   fn compute_embedding(&self, text: &str) -> Result<Embedding> {
      let (token_ids, attention_mask) = self.tokenize(text)?;

      let token_ids_tensor = Tensor::new(&token_ids[..], &self.device)
         .map_err(|e| Error::Embedding(format!("failed to create tensor: {}", e)))?
         .unsqueeze(0)
         .map_err(|e| Error::Embedding(format!("failed to unsqueeze: {}", e)))?;

      let attention_mask_tensor = Tensor::new(&attention_mask[..], &self.device)
         .map_err(|e| Error::Embedding(format!("failed to create mask: {}", e)))?
         .unsqueeze(0)
         .map_err(|e| Error::Embedding(format!("failed to unsqueeze: {}", e)))?;

      let model_state = self.model.read();
      let state = model_state
         .as_ref()
         .ok_or_else(|| Error::Embedding("model not loaded".to_string()))?;

      let hidden = state
         .bert
         .forward(&token_ids_tensor, &attention_mask_tensor, None)
         .map_err(|e| Error::Embedding(format!("forward pass failed: {}", e)))?;

      let tokens = hidden
         .get(0)
         .map_err(|e| Error::Embedding(format!("failed to get batch: {}", e)))?;

      let pooled = tokens
         .mean(0)
         .map_err(|e| Error::Embedding(format!("failed to pool tokens: {}", e)))?;

      let mut embedding: Embedding = pooled
         .to_vec1()
         .map_err(|e| Error::Embedding(format!("failed to convert to vec: {}", e)))?;

      Self::normalize_l2(&mut embedding);
      Ok(embedding)
   }

   fn compute_embeddings_batch(
      &self,
      tokenized: &[(Vec<u32>, Vec<u32>)],
   ) -> Result<Vec<Embedding>> {
      if tokenized.is_empty() {
         return Ok(Vec::new());
      }

      let max_len = tokenized
         .iter()
         .map(|(ids, _)| ids.len())
         .max()
         .unwrap_or(0);
      let batch_size = tokenized.len();

      let mut all_token_ids = Vec::with_capacity(batch_size * max_len);
      let mut all_attention_masks = Vec::with_capacity(batch_size * max_len);

      for (token_ids, attention_mask) in tokenized {
         all_token_ids.extend(token_ids);
         all_token_ids.extend(vec![0u32; max_len - token_ids.len()]);

         all_attention_masks.extend(attention_mask);
         all_attention_masks.extend(vec![0u32; max_len - attention_mask.len()]);
      }

      let token_ids_tensor = Tensor::new(&all_token_ids[..], &self.device)
         .map_err(|e| Error::Embedding(format!("failed to create tensor: {}", e)))?
         .reshape(&[batch_size, max_len])
         .map_err(|e| Error::Embedding(format!("failed to reshape: {}", e)))?;

      let attention_mask_tensor = Tensor::new(&all_attention_masks[..], &self.device)
         .map_err(|e| Error::Embedding(format!("failed to create mask: {}", e)))?
         .reshape(&[batch_size, max_len])
         .map_err(|e| Error::Embedding(format!("failed to reshape: {}", e)))?;

      let model_state = self.model.read();
      let state = model_state
         .as_ref()
         .ok_or_else(|| Error::Embedding("model not loaded".to_string()))?;

      let hidden = state
         .bert
         .forward(&token_ids_tensor, &attention_mask_tensor, None)
         .map_err(|e| Error::Embedding(format!("forward pass failed: {}", e)))?;

      let mut results = Vec::with_capacity(batch_size);
      for i in 0..batch_size {
         let seq_len = tokenized[i].0.len();

         let tokens = hidden
            .get(i)
            .map_err(|e| Error::Embedding(format!("failed to get batch item {}: {}", i, e)))?;

         // pool only the real tokens, not batch padding
         let valid = tokens
            .narrow(0, 0, seq_len)
            .map_err(|e| Error::Embedding(format!("failed to narrow item {}: {}", i, e)))?;

         let pooled = valid
            .mean(0)
            .map_err(|e| Error::Embedding(format!("failed to pool item {}: {}", i, e)))?;

         let mut embedding: Embedding = pooled
            .to_vec1()
            .map_err(|e| Error::Embedding(format!("failed to convert item {}: {}", i, e)))?;

         Self::normalize_l2(&mut embedding);
         results.push(embedding);
      }

      Ok(results)
   }
}

#[async_trait::async_trait]
impl Embedder for CandleEmbedder {
   async fn embed(&self, text: &str) -> Result<Embedding> {
      self.ensure_model_loaded()?;

      if debug_embed() {
         tracing::info!("encoding text ({} chars)", text.len());
      }

      self.compute_embedding(text)
   }

   async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
      self.ensure_model_loaded()?;

      if texts.is_empty() {
         return Ok(Vec::new());
      }

      let tokenized = self.tokenize_batch(texts)?;
      self.compute_embeddings_batch(&tokenized)
   }

   fn is_ready(&self) -> bool {
      self.model.read().is_some()
   }
}

impl Default for CandleEmbedder {
   fn default() -> Self {
      Self::new().expect("failed to create CandleEmbedder")
   }
}
