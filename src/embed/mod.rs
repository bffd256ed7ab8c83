//! Text embedding for query/item similarity scoring.

pub mod cache;
pub mod candle;

use std::sync::Arc;

pub use cache::EmbedCache;
pub use candle::CandleEmbedder;

use crate::error::Result;

/// Fixed-length semantic embedding vector.
pub type Embedding = Vec<f32>;

/// Text embedding trait mapping text spans to fixed-length vectors.
///
/// Implementations must be deterministic for a given input text: no
/// dependence on call order or prior state.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
   /// Embeds a single text span, truncating over-length input.
   async fn embed(&self, text: &str) -> Result<Embedding>;
   /// Embeds multiple texts in one forward pass.
   async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;
   /// Returns whether the model weights are loaded and ready.
   fn is_ready(&self) -> bool;
}

#[async_trait::async_trait]
impl<T: Embedder + ?Sized> Embedder for Arc<T> {
   async fn embed(&self, text: &str) -> Result<Embedding> {
      (**self).embed(text).await
   }

   async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
      (**self).embed_batch(texts).await
   }

   fn is_ready(&self) -> bool {
      (**self).is_ready()
   }
}
