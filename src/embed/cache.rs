//! Memoized item-field embeddings shared across query pipelines.

use std::sync::Arc;

use moka::future::Cache;

use crate::{
   catalog::{Catalog, ItemRecord},
   config,
   embed::{Embedder, Embedding},
   error::{Error, Result},
   types::{EvalField, ItemId},
};

/// Concurrent, idempotent cache of item embeddings keyed by (id, field).
///
/// Two pipelines racing to embed the same item may both compute it; the
/// second result overwrites the first with an identical vector, so the
/// cache is at-least-once correct without coordination.
pub struct EmbedCache {
   embedder: Arc<dyn Embedder>,
   cache:    Cache<(ItemId, EvalField), Arc<Embedding>>,
}

impl EmbedCache {
   pub fn new(embedder: Arc<dyn Embedder>) -> Self {
      Self { embedder, cache: Cache::new(1 << 20) }
   }

   /// Returns the embedding for one item field, computing and memoizing it
   /// on first use.
   pub async fn get_or_embed(&self, record: &ItemRecord, field: EvalField) -> Result<Arc<Embedding>> {
      self
         .cache
         .try_get_with((record.id, field), async {
            let text = record.field_text(field);
            self.embedder.embed(&text).await.map(Arc::new)
         })
         .await
         .map_err(|e: Arc<Error>| Error::Embedding(e.to_string()))
   }

   /// Precomputes embeddings for every catalog item and field, in batches.
   /// `progress` is called with (done, total) item-field pairs.
   pub async fn warm(
      &self,
      catalog: &Catalog,
      fields: &[EvalField],
      progress: Option<&(dyn Fn(usize, usize) + Sync)>,
   ) -> Result<()> {
      let batch_size = config::batch_size();
      let pairs: Vec<(&ItemRecord, EvalField)> = catalog
         .records()
         .flat_map(|record| fields.iter().map(move |&field| (record, field)))
         .collect();
      let total = pairs.len();

      let mut done = 0;
      for chunk in pairs.chunks(batch_size) {
         let texts: Vec<String> = chunk
            .iter()
            .map(|(record, field)| record.field_text(*field))
            .collect();

         let embeddings = self.embedder.embed_batch(&texts).await?;

         for ((record, field), embedding) in chunk.iter().zip(embeddings) {
            self
               .cache
               .insert((record.id, *field), Arc::new(embedding))
               .await;
         }

         done += chunk.len();
         if let Some(progress) = progress {
            progress(done, total);
         }
      }

      tracing::info!(embeddings = total, "embedding cache warmed");
      Ok(())
   }
}
