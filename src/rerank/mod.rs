//! Embedding-similarity re-ranking of retrieved candidate lists.

use std::{cmp::Ordering, sync::Arc};

use crate::{
   catalog::Catalog,
   embed::{EmbedCache, Embedder},
   error::Result,
   types::{CandidateSet, EvalField},
};

/// Cosine similarity between two embedding vectors, in [-1, 1].
///
/// Returns 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
   debug_assert_eq!(a.len(), b.len(), "cosine requires equal-length vectors");

   let mut dot = 0.0f32;
   let mut norm_a = 0.0f32;
   let mut norm_b = 0.0f32;
   for (x, y) in a.iter().zip(b.iter()) {
      dot += x * y;
      norm_a += x * x;
      norm_b += y * y;
   }

   let denom = norm_a.sqrt() * norm_b.sqrt();
   if denom > 0.0 { dot / denom } else { 0.0 }
}

/// Re-orders candidate sets by query/item embedding similarity.
pub struct Reranker {
   embedder: Arc<dyn Embedder>,
   catalog:  Arc<Catalog>,
   cache:    EmbedCache,
}

impl Reranker {
   pub fn new(embedder: Arc<dyn Embedder>, catalog: Arc<Catalog>) -> Self {
      let cache = EmbedCache::new(embedder.clone());
      Self { embedder, catalog, cache }
   }

   /// The shared item-embedding cache, exposed for batch warm-up.
   pub fn cache(&self) -> &EmbedCache {
      &self.cache
   }

   /// Produces a new candidate set sorted by descending similarity between
   /// the query and the chosen item-text field.
   ///
   /// The query is embedded once; absent candidates (sentinel padding or
   /// ids missing from the catalog) score 0.0. The sort is stable, so ties
   /// keep their original retrieval rank and an all-sentinel set re-ranks
   /// to itself. The input set is never mutated.
   pub async fn rerank(
      &self,
      query: &str,
      candidates: &CandidateSet,
      field: EvalField,
   ) -> Result<CandidateSet> {
      let query_embedding = self.embedder.embed(query).await?;

      let mut scored = Vec::with_capacity(candidates.width());
      for &id in candidates.ids() {
         let score = match self.catalog.resolve(id) {
            Some(record) => {
               let item_embedding = self.cache.get_or_embed(record, field).await?;
               cosine_similarity(&query_embedding, &item_embedding)
            },
            None => 0.0,
         };
         scored.push((id, score));
      }

      scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

      let ids = scored.into_iter().map(|(id, _)| id).collect();
      Ok(CandidateSet::padded(ids, candidates.width()))
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::{
      catalog::ItemRecord,
      embed::Embedding,
      error::Error,
      types::ItemId,
   };

   #[test]
   fn cosine_of_parallel_and_orthogonal_vectors() {
      assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
      assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
      assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
      assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
   }

   /// Embeds every text as a fixed unit vector keyed by known strings, so
   /// similarity orderings in tests are exact.
   struct TableEmbedder;

   fn vector_for(text: &str) -> Embedding {
      // query aligned with axis 0; items at decreasing angles to it
      if text.starts_with("red chair") {
         vec![1.0, 0.0]
      } else if text.contains("Crimson") {
         vec![0.9, 0.4359]
      } else if text.contains("Scarlet") {
         vec![0.6, 0.8]
      } else {
         vec![0.0, 1.0]
      }
   }

   #[async_trait::async_trait]
   impl Embedder for TableEmbedder {
      async fn embed(&self, text: &str) -> Result<Embedding> {
         Ok(vector_for(text))
      }

      async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
         Ok(texts.iter().map(|t| vector_for(t)).collect())
      }

      fn is_ready(&self) -> bool {
         true
      }
   }

   struct FailingEmbedder;

   #[async_trait::async_trait]
   impl Embedder for FailingEmbedder {
      async fn embed(&self, _text: &str) -> Result<Embedding> {
         Err(Error::Embedding("inference failed".to_string()))
      }

      async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Embedding>> {
         Err(Error::Embedding("inference failed".to_string()))
      }

      fn is_ready(&self) -> bool {
         false
      }
   }

   fn record(id: ItemId, title: &str) -> ItemRecord {
      ItemRecord {
         id,
         title: title.to_string(),
         description: String::new(),
         attributes: None,
      }
   }

   fn catalog() -> Arc<Catalog> {
      Arc::new(Catalog::from_records(vec![
         record(101, "Scarlet seat"),
         record(102, "Crimson chair"),
         record(103, "Green hose"),
      ]))
   }

   #[tokio::test]
   async fn reranks_by_descending_similarity() {
      let reranker = Reranker::new(Arc::new(TableEmbedder), catalog());
      let baseline = CandidateSet::padded(vec![101, 103, 102], 3);

      let reranked = reranker
         .rerank("red chair", &baseline, EvalField::TitleDesc)
         .await
         .unwrap();

      // Crimson (0.9) > Scarlet (0.6) > Green (0.0)
      assert_eq!(reranked.ids(), &[102, 101, 103]);
      // input untouched
      assert_eq!(baseline.ids(), &[101, 103, 102]);
   }

   #[tokio::test]
   async fn output_is_a_permutation_of_the_input() {
      let reranker = Reranker::new(Arc::new(TableEmbedder), catalog());
      let baseline = CandidateSet::padded(vec![103, 101, 102, 0, 0], 5);

      let reranked = reranker
         .rerank("red chair", &baseline, EvalField::TitleDesc)
         .await
         .unwrap();

      assert_eq!(reranked.width(), 5);
      let mut expected: Vec<ItemId> = baseline.ids().to_vec();
      let mut actual: Vec<ItemId> = reranked.ids().to_vec();
      expected.sort_unstable();
      actual.sort_unstable();
      assert_eq!(expected, actual);
   }

   #[tokio::test]
   async fn rerank_is_idempotent_on_similarity_order() {
      let reranker = Reranker::new(Arc::new(TableEmbedder), catalog());
      let baseline = CandidateSet::padded(vec![101, 102, 103], 3);

      let once = reranker
         .rerank("red chair", &baseline, EvalField::TitleDesc)
         .await
         .unwrap();
      let twice = reranker
         .rerank("red chair", &once, EvalField::TitleDesc)
         .await
         .unwrap();

      assert_eq!(once, twice);
   }

   #[tokio::test]
   async fn absent_candidates_tie_at_zero_and_keep_rank_order() {
      let reranker = Reranker::new(Arc::new(TableEmbedder), catalog());
      // 555 and 777 are unknown to the catalog; with the padding they all
      // score 0.0 and the stable sort must preserve their relative order
      let baseline = CandidateSet::padded(vec![555, 102, 777, 0], 4);

      let reranked = reranker
         .rerank("red chair", &baseline, EvalField::TitleDesc)
         .await
         .unwrap();

      assert_eq!(reranked.ids(), &[102, 555, 777, 0]);
   }

   #[tokio::test]
   async fn all_sentinel_set_reranks_to_itself() {
      let reranker = Reranker::new(Arc::new(TableEmbedder), catalog());
      let baseline = CandidateSet::empty(4);

      let reranked = reranker
         .rerank("red chair", &baseline, EvalField::TitleDesc)
         .await
         .unwrap();

      assert_eq!(reranked, baseline);
   }

   #[tokio::test]
   async fn embedding_failure_surfaces_as_an_error() {
      let reranker = Reranker::new(Arc::new(FailingEmbedder), catalog());
      let baseline = CandidateSet::padded(vec![101], 2);

      let result = reranker
         .rerank("red chair", &baseline, EvalField::TitleDesc)
         .await;
      assert!(result.is_err());
   }
}
