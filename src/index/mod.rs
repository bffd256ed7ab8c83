//! Full-text retrieval boundary.
//!
//! The index itself is an external service; this module owns the query
//! cleaning rule, the candidate-width contract, and the trait the rest of
//! the pipeline talks to.

pub mod elastic;

use std::sync::Arc;

pub use elastic::ElasticIndex;

use crate::{
   catalog::ItemRecord,
   error::Result,
   types::{CandidateSet, ItemId},
};

/// Escapes characters with reserved meaning in the index query syntax.
///
/// Forward slash and tilde are escaped, colon is stripped entirely. A
/// cleaned query may retrieve worse candidates than intended but must never
/// make the call itself fail.
pub fn clean_query(query: &str) -> String {
   let mut cleaned = String::with_capacity(query.len() + 4);
   for ch in query.chars() {
      match ch {
         '/' => cleaned.push_str("\\/"),
         '~' => cleaned.push_str("\\~"),
         ':' => {},
         _ => cleaned.push(ch),
      }
   }
   cleaned
}

#[async_trait::async_trait]
pub trait SearchIndex: Send + Sync {
   /// Runs a full-text query, returning item ids in rank order. The result
   /// may be shorter than `limit`.
   async fn query(&self, query: &str, limit: usize) -> Result<Vec<ItemId>>;

   /// Indexes a batch of catalog records, one document per item id.
   async fn index_batch(&self, records: &[ItemRecord]) -> Result<usize>;

   /// Number of documents currently indexed.
   async fn doc_count(&self) -> Result<u64>;
}

#[async_trait::async_trait]
impl<T: SearchIndex + ?Sized> SearchIndex for Arc<T> {
   async fn query(&self, query: &str, limit: usize) -> Result<Vec<ItemId>> {
      (**self).query(query, limit).await
   }

   async fn index_batch(&self, records: &[ItemRecord]) -> Result<usize> {
      (**self).index_batch(records).await
   }

   async fn doc_count(&self) -> Result<u64> {
      (**self).doc_count().await
   }
}

/// Candidate retrieval for one query: cleans the query text, dispatches to
/// the index, and pads the hit list to exactly `limit` ids.
///
/// Backend errors propagate; batch callers isolate them per query so one
/// bad query never aborts a run.
pub struct Retriever {
   index: Arc<dyn SearchIndex>,
   limit: usize,
}

impl Retriever {
   pub fn new(index: Arc<dyn SearchIndex>, limit: usize) -> Self {
      Self { index, limit }
   }

   pub async fn retrieve(&self, query: &str) -> Result<CandidateSet> {
      let ids = self.index.query(&clean_query(query), self.limit).await?;
      Ok(CandidateSet::padded(ids, self.limit))
   }

   pub fn limit(&self) -> usize {
      self.limit
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::error::Error;

   #[test]
   fn clean_query_escapes_reserved_characters() {
      assert_eq!(clean_query("a/b:c~d"), "a\\/bc\\~d");
      assert_eq!(clean_query("red chair"), "red chair");
      assert_eq!(clean_query("1/2 in. pipe"), "1\\/2 in. pipe");
      assert_eq!(clean_query(""), "");
   }

   struct FixedIndex {
      hits: Vec<ItemId>,
   }

   #[async_trait::async_trait]
   impl SearchIndex for FixedIndex {
      async fn query(&self, _query: &str, limit: usize) -> Result<Vec<ItemId>> {
         Ok(self.hits.iter().copied().take(limit).collect())
      }

      async fn index_batch(&self, _records: &[ItemRecord]) -> Result<usize> {
         Ok(0)
      }

      async fn doc_count(&self) -> Result<u64> {
         Ok(self.hits.len() as u64)
      }
   }

   struct FailingIndex;

   #[async_trait::async_trait]
   impl SearchIndex for FailingIndex {
      async fn query(&self, _query: &str, _limit: usize) -> Result<Vec<ItemId>> {
         Err(Error::Backend { op: "search", reason: "boom".to_string() })
      }

      async fn index_batch(&self, _records: &[ItemRecord]) -> Result<usize> {
         Ok(0)
      }

      async fn doc_count(&self) -> Result<u64> {
         Ok(0)
      }
   }

   #[tokio::test]
   async fn retrieve_pads_short_hit_lists() {
      let retriever = Retriever::new(Arc::new(FixedIndex { hits: vec![101, 102] }), 4);
      let set = retriever.retrieve("red chair").await.unwrap();
      assert_eq!(set.ids(), &[101, 102, 0, 0]);
   }

   #[tokio::test]
   async fn retrieve_propagates_backend_errors() {
      let retriever = Retriever::new(Arc::new(FailingIndex), 4);
      assert!(retriever.retrieve("red chair").await.is_err());
   }
}
