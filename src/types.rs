use serde::{Deserialize, Serialize};

/// Catalog item identifier as returned by the search index.
pub type ItemId = u64;

/// Padding value for rank positions with no candidate.
pub const SENTINEL_ID: ItemId = 0;

/// Item-text field used for similarity scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EvalField {
   /// Title and description text.
   TitleDesc,
   /// Title, description, and attribute text.
   FullText,
}

impl EvalField {
   pub const fn all() -> [Self; 2] {
      [Self::TitleDesc, Self::FullText]
   }

   pub const fn as_str(self) -> &'static str {
      match self {
         Self::TitleDesc => "title_desc",
         Self::FullText => "full_text",
      }
   }
}

/// Ordered candidate identifiers for one query, always exactly `width` long.
///
/// Positions beyond the hits returned by retrieval are padded with
/// [`SENTINEL_ID`]. Ordering is significant: index = rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSet {
   ids: Vec<ItemId>,
}

impl CandidateSet {
   /// Builds a set of exactly `width` ids, truncating long input and padding
   /// short input with the sentinel.
   pub fn padded(mut ids: Vec<ItemId>, width: usize) -> Self {
      ids.truncate(width);
      ids.resize(width, SENTINEL_ID);
      Self { ids }
   }

   /// An all-sentinel set, used when retrieval produced nothing.
   pub fn empty(width: usize) -> Self {
      Self { ids: vec![SENTINEL_ID; width] }
   }

   pub fn width(&self) -> usize {
      self.ids.len()
   }

   pub fn ids(&self) -> &[ItemId] {
      &self.ids
   }

   pub fn is_all_sentinel(&self) -> bool {
      self.ids.iter().all(|&id| id == SENTINEL_ID)
   }
}

/// Counters for one retrieval pass over a query batch.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RetrievalSummary {
   pub queries: usize,
   /// Queries whose retrieval call failed and were recorded as empty.
   pub failed:  usize,
   /// Queries that returned fewer hits than the result width.
   pub padded:  usize,
}

/// Counters for one re-ranking pass over a report.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RerankSummary {
   pub queries:   usize,
   /// Queries left in baseline order because embedding failed.
   pub fallbacks: usize,
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn padded_truncates_and_pads() {
      let set = CandidateSet::padded(vec![5, 6], 4);
      assert_eq!(set.ids(), &[5, 6, 0, 0]);

      let set = CandidateSet::padded(vec![1, 2, 3, 4, 5], 3);
      assert_eq!(set.ids(), &[1, 2, 3]);
   }

   #[test]
   fn empty_is_all_sentinel() {
      let set = CandidateSet::empty(4);
      assert_eq!(set.width(), 4);
      assert!(set.is_all_sentinel());
      assert!(!CandidateSet::padded(vec![7], 4).is_all_sentinel());
   }
}
