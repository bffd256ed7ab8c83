//! Ground-truth relevance judgments joined by exact (query, item) pair.

use std::{collections::HashMap, path::Path};

use serde::Deserialize;

use crate::{
   error::Result,
   types::{CandidateSet, ItemId},
};

#[derive(Debug, Deserialize)]
struct TrainRow {
   search_term: String,
   product_uid: ItemId,
   relevance:   f64,
}

/// Labeled (query, item) -> relevance data plus the evaluation query list.
///
/// Duplicate judgments for the same pair keep the first occurrence; pairs
/// with no judgment score 0.0.
pub struct RelevanceLabels {
   by_query: HashMap<String, HashMap<ItemId, f64>>,
   queries:  Vec<String>,
}

impl RelevanceLabels {
   /// Loads judgments from the labeled training file. Queries are collected
   /// in first-seen file order, deduplicated.
   pub fn load(path: &Path) -> Result<Self> {
      let mut reader = csv::Reader::from_path(path)?;
      // the dataset ships as ISO-8859-1, not UTF-8
      let headers = csv::StringRecord::from_byte_record_lossy(reader.byte_headers()?.clone());

      let mut by_query: HashMap<String, HashMap<ItemId, f64>> = HashMap::new();
      let mut queries = Vec::new();

      for record in reader.into_byte_records() {
         let record = csv::StringRecord::from_byte_record_lossy(record?);
         let row: TrainRow = record.deserialize(Some(&headers))?;

         let judgments = by_query.entry(row.search_term.clone()).or_insert_with(|| {
            queries.push(row.search_term.clone());
            HashMap::new()
         });
         judgments.entry(row.product_uid).or_insert(row.relevance);
      }

      tracing::info!(
         queries = queries.len(),
         path = %path.display(),
         "loaded relevance judgments"
      );
      Ok(Self { by_query, queries })
   }

   /// Relevance of `id` for `query`; 0.0 when the pair is unlabeled.
   pub fn label(&self, query: &str, id: ItemId) -> f64 {
      self
         .by_query
         .get(query)
         .and_then(|judgments| judgments.get(&id))
         .copied()
         .unwrap_or(0.0)
   }

   /// One relevance-matrix row, aligned column-for-column with `candidates`.
   pub fn row(&self, query: &str, candidates: &CandidateSet) -> Vec<f64> {
      candidates
         .ids()
         .iter()
         .map(|&id| self.label(query, id))
         .collect()
   }

   /// Unique evaluation queries in first-seen order.
   pub fn queries(&self) -> &[String] {
      &self.queries
   }

   pub fn is_empty(&self) -> bool {
      self.queries.is_empty()
   }
}

#[cfg(test)]
mod tests {
   use std::io::Write;

   use tempfile::NamedTempFile;

   use super::*;

   fn write_train(rows: &str) -> NamedTempFile {
      let mut file = NamedTempFile::new().unwrap();
      writeln!(file, "id,product_uid,product_title,search_term,relevance").unwrap();
      write!(file, "{rows}").unwrap();
      file
   }

   #[test]
   fn label_defaults_to_zero_for_unmatched_pairs() {
      let file = write_train("1,101,Red Chair,red chair,3.0\n");
      let labels = RelevanceLabels::load(file.path()).unwrap();

      assert_eq!(labels.label("red chair", 101), 3.0);
      assert_eq!(labels.label("red chair", 999), 0.0);
      assert_eq!(labels.label("blue table", 101), 0.0);
      assert_eq!(labels.label("red chair", 0), 0.0);
   }

   #[test]
   fn duplicate_judgments_keep_the_first() {
      let file = write_train("1,101,Red Chair,red chair,3.0\n2,101,Red Chair,red chair,1.0\n");
      let labels = RelevanceLabels::load(file.path()).unwrap();
      assert_eq!(labels.label("red chair", 101), 3.0);
   }

   #[test]
   fn queries_keep_first_seen_order() {
      let file = write_train(
         "1,101,Red Chair,red chair,3.0\n\
          2,102,Blue Table,blue table,2.0\n\
          3,103,Red Chair XL,red chair,2.5\n",
      );
      let labels = RelevanceLabels::load(file.path()).unwrap();
      assert_eq!(labels.queries(), &["red chair".to_string(), "blue table".to_string()]);
   }

   #[test]
   fn row_aligns_with_candidate_order() {
      let file = write_train("1,101,Red Chair,red chair,3.0\n2,102,Stool,red chair,1.5\n");
      let labels = RelevanceLabels::load(file.path()).unwrap();

      let candidates = CandidateSet::padded(vec![102, 101], 4);
      assert_eq!(labels.row("red chair", &candidates), vec![1.5, 3.0, 0.0, 0.0]);
   }
}
