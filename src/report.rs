//! Ranking report: the tabular checkpoint between retrieval and evaluation.
//!
//! One row per query, columns = ordered candidate ids. Writing it to disk
//! lets the retrieval stage and the re-ranking/evaluation stages run as
//! separate invocations.

use std::path::Path;

use crate::{
   error::{Error, Result},
   types::{CandidateSet, ItemId},
};

pub const QUERY_COLUMN: &str = "search_term";

/// Ordered candidate sets for a query batch, all exactly `width` wide.
#[derive(Debug, Clone)]
pub struct RankingReport {
   width:   usize,
   queries: Vec<String>,
   sets:    Vec<CandidateSet>,
}

impl RankingReport {
   pub fn new(width: usize) -> Self {
      Self { width, queries: Vec::new(), sets: Vec::new() }
   }

   /// Appends one query row; the set must match the report width.
   pub fn push(&mut self, query: String, set: CandidateSet) -> Result<()> {
      if set.width() != self.width {
         return Err(Error::Shape(format!(
            "candidate set for {:?} is {} wide, report expects {}",
            query,
            set.width(),
            self.width
         )));
      }
      self.queries.push(query);
      self.sets.push(set);
      Ok(())
   }

   pub fn width(&self) -> usize {
      self.width
   }

   pub fn len(&self) -> usize {
      self.queries.len()
   }

   pub fn is_empty(&self) -> bool {
      self.queries.is_empty()
   }

   pub fn iter(&self) -> impl Iterator<Item = (&str, &CandidateSet)> {
      self
         .queries
         .iter()
         .map(String::as_str)
         .zip(self.sets.iter())
   }

   /// Writes the report as CSV: `search_term,result_0,...,result_{N-1}`.
   pub fn write_csv(&self, path: &Path) -> Result<()> {
      if let Some(parent) = path.parent() {
         std::fs::create_dir_all(parent)?;
      }

      let mut writer = csv::Writer::from_path(path)?;

      let mut header = vec![QUERY_COLUMN.to_string()];
      header.extend((0..self.width).map(|i| format!("result_{i}")));
      writer.write_record(&header)?;

      for (query, set) in self.iter() {
         let mut row = vec![query.to_string()];
         row.extend(set.ids().iter().map(ItemId::to_string));
         writer.write_record(&row)?;
      }

      writer.flush()?;
      Ok(())
   }

   /// Reads a report back, deriving the width from the header.
   pub fn read_csv(path: &Path) -> Result<Self> {
      let mut reader = csv::Reader::from_path(path)?;
      let headers = csv::StringRecord::from_byte_record_lossy(reader.byte_headers()?.clone());

      if headers.get(0) != Some(QUERY_COLUMN) {
         return Err(Error::Dataset(format!(
            "{} does not look like a ranking report: first column is {:?}, expected {:?}",
            path.display(),
            headers.get(0).unwrap_or(""),
            QUERY_COLUMN
         )));
      }
      let width = headers.len().saturating_sub(1);
      if width == 0 {
         return Err(Error::Dataset(format!("{} has no result columns", path.display())));
      }

      let mut report = Self::new(width);
      for record in reader.into_byte_records() {
         let record = csv::StringRecord::from_byte_record_lossy(record?);

         let query = record
            .get(0)
            .ok_or_else(|| Error::Dataset("missing query cell".to_string()))?
            .to_string();

         let ids = record
            .iter()
            .skip(1)
            .map(|cell| {
               cell.parse::<ItemId>().map_err(|_| {
                  Error::Dataset(format!("non-numeric candidate id {:?} for {:?}", cell, query))
               })
            })
            .collect::<Result<Vec<ItemId>>>()?;

         report.push(query, CandidateSet::padded(ids, width))?;
      }

      Ok(report)
   }
}
