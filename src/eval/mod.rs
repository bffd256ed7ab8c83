pub mod ndcg;

use ndarray::Array2;

use crate::error::{Error, Result};

/// Relevance scores for a query batch: one row per query, one column per
/// rank position, every row exactly `width` wide.
///
/// Row order must match the candidate order it was derived from; reordering
/// candidates requires rebuilding the row.
#[derive(Debug, Clone)]
pub struct RelevanceMatrix {
   inner: Array2<f64>,
}

impl RelevanceMatrix {
   /// Assembles a matrix from per-query rows, rejecting any row whose length
   /// differs from `width`.
   pub fn from_rows(width: usize, rows: &[Vec<f64>]) -> Result<Self> {
      let mut cells = Vec::with_capacity(rows.len() * width);
      for (i, row) in rows.iter().enumerate() {
         if row.len() != width {
            return Err(Error::Shape(format!(
               "relevance row {} has {} cells, expected {}",
               i,
               row.len(),
               width
            )));
         }
         cells.extend_from_slice(row);
      }

      let inner = Array2::from_shape_vec((rows.len(), width), cells)
         .map_err(|e| Error::Shape(e.to_string()))?;
      Ok(Self { inner })
   }

   pub fn width(&self) -> usize {
      self.inner.ncols()
   }

   pub fn num_rows(&self) -> usize {
      self.inner.nrows()
   }

   pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
      self
         .inner
         .rows()
         .into_iter()
         .map(|row| row.to_slice().expect("matrix rows are contiguous"))
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn from_rows_validates_width() {
      let ok = RelevanceMatrix::from_rows(3, &[vec![1.0, 0.0, 2.0], vec![0.0, 0.0, 0.0]]);
      assert!(ok.is_ok());
      let matrix = ok.unwrap();
      assert_eq!(matrix.num_rows(), 2);
      assert_eq!(matrix.width(), 3);

      let bad = RelevanceMatrix::from_rows(3, &[vec![1.0, 0.0]]);
      assert!(bad.is_err());
   }

   #[test]
   fn rows_iterate_in_insertion_order() {
      let matrix =
         RelevanceMatrix::from_rows(2, &[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
      let rows: Vec<&[f64]> = matrix.rows().collect();
      assert_eq!(rows, vec![&[1.0, 2.0][..], &[3.0, 4.0][..]]);
   }

   #[test]
   fn empty_matrix_is_valid() {
      let matrix = RelevanceMatrix::from_rows(4, &[]).unwrap();
      assert_eq!(matrix.num_rows(), 0);
      assert_eq!(matrix.width(), 4);
   }
}
