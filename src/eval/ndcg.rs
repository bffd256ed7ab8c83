//! Normalized Discounted Cumulative Gain over fixed-width relevance rows.
//!
//! Each rank position carries a discount of `1 / log2(rank + 2)`, so the top
//! result counts at full weight and later positions progressively less. A
//! row's score is its discounted gain divided by the gain of the best
//! achievable ordering of the same relevance values.

use std::cmp::Ordering;

use crate::eval::RelevanceMatrix;

/// Positional discount factors for ranks `0..width`.
pub fn discount_vector(width: usize) -> Vec<f64> {
   (0..width)
      .map(|rank| 1.0 / (rank as f64 + 2.0).log2())
      .collect()
}

/// NDCG for a single relevance row.
///
/// A row with no relevant results (IDCG of zero) scores 0.0 rather than
/// propagating the undefined 0/0 ratio.
pub fn row_ndcg(row: &[f64], discount: &[f64]) -> f64 {
   debug_assert_eq!(row.len(), discount.len(), "discount vector width mismatch");

   let dcg: f64 = row.iter().zip(discount).map(|(rel, d)| rel * d).sum();

   let mut ideal = row.to_vec();
   ideal.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
   let idcg: f64 = ideal.iter().zip(discount).map(|(rel, d)| rel * d).sum();

   let ratio = dcg / idcg;
   if ratio.is_finite() { ratio } else { 0.0 }
}

/// Arithmetic mean of per-row NDCG values, each normalized before
/// aggregation. An empty matrix scores 0.0.
pub fn mean_ndcg(matrix: &RelevanceMatrix) -> f64 {
   if matrix.num_rows() == 0 {
      return 0.0;
   }

   let discount = discount_vector(matrix.width());
   let total: f64 = matrix.rows().map(|row| row_ndcg(row, &discount)).sum();
   total / matrix.num_rows() as f64
}
