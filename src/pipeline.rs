//! Batch orchestration: retrieval, re-ranking, and scoring over a query set.
//!
//! Each query is processed end-to-end before the next; per-query failures
//! are logged and isolated so a batch of thousands completes even when a
//! handful error.

use rayon::prelude::*;

use crate::{
   error::Result,
   eval::{RelevanceMatrix, ndcg},
   index::Retriever,
   labels::RelevanceLabels,
   report::RankingReport,
   rerank::Reranker,
   types::{CandidateSet, EvalField, RerankSummary, RetrievalSummary, SENTINEL_ID},
};

pub struct BaselineRun {
   pub report:  RankingReport,
   pub summary: RetrievalSummary,
}

/// Retrieves baseline candidates for every query.
///
/// A failed retrieval is logged and recorded as an empty candidate set;
/// the batch always completes. `progress` is called with (done, total).
pub async fn run_baseline(
   retriever: &Retriever,
   queries: &[String],
   progress: Option<&(dyn Fn(usize, usize) + Sync)>,
) -> Result<BaselineRun> {
   let mut report = RankingReport::new(retriever.limit());
   let mut summary = RetrievalSummary::default();

   for (done, query) in queries.iter().enumerate() {
      summary.queries += 1;

      let set = match retriever.retrieve(query).await {
         Ok(set) => set,
         Err(e) => {
            tracing::warn!(query = %query, error = %e, "retrieval failed, recording empty candidates");
            summary.failed += 1;
            CandidateSet::empty(retriever.limit())
         },
      };

      if set.ids().contains(&SENTINEL_ID) {
         summary.padded += 1;
      }

      report.push(query.clone(), set)?;

      if let Some(progress) = progress {
         progress(done + 1, queries.len());
      }
   }

   Ok(BaselineRun { report, summary })
}

pub struct RerankRun {
   pub report:  RankingReport,
   pub summary: RerankSummary,
}

/// Re-ranks every row of a baseline report by embedding similarity.
///
/// A query whose embedding fails keeps its baseline order; the batch
/// always completes.
pub async fn rerank_report(
   reranker: &Reranker,
   baseline: &RankingReport,
   field: EvalField,
   progress: Option<&(dyn Fn(usize, usize) + Sync)>,
) -> Result<RerankRun> {
   let mut report = RankingReport::new(baseline.width());
   let mut summary = RerankSummary::default();

   for (done, (query, candidates)) in baseline.iter().enumerate() {
      summary.queries += 1;

      let set = match reranker.rerank(query, candidates, field).await {
         Ok(set) => set,
         Err(e) => {
            tracing::warn!(query = %query, error = %e, "re-rank failed, keeping baseline order");
            summary.fallbacks += 1;
            candidates.clone()
         },
      };

      report.push(query.to_string(), set)?;

      if let Some(progress) = progress {
         progress(done + 1, baseline.len());
      }
   }

   Ok(RerankRun { report, summary })
}

/// Joins ground-truth labels onto a report, row order matching the report's
/// candidate order, and scores the result with mean NDCG.
pub fn score_report(report: &RankingReport, labels: &RelevanceLabels) -> Result<f64> {
   let entries: Vec<(&str, &CandidateSet)> = report.iter().collect();

   // each row writes only its own output, so label joining parallelizes
   let rows: Vec<Vec<f64>> = entries
      .par_iter()
      .map(|(query, set)| labels.row(query, set))
      .collect();

   let matrix = RelevanceMatrix::from_rows(report.width(), &rows)?;
   Ok(ndcg::mean_ndcg(&matrix))
}
