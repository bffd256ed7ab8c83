use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
   config,
   index::{ElasticIndex, Retriever},
   labels::RelevanceLabels,
   pipeline,
};

pub async fn execute(data_dir: Option<PathBuf>, out: Option<PathBuf>) -> Result<()> {
   let dir = data_dir.unwrap_or_else(config::dataset_dir);
   let out = out.unwrap_or_else(|| dir.join("results_by_query.csv"));

   let labels = RelevanceLabels::load(&dir.join(config::TRAIN_FILE))
      .with_context(|| format!("failed to load judgments from {}", dir.display()))?;
   anyhow::ensure!(!labels.is_empty(), "no evaluation queries in the labeled dataset");

   let index = Arc::new(ElasticIndex::new().context("failed to create search backend client")?);
   let retriever = Retriever::new(index, config::num_results());

   let queries = labels.queries();
   println!(
      "Retrieving top {} candidates for {} queries",
      retriever.limit(),
      style(queries.len()).bold()
   );

   let bar = ProgressBar::new(queries.len() as u64);
   bar.set_style(
      ProgressStyle::default_bar()
         .template("{bar:40.green} {pos}/{len} {msg}")
         .unwrap(),
   );
   bar.set_message("retrieving");

   let progress = |done: usize, _total: usize| bar.set_position(done as u64);
   let run = pipeline::run_baseline(&retriever, queries, Some(&progress)).await?;
   bar.finish_and_clear();

   run
      .report
      .write_csv(&out)
      .with_context(|| format!("failed to write {}", out.display()))?;
   println!("{} Wrote checkpoint to {}", style("✓").green(), style(out.display()).dim());

   println!("{}", style("Evaluating baseline relevance...").dim());
   let ndcg = pipeline::score_report(&run.report, &labels)?;

   println!();
   println!("Average NDCG for baseline retrieval: {}", style(format!("{ndcg:.4}")).bold());
   println!(
      "{}",
      style(format!(
         "{} queries, {} retrieval failures, {} padded result sets",
         run.summary.queries, run.summary.failed, run.summary.padded
      ))
      .dim()
   );

   Ok(())
}
