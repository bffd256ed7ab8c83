use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
   catalog::Catalog,
   config,
   embed::CandleEmbedder,
   labels::RelevanceLabels,
   pipeline,
   report::RankingReport,
   rerank::Reranker,
   types::EvalField,
};

pub async fn execute(
   data_dir: Option<PathBuf>,
   report: Option<PathBuf>,
   field: Option<EvalField>,
) -> Result<()> {
   let dir = data_dir.unwrap_or_else(config::dataset_dir);
   let report_path = report.unwrap_or_else(|| dir.join("results_by_query.csv"));

   let baseline = RankingReport::read_csv(&report_path).with_context(|| {
      format!(
         "failed to read baseline checkpoint {} (run 'rankbench baseline' first)",
         report_path.display()
      )
   })?;
   anyhow::ensure!(!baseline.is_empty(), "baseline checkpoint has no query rows");

   let labels = RelevanceLabels::load(&dir.join(config::TRAIN_FILE))
      .with_context(|| format!("failed to load judgments from {}", dir.display()))?;
   let catalog = Arc::new(
      Catalog::load(&dir)
         .with_context(|| format!("failed to load catalog from {}", dir.display()))?,
   );

   let fields: Vec<EvalField> = match field {
      Some(field) => vec![field],
      None => EvalField::all().to_vec(),
   };

   let embedder = Arc::new(CandleEmbedder::new().context("failed to create embedder")?);
   let reranker = Reranker::new(embedder, catalog.clone());

   println!(
      "Precomputing embeddings for {} products ({} field{})",
      style(catalog.len()).bold(),
      fields.len(),
      if fields.len() == 1 { "" } else { "s" }
   );
   let bar = ProgressBar::new((catalog.len() * fields.len()) as u64);
   bar.set_style(
      ProgressStyle::default_bar()
         .template("{bar:40.green} {pos}/{len} {msg}")
         .unwrap(),
   );
   bar.set_message("embedding");

   let progress = |done: usize, _total: usize| bar.set_position(done as u64);
   reranker
      .cache()
      .warm(&catalog, &fields, Some(&progress))
      .await
      .context("failed to precompute item embeddings")?;
   bar.finish_and_clear();

   for field in fields {
      let bar = ProgressBar::new(baseline.len() as u64);
      bar.set_style(
         ProgressStyle::default_bar()
            .template("{bar:40.green} {pos}/{len} {msg}")
            .unwrap(),
      );
      bar.set_message(format!("re-ranking ({})", field.as_str()));

      let progress = |done: usize, _total: usize| bar.set_position(done as u64);
      let run = pipeline::rerank_report(&reranker, &baseline, field, Some(&progress)).await?;
      bar.finish_and_clear();

      let out = dir.join(format!("{}_rankings.csv", field.as_str()));
      run
         .report
         .write_csv(&out)
         .with_context(|| format!("failed to write {}", out.display()))?;

      let ndcg = pipeline::score_report(&run.report, &labels)?;

      println!();
      println!(
         "Average NDCG using {}: {}",
         field.as_str(),
         style(format!("{ndcg:.4}")).bold()
      );
      println!(
         "{}",
         style(format!(
            "{} queries, {} kept baseline order after embedding failures; wrote {}",
            run.summary.queries,
            run.summary.fallbacks,
            out.display()
         ))
         .dim()
      );
   }

   Ok(())
}
