use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
   catalog::Catalog,
   config,
   index::{ElasticIndex, SearchIndex},
};

const INDEX_CHUNK: usize = 500;

pub async fn execute(data_dir: Option<PathBuf>) -> Result<()> {
   let dir = data_dir.unwrap_or_else(config::dataset_dir);

   println!("{}", style("Loading and joining catalog data...").dim());
   let catalog = Catalog::load(&dir)
      .with_context(|| format!("failed to load catalog from {}", dir.display()))?;
   println!("{} products found in the dataset", style(catalog.len()).bold());

   let index = ElasticIndex::new().context("failed to create search backend client")?;

   let records: Vec<_> = catalog.records().cloned().collect();
   let bar = ProgressBar::new(records.len() as u64);
   bar.set_style(
      ProgressStyle::default_bar()
         .template("{bar:40.green} {pos}/{len} {msg}")
         .unwrap(),
   );
   bar.set_message("indexing");

   let mut indexed = 0;
   for chunk in records.chunks(INDEX_CHUNK) {
      indexed += index
         .index_batch(chunk)
         .await
         .context("failed to index catalog batch")?;
      bar.inc(chunk.len() as u64);
   }
   bar.finish_and_clear();

   let rejected = records.len() - indexed;
   println!("{} Indexed {} documents", style("✓").green(), style(indexed).bold());
   if rejected > 0 {
      println!("{} {} documents rejected by the backend", style("!").yellow(), rejected);
   }

   let count = index.doc_count().await.context("failed to count documents")?;
   println!("{}", style(format!("Backend reports {count} documents total")).dim());

   Ok(())
}
