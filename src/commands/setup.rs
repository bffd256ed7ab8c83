use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config;

pub async fn execute() -> Result<()> {
   println!("{}\n", style("rankbench Setup").bold());

   let root = config::data_dir();
   let models = config::model_dir();
   let data = root.join("data");

   fs::create_dir_all(&root).context("failed to create .rankbench directory")?;
   fs::create_dir_all(&models).context("failed to create models directory")?;
   fs::create_dir_all(&data).context("failed to create data directory")?;

   println!("{}", style("Checking directories...").dim());
   check_dir("Root", &root);
   check_dir("Models", &models);
   check_dir("Data (dataset CSVs)", &data);
   println!();

   println!("{}", style("Downloading embedding model...").bold());
   download_model(&models).await?;

   println!("\n{}", style("Setup Complete!").green().bold());
   println!("\n{}", style("You can now run:").dim());
   println!(
      "   {} {}",
      style("rankbench ingest").green(),
      style("# Index the product catalog").dim()
   );
   println!(
      "   {} {}",
      style("rankbench baseline").green(),
      style("# Retrieve and score baseline rankings").dim()
   );
   println!(
      "   {} {}",
      style("rankbench rerank").green(),
      style("# Re-rank by embedding similarity and score").dim()
   );

   Ok(())
}

fn check_dir(name: &str, path: &PathBuf) {
   let exists = path.exists();
   let symbol = if exists {
      style("✓").green()
   } else {
      style("✗").red()
   };
   println!("{} {}: {}", symbol, name, style(path.display()).dim());
}

async fn download_model(models_dir: &PathBuf) -> Result<()> {
   let model_path = models_dir.join(config::EMBED_MODEL.replace('/', "--"));

   if model_path.exists() {
      println!("{} Model: {}", style("✓").green(), style(config::EMBED_MODEL).dim());
      return Ok(());
   }

   let spinner = ProgressBar::new_spinner();
   spinner.set_style(
      ProgressStyle::default_spinner()
         .template("{spinner:.green} {msg}")
         .unwrap(),
   );
   spinner.enable_steady_tick(Duration::from_millis(100));
   spinner.set_message(format!("Downloading {}...", config::EMBED_MODEL));

   match download_model_from_hf(config::EMBED_MODEL, &model_path).await {
      Ok(_) => {
         spinner.finish_with_message(format!(
            "{} Downloaded: {}",
            style("✓").green(),
            style(config::EMBED_MODEL).dim()
         ));
      },
      Err(e) => {
         spinner.finish_with_message(format!(
            "{} Failed: {} - {}",
            style("✗").red(),
            config::EMBED_MODEL,
            e
         ));
      },
   }

   Ok(())
}

async fn download_model_from_hf(model_id: &str, dest: &PathBuf) -> Result<()> {
   fs::create_dir_all(dest)?;

   let api = hf_hub::api::tokio::Api::new()?;
   let repo = api.model(model_id.to_string());

   let files_to_download =
      vec!["config.json", "tokenizer.json", "tokenizer_config.json", "model.safetensors"];

   for file in files_to_download {
      match repo.get(file).await {
         Ok(path) => {
            let dest_file = dest.join(file);
            if let Some(parent) = dest_file.parent() {
               fs::create_dir_all(parent)?;
            }
            fs::copy(path, dest_file)?;
         },
         Err(_e) => {},
      }
   }

   Ok(())
}
