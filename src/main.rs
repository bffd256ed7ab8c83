use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rankbench::{commands, types::EvalField};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
   name = "rankbench",
   version,
   about = "Search ranking quality benchmark: retrieve, re-rank by embedding similarity, score with NDCG"
)]
struct Cli {
   #[command(subcommand)]
   command: Command,

   /// Directory containing the dataset CSV files
   #[arg(long, global = true, env = "RANKBENCH_DATA_DIR")]
   data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
   /// Create data directories and prefetch the embedding model
   Setup,

   /// Load the product catalog and index it into the search backend
   Ingest,

   /// Retrieve baseline candidates for every query and score them
   Baseline {
      /// Where to write the results-by-query checkpoint
      #[arg(long)]
      out: Option<PathBuf>,
   },

   /// Re-rank a baseline checkpoint by embedding similarity and score it
   Rerank {
      /// Baseline checkpoint to re-rank
      #[arg(long)]
      report: Option<PathBuf>,

      /// Restrict evaluation to one item-text field
      #[arg(long, value_enum)]
      field: Option<EvalField>,
   },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
   tracing_subscriber::fmt()
      .with_env_filter(EnvFilter::from_default_env())
      .with_writer(std::io::stderr)
      .init();

   let cli = Cli::parse();

   match cli.command {
      Command::Setup => commands::setup::execute().await,
      Command::Ingest => commands::ingest::execute(cli.data_dir).await,
      Command::Baseline { out } => commands::baseline::execute(cli.data_dir, out).await,
      Command::Rerank { report, field } => {
         commands::rerank::execute(cli.data_dir, report, field).await
      },
   }
}
