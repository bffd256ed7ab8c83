use std::path::PathBuf;

use directories::BaseDirs;

pub const EMBED_MODEL: &str = "prajjwal1/bert-small";

pub const MAX_SEQ_LEN: usize = 512;

pub const DEFAULT_NUM_RESULTS: usize = 20;

pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const MAX_BATCH_SIZE: usize = 96;

pub const DEFAULT_INDEX_URL: &str = "http://localhost:9200";
pub const DEFAULT_INDEX_NAME: &str = "products";

pub const TRAIN_FILE: &str = "train.csv";
pub const DESCRIPTIONS_FILE: &str = "product_descriptions.csv";
pub const ATTRIBUTES_FILE: &str = "attributes.csv";

pub fn data_dir() -> PathBuf {
   BaseDirs::new()
      .expect("failed to locate base directories")
      .home_dir()
      .join(".rankbench")
}

pub fn model_dir() -> PathBuf {
   data_dir().join("models")
}

pub fn dataset_dir() -> PathBuf {
   std::env::var("RANKBENCH_DATA_DIR")
      .map(PathBuf::from)
      .unwrap_or_else(|_| data_dir().join("data"))
}

pub fn index_url() -> String {
   std::env::var("RANKBENCH_INDEX_URL").unwrap_or_else(|_| DEFAULT_INDEX_URL.to_string())
}

pub fn index_name() -> String {
   std::env::var("RANKBENCH_INDEX_NAME").unwrap_or_else(|_| DEFAULT_INDEX_NAME.to_string())
}

pub fn num_results() -> usize {
   std::env::var("RANKBENCH_NUM_RESULTS")
      .ok()
      .and_then(|s| s.parse().ok())
      .unwrap_or(DEFAULT_NUM_RESULTS)
      .max(1)
}

pub fn batch_size() -> usize {
   std::env::var("RANKBENCH_BATCH_SIZE")
      .ok()
      .and_then(|s| s.parse().ok())
      .unwrap_or(DEFAULT_BATCH_SIZE)
      .clamp(1, MAX_BATCH_SIZE)
}

pub fn debug_models() -> bool {
   std::env::var("RANKBENCH_DEBUG_MODELS")
      .ok()
      .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
      .unwrap_or(false)
}

pub fn debug_embed() -> bool {
   std::env::var("RANKBENCH_DEBUG_EMBED")
      .ok()
      .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
      .unwrap_or(false)
}
