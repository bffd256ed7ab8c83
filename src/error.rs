use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
   #[error("embedding error: {0}")]
   Embedding(String),

   #[error("search backend error during {op}: {reason}")]
   Backend { op: &'static str, reason: String },

   #[error("dataset error: {0}")]
   Dataset(String),

   #[error("shape mismatch: {0}")]
   Shape(String),

   #[error(transparent)]
   Io(#[from] std::io::Error),

   #[error(transparent)]
   Csv(#[from] csv::Error),

   #[error(transparent)]
   Http(#[from] reqwest::Error),
}
