//! Error type for `lookit-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] lookit_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {kind} value: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },

  #[error("study not found: {0}")]
  StudyNotFound(uuid::Uuid),

  #[error("response not found: {0}")]
  ResponseNotFound(uuid::Uuid),

  #[error("response {0} withdrew video consent; only consent footage is accepted")]
  ResponseWithdrawn(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
