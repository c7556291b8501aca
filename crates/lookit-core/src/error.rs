//! Error types for `lookit-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("response {0} does not belong to study {1}")]
  ResponseNotInStudy(Uuid, Uuid),

  #[error("response {0} appears more than once in the ruling batch")]
  DuplicateRuling(Uuid),

  #[error("ruling batch is empty")]
  EmptyBatch,

  #[error("unknown column id: {0:?}")]
  UnknownColumn(String),

  #[error("task queue unavailable: {0}")]
  Queue(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
