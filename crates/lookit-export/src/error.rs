//! Error type for `lookit-export`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The data-type selector named a format this dataset cannot produce.
  #[error("unsupported export format: {0:?}")]
  UnsupportedFormat(String),

  #[error(transparent)]
  Core(#[from] lookit_core::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("zip error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  /// Whether the caller's input, rather than the data or the backend, is at
  /// fault.
  pub fn is_input_error(&self) -> bool {
    matches!(
      self,
      Self::UnsupportedFormat(_) | Self::Core(lookit_core::Error::UnknownColumn(_))
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
