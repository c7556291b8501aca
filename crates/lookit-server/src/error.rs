//! Error types and axum `IntoResponse` implementation.

use axum::{
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,

  /// A media link whose signature is wrong or has expired.
  #[error("invalid or expired link")]
  BadSignature,

  #[error("not found")]
  NotFound,

  #[error("invalid storage key: {0:?}")]
  InvalidKey(String),

  #[error("study not found: {0}")]
  StudyNotFound(Uuid),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("export error: {0}")]
  Export(#[from] lookit_export::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub(crate) fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"lookit\""),
        );
        res
      }
      Error::BadSignature => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
      Error::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
      Error::InvalidKey(key) => {
        (StatusCode::BAD_REQUEST, format!("invalid key: {key}")).into_response()
      }
      other => {
        tracing::error!(error = %other, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()).into_response()
      }
    }
  }
}
