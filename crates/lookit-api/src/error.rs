//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("internal error: {0}")]
  Internal(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain errors that blame the request rather than the server.
fn is_input_error(e: &lookit_core::Error) -> bool {
  use lookit_core::Error::*;
  matches!(
    e,
    ResponseNotInStudy(..) | DuplicateRuling(_) | EmptyBatch | UnknownColumn(_)
  )
}

impl ApiError {
  /// Wrap a backend error. A domain validation error anywhere in its source
  /// chain becomes a 400 instead of a 500.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(&e);
    while let Some(err) = cause {
      if let Some(core) = err.downcast_ref::<lookit_core::Error>()
        && is_input_error(core)
      {
        return Self::BadRequest(core.to_string());
      }
      cause = err.source();
    }
    Self::Store(Box::new(e))
  }
}

impl From<lookit_core::Error> for ApiError {
  fn from(e: lookit_core::Error) -> Self {
    if is_input_error(&e) {
      Self::BadRequest(e.to_string())
    } else {
      Self::Internal(e.to_string())
    }
  }
}

impl From<lookit_export::Error> for ApiError {
  fn from(e: lookit_export::Error) -> Self {
    match e {
      e if e.is_input_error() => Self::BadRequest(e.to_string()),
      lookit_export::Error::Store(inner) => Self::Store(inner),
      lookit_export::Error::Core(core) => core.into(),
      other => Self::Internal(other.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Internal(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let message = match self {
      ApiError::BadRequest(m)
      | ApiError::Forbidden(m)
      | ApiError::NotFound(m)
      | ApiError::Internal(m) => m,
      ApiError::Store(e) => e.to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
