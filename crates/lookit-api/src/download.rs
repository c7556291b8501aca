//! File download responses.
//!
//! ETags are the quoted SHA-256 of the body, so re-exporting unchanged data
//! yields the same tag.

use axum::{
  http::header,
  response::{IntoResponse, Response},
};
use lookit_export::Artifact;
use sha2::{Digest, Sha256};

pub fn compute_etag(bytes: &[u8]) -> String {
  format!("\"{}\"", hex::encode(Sha256::digest(bytes)))
}

/// Serve `artifact` as an attachment.
pub fn attachment(artifact: Artifact) -> Response {
  let etag = compute_etag(&artifact.bytes);
  (
    [
      (header::CONTENT_TYPE, artifact.content_type.to_owned()),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{}\"", artifact.filename),
      ),
      (header::ETAG, etag),
    ],
    artifact.bytes,
  )
    .into_response()
}
