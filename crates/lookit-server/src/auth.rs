//! HTTP Basic-auth middleware for the researcher router.
//!
//! A successful login places the matching [`Researcher`] in the request
//! extensions, where the API handlers pick it up.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use lookit_core::access::Researcher;
use tracing::debug;

use crate::{config::ResearcherAccount, error::Error};

/// Verify Basic credentials against the configured accounts.
pub fn authenticate(headers: &HeaderMap, accounts: &[ResearcherAccount]) -> Result<Researcher, Error> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let account = accounts
    .iter()
    .find(|a| a.username == username)
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&account.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(account.researcher())
}

/// `axum::middleware::from_fn_with_state` layer.
pub async fn require_researcher(
  State(accounts): State<Arc<[ResearcherAccount]>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let researcher = authenticate(req.headers(), &accounts)?;
  debug!(researcher = %researcher.username, path = %req.uri().path(), "authenticated");
  req.extensions_mut().insert(researcher);
  Ok(next.run(req).await)
}
