//! Filesystem object storage with signed, expiring download links.
//!
//! Objects live under `media_root/{key}`. A link is
//! `{base_url}/media/{key}?expires={unix}&signature={hex}` where the
//! signature is `sha256("{secret}|{key}|{expires}")`.

use std::{
  path::{Component, Path, PathBuf},
  sync::Arc,
};

use axum::{
  Router,
  extract::{Path as UrlPath, Query, State},
  http::header,
  response::{IntoResponse, Response},
  routing::get,
};
use chrono::{DateTime, Utc};
use lookit_core::store::VideoStorage;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{
  config::ServerConfig,
  error::{Error, Result},
};

#[derive(Debug, Clone)]
pub struct LocalStorage {
  root:     PathBuf,
  base_url: String,
  secret:   String,
  ttl_secs: i64,
}

impl LocalStorage {
  pub fn new(
    root: impl Into<PathBuf>,
    base_url: impl Into<String>,
    secret: impl Into<String>,
    ttl_secs: u64,
  ) -> Self {
    Self {
      root:     root.into(),
      base_url: base_url.into().trim_end_matches('/').to_owned(),
      secret:   secret.into(),
      ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
    }
  }

  pub fn from_config(cfg: &ServerConfig) -> Self {
    Self::new(
      &cfg.media_root,
      &cfg.base_url,
      &cfg.signing_secret,
      cfg.signed_url_ttl_secs,
    )
  }

  /// Map a key to a path below the root. Keys are relative, `/`-separated
  /// and may not step outside the root.
  fn path_for(&self, key: &str) -> Result<PathBuf> {
    let relative = Path::new(key);
    let normal = !key.is_empty()
      && !key.contains('\\')
      && relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !normal {
      return Err(Error::InvalidKey(key.to_owned()));
    }
    Ok(self.root.join(relative))
  }

  fn digest(&self, key: &str, expires: i64) -> Vec<u8> {
    Sha256::digest(format!("{}|{key}|{expires}", self.secret)).to_vec()
  }

  pub fn sign(&self, key: &str, expires: i64) -> String { hex::encode(self.digest(key, expires)) }

  pub fn signed_url_at(&self, key: &str, now: DateTime<Utc>) -> String {
    let expires = now.timestamp().saturating_add(self.ttl_secs);
    format!(
      "{}/media/{key}?expires={expires}&signature={}",
      self.base_url,
      self.sign(key, expires)
    )
  }

  pub fn verify(&self, key: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> Result<()> {
    let given = hex::decode(signature).map_err(|_| Error::BadSignature)?;
    if now.timestamp() > expires || !digests_match(&self.digest(key, expires), &given) {
      return Err(Error::BadSignature);
    }
    Ok(())
  }

  pub async fn read(&self, key: &str) -> Result<Vec<u8>> {
    let path = self.path_for(key)?;
    match tokio::fs::read(&path).await {
      Ok(bytes) => Ok(bytes),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound),
      Err(e) => Err(e.into()),
    }
  }
}

/// Compare in time independent of where the first differing byte sits.
fn digests_match(expected: &[u8], given: &[u8]) -> bool {
  expected.len() == given.len()
    && expected
      .iter()
      .zip(given)
      .fold(0u8, |acc, (a, b)| acc | (a ^ b))
      == 0
}

impl VideoStorage for LocalStorage {
  type Error = Error;

  async fn delete_video<'a>(&'a self, key: &'a str) -> Result<()> {
    let path = self.path_for(key)?;
    match tokio::fs::remove_file(&path).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound),
      Err(e) => Err(e.into()),
    }
  }

  async fn signed_download_url<'a>(&'a self, key: &'a str) -> Result<String> {
    self.path_for(key)?;
    Ok(self.signed_url_at(key, Utc::now()))
  }

  async fn upload<'a>(&'a self, key: &'a str, bytes: Vec<u8>) -> Result<()> {
    let path = self.path_for(key)?;
    debug!(key, bytes = bytes.len(), "storing object");
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, bytes).await?;
    Ok(())
  }

  async fn upload_file<'a>(&'a self, key: &'a str, source: &'a Path) -> Result<()> {
    let path = self.path_for(key)?;
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = tokio::fs::copy(source, &path).await?;
    debug!(key, bytes, "stored object from file");
    Ok(())
  }
}

// ─── Media route ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LinkParams {
  pub expires:   i64,
  pub signature: String,
}

fn content_type(key: &str) -> &'static str {
  match key.rsplit_once('.').map(|(_, ext)| ext) {
    Some("mp4") => "video/mp4",
    Some("webm") => "video/webm",
    Some("flv") => "video/x-flv",
    Some("zip") => "application/zip",
    Some("csv") => "text/csv; charset=utf-8",
    _ => "application/octet-stream",
  }
}

/// `GET /media/{*key}`
async fn serve_media(
  State(storage): State<Arc<LocalStorage>>,
  UrlPath(key): UrlPath<String>,
  Query(link): Query<LinkParams>,
) -> Result<Response> {
  storage.verify(&key, link.expires, &link.signature, Utc::now())?;
  let bytes = storage.read(&key).await?;
  Ok(([(header::CONTENT_TYPE, content_type(&key))], bytes).into_response())
}

pub fn media_router(storage: Arc<LocalStorage>) -> Router {
  Router::new()
    .route("/media/{*key}", get(serve_media))
    .with_state(storage)
}
