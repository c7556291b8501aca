//! HTTP API for the Lookit response data pipeline.
//!
//! Exposes two axum routers backed by any [`ResponseStore`] and
//! [`VideoStorage`]:
//!
//! - [`researcher_router`]: exports, consent coding, videos, feedback and
//!   preview cleanup. Expects an authenticated [`Researcher`] in the request
//!   extensions; authentication itself is the caller's concern.
//! - [`session_router`]: the experiment runner's session updates.
//!
//! [`Researcher`]: lookit_core::access::Researcher

pub mod consent;
pub mod download;
pub mod error;
pub mod exports;
pub mod guard;
pub mod sessions;
pub mod videos;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use lookit_core::store::{ResponseStore, TaskQueue, VideoStorage};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct AppState<S, V> {
  pub store:   Arc<S>,
  pub storage: Arc<V>,
  pub tasks:   Arc<dyn TaskQueue>,
}

impl<S, V> Clone for AppState<S, V> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      storage: Arc::clone(&self.storage),
      tasks:   Arc::clone(&self.tasks),
    }
  }
}

/// Build the researcher-facing router.
pub fn researcher_router<S, V>(state: AppState<S, V>) -> Router<()>
where
  S: ResponseStore + 'static,
  V: VideoStorage + 'static,
{
  Router::new()
    // Response exports
    .route(
      "/studies/{id}/responses/download",
      get(exports::responses_download::<S, V>),
    )
    .route(
      "/studies/{id}/responses/dictionary",
      get(exports::responses_dictionary::<S, V>),
    )
    .route(
      "/studies/{id}/responses/{response_id}/framedata",
      get(exports::response_framedata::<S, V>),
    )
    .route(
      "/studies/{id}/framedata-dictionary",
      post(exports::enqueue_framedata_dictionary::<S, V>),
    )
    .route(
      "/studies/{id}/framedata-archive",
      post(exports::enqueue_framedata_archive::<S, V>),
    )
    // Demographics
    .route(
      "/studies/{id}/demographics/download",
      get(exports::demographics_download::<S, V>),
    )
    .route(
      "/studies/{id}/demographics/dictionary",
      get(exports::demographics_dictionary::<S, V>),
    )
    .route("/studies/{id}/collisions", get(exports::collisions::<S, V>))
    // Consent
    .route(
      "/studies/{id}/consent",
      get(consent::list::<S, V>).post(consent::submit::<S, V>),
    )
    // Videos and feedback
    .route(
      "/studies/{id}/responses/{response_id}/videos",
      get(videos::list::<S, V>),
    )
    .route(
      "/studies/{id}/responses/{response_id}/feedback",
      post(videos::add_feedback::<S, V>),
    )
    .route(
      "/studies/{id}/preview-responses",
      axum::routing::delete(videos::purge_previews::<S, V>),
    )
    .with_state(state)
}

/// Build the experiment runner's router.
pub fn session_router<S, V>(state: AppState<S, V>) -> Router<()>
where
  S: ResponseStore + 'static,
  V: VideoStorage + 'static,
{
  Router::new()
    .route("/sessions/{response_id}", put(sessions::update::<S, V>))
    .with_state(state)
}
