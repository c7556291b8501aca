//! The Lookit data server: configuration, researcher authentication, local
//! media storage and the background worker, wired around `lookit-api`.

pub mod auth;
pub mod config;
pub mod error;
pub mod storage;
pub mod worker;

pub use error::Error;

use std::sync::Arc;

use axum::{Router, middleware};
use lookit_api::{AppState, researcher_router, session_router};
use lookit_core::store::{ResponseStore, TaskQueue};
use tower_http::trace::TraceLayer;

use config::ResearcherAccount;
use storage::LocalStorage;

/// Assemble the full application router.
///
/// Researcher routes sit behind Basic auth. Session updates and signed media
/// links carry no researcher credentials.
pub fn app<S>(
  store: Arc<S>,
  storage: Arc<LocalStorage>,
  tasks: Arc<dyn TaskQueue>,
  accounts: Arc<[ResearcherAccount]>,
) -> Router
where
  S: ResponseStore + 'static,
{
  let state = AppState { store, storage: Arc::clone(&storage), tasks };

  let researcher = researcher_router(state.clone())
    .layer(middleware::from_fn_with_state(accounts, auth::require_researcher));

  Router::new()
    .merge(researcher)
    .merge(session_router(state))
    .merge(storage::media_router(storage))
    .layer(TraceLayer::new_for_http())
}
