//! Experiment runner session updates.
//!
//! Every saved update re-checks the exit survey; a withdrawn session loses
//! its non-consent video immediately.

use axum::{
  Json,
  extract::{Path, State},
};
use lookit_core::{
  response::SessionUpdate,
  store::{ResponseStore, VideoStorage},
  video,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionSaved {
  pub uuid:           Uuid,
  pub completed:      bool,
  pub withdrawn:      bool,
  pub videos_removed: usize,
}

/// `PUT /sessions/{response_id}`
pub async fn update<S, V>(
  State(state): State<AppState<S, V>>,
  Path(response_id): Path<Uuid>,
  Json(update): Json<SessionUpdate>,
) -> Result<Json<SessionSaved>, ApiError>
where
  S: ResponseStore,
  V: VideoStorage,
{
  let record = state
    .store
    .update_session(response_id, update)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("response {response_id} not found")))?;

  let purge = video::enforce_withdrawal(&*state.store, &*state.storage, &record)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(SessionSaved {
    uuid:           record.uuid,
    completed:      record.completed,
    withdrawn:      record.withdrawn(),
    videos_removed: purge.rows_deleted,
  }))
}
