//! Handlers for the consent manager.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/studies/{id}/consent` | Current ruling and history per response |
//! | `POST` | `/studies/{id}/consent` | Body: `{"accepted":[..],"rejected":[..],"pending":[..],"comments":{..}}` |

use axum::{
  Extension, Json,
  extract::{Path, State},
};
use lookit_core::{
  access::{Permission, Researcher},
  consent::{ConsentRuling, ConsentStatus, RulingBatch},
  store::{ResponseStore, VideoStorage},
};
use uuid::Uuid;

use crate::{
  AppState,
  error::ApiError,
  guard::{open_study, require},
};

/// `GET /studies/{id}/consent`
pub async fn list<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(researcher): Extension<Researcher>,
  Path(study_id): Path<Uuid>,
) -> Result<Json<Vec<ConsentStatus>>, ApiError>
where
  S: ResponseStore,
  V: VideoStorage,
{
  let study = open_study(&*state.store, &researcher, study_id).await?;
  require(&researcher, Permission::CodeConsent)?;

  let statuses = state
    .store
    .list_consent_statuses(study.uuid)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(statuses))
}

/// `POST /studies/{id}/consent`
///
/// The whole batch is recorded under the researcher's display name, or
/// nothing is.
pub async fn submit<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(researcher): Extension<Researcher>,
  Path(study_id): Path<Uuid>,
  Json(batch): Json<RulingBatch>,
) -> Result<Json<Vec<ConsentRuling>>, ApiError>
where
  S: ResponseStore,
  V: VideoStorage,
{
  let study = open_study(&*state.store, &researcher, study_id).await?;
  require(&researcher, Permission::CodeConsent)?;

  let rulings = batch.into_rulings()?;
  let recorded = state
    .store
    .record_rulings(study.uuid, researcher.display_name.clone(), rulings)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(recorded))
}
