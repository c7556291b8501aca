//! Handlers for response videos, researcher feedback and preview cleanup.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/studies/{id}/responses/{response_id}/videos` | Visible videos with signed links |
//! | `POST`   | `/studies/{id}/responses/{response_id}/feedback` | Body: `{"comment":"..."}` |
//! | `DELETE` | `/studies/{id}/preview-responses` | Hard-deletes preview data |

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
};
use lookit_core::{
  access::{Permission, Researcher},
  response::Feedback,
  store::{ResponseStore, VideoStorage},
  video::{self, PurgeReport},
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::{
  AppState,
  error::ApiError,
  guard::{open_study, read_scope, require},
};

// ─── Videos ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct VideoLink {
  pub uuid:               Uuid,
  pub frame_id:           String,
  pub is_consent_footage: bool,
  /// Short-lived download link; absent when signing failed.
  pub url:                Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:              Option<String>,
}

/// `GET /studies/{id}/responses/{response_id}/videos`
///
/// Consent coders see consent footage even without data access.
pub async fn list<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(researcher): Extension<Researcher>,
  Path((study_id, response_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<VideoLink>>, ApiError>
where
  S: ResponseStore,
  V: VideoStorage,
{
  let study = open_study(&*state.store, &researcher, study_id).await?;
  let scope = researcher.scope();
  if scope.is_empty() {
    require(&researcher, Permission::CodeConsent)?;
  }

  let record = state
    .store
    .get_response(study.uuid, response_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("response {response_id} not found")))?;

  let videos = state
    .store
    .list_videos(record.uuid)
    .await
    .map_err(ApiError::store)?;

  // A link that cannot be signed is reported on its own entry.
  let mut links = Vec::new();
  for v in video::visible_videos(&record, videos, scope) {
    let (url, error) = match state.storage.signed_download_url(&v.key).await {
      Ok(url) => (Some(url), None),
      Err(e) => {
        warn!(key = %v.key, error = %e, "failed to sign video link");
        (None, Some(e.to_string()))
      }
    };
    links.push(VideoLink {
      uuid: v.uuid,
      frame_id: v.frame_id,
      is_consent_footage: v.is_consent_footage,
      url,
      error,
    });
  }
  Ok(Json(links))
}

// ─── Feedback ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FeedbackBody {
  pub comment: String,
}

/// `POST /studies/{id}/responses/{response_id}/feedback`
pub async fn add_feedback<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(researcher): Extension<Researcher>,
  Path((study_id, response_id)): Path<(Uuid, Uuid)>,
  Json(body): Json<FeedbackBody>,
) -> Result<(StatusCode, Json<Feedback>), ApiError>
where
  S: ResponseStore,
  V: VideoStorage,
{
  let study = open_study(&*state.store, &researcher, study_id).await?;
  read_scope(&researcher)?;

  let comment = body.comment.trim();
  if comment.is_empty() {
    return Err(ApiError::BadRequest("feedback comment is empty".into()));
  }

  let feedback = state
    .store
    .add_feedback(
      study.uuid,
      response_id,
      researcher.display_name.clone(),
      comment.to_owned(),
    )
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(feedback)))
}

// ─── Preview purge ───────────────────────────────────────────────────────────

/// `DELETE /studies/{id}/preview-responses`
pub async fn purge_previews<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(researcher): Extension<Researcher>,
  Path(study_id): Path<Uuid>,
) -> Result<Json<PurgeReport>, ApiError>
where
  S: ResponseStore,
  V: VideoStorage,
{
  let study = open_study(&*state.store, &researcher, study_id).await?;
  require(&researcher, Permission::ReadPreviewData)?;

  let report = video::purge_preview_responses(&*state.store, &*state.storage, study.uuid)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(report))
}
