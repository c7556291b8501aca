//! Handlers for data downloads and export jobs.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/studies/{id}/responses/download` | `?format=csv\|json&fields=a,b&sort=id\|date_created`; `framedata` queues the archive (202) |
//! | `GET`  | `/studies/{id}/responses/dictionary` | `?fields=a,b` |
//! | `GET`  | `/studies/{id}/responses/{response_id}/framedata` | One response |
//! | `POST` | `/studies/{id}/framedata-dictionary` | 202, background job |
//! | `POST` | `/studies/{id}/framedata-archive` | 202, background job |
//! | `GET`  | `/studies/{id}/demographics/download` | `?format=csv\|json&fields=a&sort=id\|date_created` |
//! | `GET`  | `/studies/{id}/demographics/dictionary` | `?fields=a` |
//! | `GET`  | `/studies/{id}/collisions` | Hashed-ID collision report |

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use lookit_core::{
  access::Researcher,
  collisions::CollisionReport,
  columns::{DEMOGRAPHICS, RESPONSES},
  consent::ConsentAction,
  store::{Job, ResponseQuery, ResponseStore, SortKey, VideoStorage},
};
use lookit_export::{ExportFormat, demographics, framedata, pages, responses};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  AppState,
  download::attachment,
  error::ApiError,
  guard::{open_study, read_scope},
};

#[derive(Debug, Default, Deserialize)]
pub struct DownloadParams {
  /// Defaults to `csv`.
  pub format: Option<String>,
  /// Comma-separated optional column ids. Absent means the defaults.
  pub fields: Option<String>,
  /// Row order, `id` (default) or `date_created`.
  #[serde(default)]
  pub sort:   SortKey,
}

impl DownloadParams {
  fn format(&self) -> Result<ExportFormat, ApiError> {
    Ok(self.format.as_deref().unwrap_or("csv").parse()?)
  }
}

// ─── Responses ───────────────────────────────────────────────────────────────

/// `GET /studies/{id}/responses/download`
///
/// `format=framedata` queues the archive job, as the archive is built on disk
/// by the worker.
pub async fn responses_download<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(researcher): Extension<Researcher>,
  Path(study_id): Path<Uuid>,
  Query(params): Query<DownloadParams>,
) -> Result<Response, ApiError>
where
  S: ResponseStore,
  V: VideoStorage,
{
  let format = params.format()?;
  if format == ExportFormat::Framedata {
    return enqueue(&state, &researcher, study_id, |study_id, requested_by, scope| {
      Job::FramedataArchive { study_id, requested_by, scope }
    })
    .await;
  }

  let study = open_study(&*state.store, &researcher, study_id).await?;
  let scope = read_scope(&researcher)?;
  let selection = RESPONSES.parse_selection(params.fields.as_deref())?;

  let query = ResponseQuery::for_export(study.uuid, scope).with_sort(params.sort);
  let artifact = responses::download(&*state.store, &study, &query, format, &selection).await?;
  info!(study = %study.uuid, researcher = %researcher.username, %format, "response download");
  Ok(attachment(artifact))
}

/// `GET /studies/{id}/responses/dictionary`
pub async fn responses_dictionary<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(researcher): Extension<Researcher>,
  Path(study_id): Path<Uuid>,
  Query(params): Query<DownloadParams>,
) -> Result<Response, ApiError>
where
  S: ResponseStore,
  V: VideoStorage,
{
  let study = open_study(&*state.store, &researcher, study_id).await?;
  read_scope(&researcher)?;
  let selection = RESPONSES.parse_selection(params.fields.as_deref())?;
  Ok(attachment(responses::responses_dictionary(&study, &selection)?))
}

/// `GET /studies/{id}/responses/{response_id}/framedata`
///
/// Only responses that would appear in the researcher's export are served.
pub async fn response_framedata<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(researcher): Extension<Researcher>,
  Path((study_id, response_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ApiError>
where
  S: ResponseStore,
  V: VideoStorage,
{
  let study = open_study(&*state.store, &researcher, study_id).await?;
  let scope = read_scope(&researcher)?;

  let record = state
    .store
    .get_response(study.uuid, response_id)
    .await
    .map_err(ApiError::store)?
    .filter(|r| scope.admits(r.is_preview))
    .filter(|r| r.is_preview || r.consent_action() == ConsentAction::Accepted)
    .ok_or_else(|| ApiError::NotFound(format!("response {response_id} not found")))?;

  Ok(attachment(framedata::response_frames(&study, &record)?))
}

async fn enqueue<S, V>(
  state: &AppState<S, V>,
  researcher: &Researcher,
  study_id: Uuid,
  build: fn(Uuid, String, lookit_core::access::PermissionScope) -> Job,
) -> Result<Response, ApiError>
where
  S: ResponseStore,
  V: VideoStorage,
{
  let study = open_study(&*state.store, researcher, study_id).await?;
  let scope = read_scope(researcher)?;
  let job = build(study.uuid, researcher.username.clone(), scope);
  state.tasks.enqueue(job.clone())?;
  info!(study = %study.uuid, researcher = %researcher.username, ?job, "queued export job");
  Ok((StatusCode::ACCEPTED, Json(job)).into_response())
}

/// `POST /studies/{id}/framedata-dictionary`
pub async fn enqueue_framedata_dictionary<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(researcher): Extension<Researcher>,
  Path(study_id): Path<Uuid>,
) -> Result<Response, ApiError>
where
  S: ResponseStore,
  V: VideoStorage,
{
  enqueue(&state, &researcher, study_id, |study_id, requested_by, scope| {
    Job::FramedataDictionary { study_id, requested_by, scope }
  })
  .await
}

/// `POST /studies/{id}/framedata-archive`
pub async fn enqueue_framedata_archive<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(researcher): Extension<Researcher>,
  Path(study_id): Path<Uuid>,
) -> Result<Response, ApiError>
where
  S: ResponseStore,
  V: VideoStorage,
{
  enqueue(&state, &researcher, study_id, |study_id, requested_by, scope| {
    Job::FramedataArchive { study_id, requested_by, scope }
  })
  .await
}

// ─── Demographics ────────────────────────────────────────────────────────────

/// `GET /studies/{id}/demographics/download`
pub async fn demographics_download<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(researcher): Extension<Researcher>,
  Path(study_id): Path<Uuid>,
  Query(params): Query<DownloadParams>,
) -> Result<Response, ApiError>
where
  S: ResponseStore,
  V: VideoStorage,
{
  let study = open_study(&*state.store, &researcher, study_id).await?;
  let scope = read_scope(&researcher)?;
  let format = params.format()?;
  let selection = DEMOGRAPHICS.parse_selection(params.fields.as_deref())?;

  let query = ResponseQuery::for_export(study.uuid, scope).with_sort(params.sort);
  let artifact =
    demographics::download(&*state.store, &study, &query, format, &selection).await?;
  Ok(attachment(artifact))
}

/// `GET /studies/{id}/demographics/dictionary`
pub async fn demographics_dictionary<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(researcher): Extension<Researcher>,
  Path(study_id): Path<Uuid>,
  Query(params): Query<DownloadParams>,
) -> Result<Response, ApiError>
where
  S: ResponseStore,
  V: VideoStorage,
{
  let study = open_study(&*state.store, &researcher, study_id).await?;
  read_scope(&researcher)?;
  let selection = DEMOGRAPHICS.parse_selection(params.fields.as_deref())?;
  Ok(attachment(demographics::demographics_dictionary(&study, &selection)?))
}

// ─── Collisions ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CollisionsBody {
  #[serde(flatten)]
  pub report:  CollisionReport,
  pub message: String,
}

/// `GET /studies/{id}/collisions`
pub async fn collisions<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(researcher): Extension<Researcher>,
  Path(study_id): Path<Uuid>,
) -> Result<Json<CollisionsBody>, ApiError>
where
  S: ResponseStore,
  V: VideoStorage,
{
  let study = open_study(&*state.store, &researcher, study_id).await?;
  let scope = read_scope(&researcher)?;

  let report =
    pages::check_collisions(&*state.store, &ResponseQuery::for_export(study.uuid, scope))
      .await?;
  if !report.is_empty() {
    warn!(study = %study.uuid, "hashed id collisions found");
  }
  Ok(Json(CollisionsBody { message: report.message(), report }))
}
