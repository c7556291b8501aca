//! Video visibility and the two hard-delete paths: withdrawal and preview
//! purge.
//!
//! Withdrawal is one-way. Once the exit survey says a parent withdrew,
//! non-consent video rows are removed from the store and their objects are
//! deleted from storage; a later consent ruling cannot bring them back.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  access::PermissionScope,
  consent::ConsentAction,
  response::{ResponseRecord, Video},
  store::{ResponseStore, VideoStorage},
};

/// Whether `video` may be shown to a caller holding `scope`.
///
/// Consent footage is always visible so it can be reviewed. Other footage
/// requires an accepted ruling, or a preview response and preview access,
/// and is never shown for a withdrawn response.
pub fn is_visible(record: &ResponseRecord, video: &Video, scope: PermissionScope) -> bool {
  if video.is_consent_footage {
    return true;
  }
  if record.withdrawn() {
    return false;
  }
  if record.is_preview {
    scope.preview
  } else {
    scope.real && record.consent_action() == ConsentAction::Accepted
  }
}

/// The subset of `videos` visible under `scope`.
pub fn visible_videos(
  record: &ResponseRecord,
  videos: Vec<Video>,
  scope: PermissionScope,
) -> Vec<Video> {
  videos
    .into_iter()
    .filter(|v| is_visible(record, v, scope))
    .collect()
}

// ─── Purges ──────────────────────────────────────────────────────────────────

/// A storage object that could not be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageFailure {
  pub key:   String,
  pub error: String,
}

/// Outcome of a hard delete. Storage failures are reported per object and
/// never undo the row deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
  pub rows_deleted:    usize,
  pub objects_deleted: usize,
  pub failures:        Vec<StorageFailure>,
}

async fn delete_objects<V: VideoStorage>(
  storage: &V,
  videos: &[Video],
  report: &mut PurgeReport,
) {
  for video in videos {
    match storage.delete_video(&video.key).await {
      Ok(()) => report.objects_deleted += 1,
      Err(e) => {
        warn!(key = %video.key, error = %e, "failed to delete video object");
        report.failures.push(StorageFailure {
          key:   video.key.clone(),
          error: e.to_string(),
        });
      }
    }
  }
}

/// Remove every non-consent video of a withdrawn response. Does nothing for
/// responses that are not withdrawn.
pub async fn enforce_withdrawal<S: ResponseStore, V: VideoStorage>(
  store: &S,
  storage: &V,
  record: &ResponseRecord,
) -> Result<PurgeReport, S::Error> {
  let mut report = PurgeReport::default();
  if !record.withdrawn() {
    return Ok(report);
  }

  let doomed: Vec<Video> = store
    .list_videos(record.uuid)
    .await?
    .into_iter()
    .filter(|v| !v.is_consent_footage)
    .collect();
  if doomed.is_empty() {
    return Ok(report);
  }

  report.rows_deleted = store
    .delete_videos(doomed.iter().map(|v| v.uuid).collect())
    .await?;
  delete_objects(storage, &doomed, &mut report).await;

  info!(
    response = %record.uuid,
    rows = report.rows_deleted,
    failures = report.failures.len(),
    "purged video of withdrawn response"
  );
  Ok(report)
}

/// Hard-delete the study's preview responses and their video objects.
pub async fn purge_preview_responses<S: ResponseStore, V: VideoStorage>(
  store: &S,
  storage: &V,
  study_id: Uuid,
) -> Result<PurgeReport, S::Error> {
  let videos = store.delete_preview_responses(study_id).await?;
  let mut report = PurgeReport { rows_deleted: videos.len(), ..Default::default() };
  delete_objects(storage, &videos, &mut report).await;

  info!(study = %study_id, videos = videos.len(), "purged preview responses");
  Ok(report)
}
