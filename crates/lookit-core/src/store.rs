//! Collaborator traits: the response query layer, the video storage boundary
//! and the background task queue.
//!
//! Storage backends implement [`ResponseStore`] (e.g. `lookit-store-sqlite`).
//! The export builders, the HTTP layer and the background worker depend on
//! these abstractions only.

use std::{future::Future, path::Path};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  access::PermissionScope,
  consent::{ConsentRuling, ConsentStatus, NewRuling},
  fields::Projection,
  response::{Feedback, NewVideo, ResponseRecord, SessionUpdate, Video},
  study::Study,
};

/// Rows per page when the caller does not say otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 500;

// ─── Query types ─────────────────────────────────────────────────────────────

/// Page ordering. Every key is made total by falling back to the row id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
  #[default]
  Id,
  DateCreated,
}

/// Parameters for [`ResponseStore::fetch_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseQuery {
  pub study_id:       Uuid,
  pub scope:          PermissionScope,
  /// Restrict real responses to those whose current ruling is `accepted`.
  /// Preview responses are never gated on consent.
  pub consented_only: bool,
  pub sort:           SortKey,
  pub page_size:      usize,
}

impl ResponseQuery {
  /// The recordset behind data downloads: consented real responses plus
  /// preview responses, as far as `scope` allows.
  pub fn for_export(study_id: Uuid, scope: PermissionScope) -> Self {
    Self {
      study_id,
      scope,
      consented_only: true,
      sort: SortKey::Id,
      page_size: DEFAULT_PAGE_SIZE,
    }
  }

  pub fn with_sort(mut self, sort: SortKey) -> Self {
    self.sort = sort;
    self
  }

  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.max(1);
    self
  }
}

/// One page of results. Page numbers start at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub items:    Vec<T>,
  pub number:   usize,
  pub has_next: bool,
}

// ─── Response store ──────────────────────────────────────────────────────────

/// The response query layer.
///
/// Consent rulings are append-only; nothing here modifies or removes a prior
/// ruling except the cascade when a preview response is purged.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ResponseStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Studies ───────────────────────────────────────────────────────────

  fn get_study(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Study>, Self::Error>> + Send + '_;

  // ── Paginated reads ───────────────────────────────────────────────────

  /// One page of fully resolved responses matching `query`, in `query.sort`
  /// order. Concatenating pages `1..` until `has_next` is false yields every
  /// matching response exactly once.
  fn fetch_page<'a>(
    &'a self,
    query: &'a ResponseQuery,
    page: usize,
  ) -> impl Future<Output = Result<Page<ResponseRecord>, Self::Error>> + Send + 'a;

  /// Like [`ResponseStore::fetch_page`], but returns flat projections with
  /// the response, child, account, study and `demographic_snapshot__*`
  /// paths the demographic export reads.
  fn fetch_projection_page<'a>(
    &'a self,
    query: &'a ResponseQuery,
    page: usize,
  ) -> impl Future<Output = Result<Page<Projection>, Self::Error>> + Send + 'a;

  /// A single response, only if it belongs to `study_id`.
  fn get_response(
    &self,
    study_id: Uuid,
    response_id: Uuid,
  ) -> impl Future<Output = Result<Option<ResponseRecord>, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Apply an experiment-runner update. Returns the updated record, or
  /// `None` if the response does not exist.
  fn update_session(
    &self,
    response_id: Uuid,
    update: SessionUpdate,
  ) -> impl Future<Output = Result<Option<ResponseRecord>, Self::Error>> + Send + '_;

  // ── Consent ───────────────────────────────────────────────────────────

  /// Append one ruling per entry, atomically, under a single arbiter and a
  /// single timestamp. Fails without writing anything if any response is not
  /// part of `study_id`.
  fn record_rulings(
    &self,
    study_id: Uuid,
    arbiter: String,
    rulings: Vec<NewRuling>,
  ) -> impl Future<Output = Result<Vec<ConsentRuling>, Self::Error>> + Send + '_;

  /// Current ruling and full history for every response in the study.
  fn list_consent_statuses(
    &self,
    study_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ConsentStatus>, Self::Error>> + Send + '_;

  // ── Videos ────────────────────────────────────────────────────────────

  fn add_video(
    &self,
    input: NewVideo,
  ) -> impl Future<Output = Result<Video, Self::Error>> + Send + '_;

  fn list_videos(
    &self,
    response_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Video>, Self::Error>> + Send + '_;

  /// Remove video rows. Returns how many were deleted.
  fn delete_videos(
    &self,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Feedback ──────────────────────────────────────────────────────────

  /// Attach researcher feedback. Fails if the response is not part of
  /// `study_id`.
  fn add_feedback(
    &self,
    study_id: Uuid,
    response_id: Uuid,
    researcher: String,
    comment: String,
  ) -> impl Future<Output = Result<Feedback, Self::Error>> + Send + '_;

  // ── Preview data ──────────────────────────────────────────────────────

  /// Hard-delete every preview response of the study together with its
  /// rulings, videos and feedback. Returns the video rows that were removed
  /// so their objects can be deleted from storage.
  fn delete_preview_responses(
    &self,
    study_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Video>, Self::Error>> + Send + '_;
}

// ─── Video storage ───────────────────────────────────────────────────────────

/// Object storage for videos and generated export artifacts.
pub trait VideoStorage: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn delete_video<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// A short-lived download link for `key`.
  fn signed_download_url<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  fn upload<'a>(
    &'a self,
    key: &'a str,
    bytes: Vec<u8>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Store the contents of a local file under `key`. Used for artifacts too
  /// large to hold in memory.
  fn upload_file<'a>(
    &'a self,
    key: &'a str,
    source: &'a Path,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Background jobs ─────────────────────────────────────────────────────────

/// Work deferred to the background queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum Job {
  /// Scan every response and write the frame data dictionary.
  FramedataDictionary {
    study_id:     Uuid,
    requested_by: String,
    scope:        PermissionScope,
  },
  /// Write one frame data CSV per response into a ZIP archive.
  FramedataArchive {
    study_id:     Uuid,
    requested_by: String,
    scope:        PermissionScope,
  },
  /// Delete non-consent video of a withdrawn response.
  PurgeWithdrawnVideos { study_id: Uuid, response_id: Uuid },
}

/// Fire-and-forget job submission. Results are delivered out of band.
pub trait TaskQueue: Send + Sync {
  fn enqueue(&self, job: Job) -> crate::Result<()>;
}
