//! In-process background task queue.
//!
//! The API enqueues [`Job`]s on an unbounded tokio channel; a single worker
//! task drains it in order. Finished exports are uploaded under
//! `exports/{study}/{filename}` and their signed link is logged for the
//! requester. The frame data archive is built in a temporary file and
//! uploaded from disk.

use std::sync::Arc;

use lookit_core::{
  access::PermissionScope,
  store::{Job, ResponseQuery, ResponseStore, TaskQueue, VideoStorage},
  study::Study,
  video::{self, PurgeReport},
};
use lookit_export::{Artifact, framedata};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

// ─── Queue ───────────────────────────────────────────────────────────────────

/// The sending half handed to the API as its [`TaskQueue`].
#[derive(Debug, Clone)]
pub struct ChannelQueue {
  tx: mpsc::UnboundedSender<Job>,
}

impl ChannelQueue {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<Job>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

impl TaskQueue for ChannelQueue {
  fn enqueue(&self, job: Job) -> lookit_core::Result<()> {
    self
      .tx
      .send(job)
      .map_err(|_| lookit_core::Error::Queue("worker has stopped".into()))
  }
}

// ─── Worker ──────────────────────────────────────────────────────────────────

fn export_key(study: &Study, filename: &str) -> String {
  format!("exports/{}/{filename}", study.uuid)
}

/// What a finished job produced.
#[derive(Debug)]
pub enum JobOutcome {
  Uploaded { key: String, url: String },
  Purged(PurgeReport),
  /// The job's target no longer exists.
  Skipped,
}

pub struct Worker<S, V> {
  store:   Arc<S>,
  storage: Arc<V>,
}

impl<S, V> Worker<S, V>
where
  S: ResponseStore + 'static,
  V: VideoStorage + 'static,
{
  pub fn new(store: Arc<S>, storage: Arc<V>) -> Self { Self { store, storage } }

  /// Run until every sender is dropped.
  pub fn spawn(self, mut rx: mpsc::UnboundedReceiver<Job>) -> JoinHandle<()> {
    tokio::spawn(async move {
      while let Some(job) = rx.recv().await {
        match self.execute(&job).await {
          Ok(JobOutcome::Uploaded { key, url }) => {
            info!(?job, %key, %url, "export ready");
          }
          Ok(JobOutcome::Purged(report)) => {
            info!(?job, rows = report.rows_deleted, failures = report.failures.len(), "purge done");
          }
          Ok(JobOutcome::Skipped) => warn!(?job, "job target missing, skipped"),
          Err(e) => error!(?job, error = %e, "job failed"),
        }
      }
      info!("task queue closed, worker exiting");
    })
  }

  pub async fn execute(&self, job: &Job) -> Result<JobOutcome> {
    match job {
      Job::FramedataDictionary { study_id, scope, .. } => {
        let (study, query) = self.export_query(*study_id, *scope).await?;
        let artifact = framedata::framedata_dictionary(&*self.store, &study, &query).await?;
        self.publish(&study, artifact).await
      }
      Job::FramedataArchive { study_id, scope, .. } => {
        let (study, query) = self.export_query(*study_id, *scope).await?;
        let archive = framedata::archive_file(&*self.store, &study, &query).await?;
        let key = export_key(&study, &framedata::archive_filename(&study));
        self
          .storage
          .upload_file(&key, archive.path())
          .await
          .map_err(Error::storage)?;
        self.signed(key).await
      }
      Job::PurgeWithdrawnVideos { study_id, response_id } => {
        self.purge_withdrawn(*study_id, *response_id).await
      }
    }
  }

  async fn export_query(
    &self,
    study_id: Uuid,
    scope: PermissionScope,
  ) -> Result<(Study, ResponseQuery)> {
    let study = self
      .store
      .get_study(study_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::StudyNotFound(study_id))?;
    Ok((study, ResponseQuery::for_export(study_id, scope)))
  }

  async fn publish(&self, study: &Study, artifact: Artifact) -> Result<JobOutcome> {
    let key = export_key(study, &artifact.filename);
    self
      .storage
      .upload(&key, artifact.bytes)
      .await
      .map_err(Error::storage)?;
    self.signed(key).await
  }

  async fn signed(&self, key: String) -> Result<JobOutcome> {
    let url = self
      .storage
      .signed_download_url(&key)
      .await
      .map_err(Error::storage)?;
    Ok(JobOutcome::Uploaded { key, url })
  }

  async fn purge_withdrawn(&self, study_id: Uuid, response_id: Uuid) -> Result<JobOutcome> {
    let Some(record) = self
      .store
      .get_response(study_id, response_id)
      .await
      .map_err(Error::store)?
    else {
      return Ok(JobOutcome::Skipped);
    };
    let report = video::enforce_withdrawal(&*self.store, &*self.storage, &record)
      .await
      .map_err(Error::store)?;
    Ok(JobOutcome::Purged(report))
  }
}
