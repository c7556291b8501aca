//! Bulk fixture import.
//!
//! A [`FixtureBundle`] is a single JSON document describing studies, families,
//! demographic snapshots, responses, historical consent rulings and video
//! rows. Rows are inserted in dependency order and counted in an
//! [`ImportReport`] that the caller owns.

use std::io::Read;

use chrono::{DateTime, Utc};
use lookit_core::{
  consent::ConsentAction,
  response::{NewResponse, NewVideo},
  study::{Account, Child, DemographicSnapshot, Study},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{Result, SqliteStore};

/// A historical ruling with its original arbiter and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureRuling {
  pub response_uuid: Uuid,
  pub action:        ConsentAction,
  pub arbiter:       String,
  #[serde(default)]
  pub comment:       Option<String>,
  pub created_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureBundle {
  pub studies:      Vec<Study>,
  /// Accounts not already reachable through `children`.
  pub accounts:     Vec<Account>,
  pub children:     Vec<Child>,
  pub demographics: Vec<DemographicSnapshot>,
  pub responses:    Vec<NewResponse>,
  /// Applied in list order, so later entries win.
  pub rulings:      Vec<FixtureRuling>,
  pub videos:       Vec<NewVideo>,
}

impl FixtureBundle {
  pub fn from_reader(reader: impl Read) -> Result<Self> {
    Ok(serde_json::from_reader(reader)?)
  }
}

/// Counts of rows created by one import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
  pub studies:      usize,
  pub accounts:     usize,
  pub children:     usize,
  pub demographics: usize,
  pub responses:    usize,
  pub rulings:      usize,
  pub videos:       usize,
  /// `(study, response)` for every imported response whose exit survey
  /// withdrew video consent. Their non-consent video still has to be purged.
  pub withdrawn:    Vec<(Uuid, Uuid)>,
}

impl SqliteStore {
  /// Insert every row of `bundle`. Stops at the first failing row; rows
  /// already inserted stay.
  pub async fn import(&self, bundle: FixtureBundle) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for study in &bundle.studies {
      self.insert_study(study).await?;
      report.studies += 1;
    }
    for account in &bundle.accounts {
      self.insert_account(account).await?;
      report.accounts += 1;
    }
    for child in &bundle.children {
      self.insert_child(child).await?;
      report.children += 1;
    }
    for snapshot in &bundle.demographics {
      self.insert_demographic_snapshot(snapshot).await?;
      report.demographics += 1;
    }
    for response in bundle.responses {
      let record = self.insert_response(response).await?;
      if record.withdrawn() {
        report.withdrawn.push((record.study.uuid, record.uuid));
      }
      report.responses += 1;
    }
    for ruling in bundle.rulings {
      self
        .insert_ruling(
          ruling.response_uuid,
          ruling.action,
          ruling.arbiter,
          ruling.comment,
          ruling.created_at,
        )
        .await?;
      report.rulings += 1;
    }
    for video in bundle.videos {
      self.insert_video(video, true).await?;
      report.videos += 1;
    }

    info!(
      studies = report.studies,
      children = report.children,
      responses = report.responses,
      rulings = report.rulings,
      videos = report.videos,
      withdrawn = report.withdrawn.len(),
      "imported fixtures"
    );
    Ok(report)
  }
}
