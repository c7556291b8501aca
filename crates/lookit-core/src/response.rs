//! Response records, their videos, and researcher feedback.
//!
//! A response is one child's single attempt at a study. Its experiment
//! payload (`exp_data`) is schema-free: a mapping of frame id to whatever the
//! frame recorded. A handful of response properties (withdrawal, video
//! privacy, Databrary sharing, parent feedback, exit-survey birthdate) are
//! read out of the exit frame rather than stored separately.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  consent::{self, ConsentAction, ConsentRuling},
  study::{Child, DemographicSnapshot, Study},
};

/// `frameType` value that marks the exit survey frame.
pub const EXIT_FRAME_TYPE: &str = "EXIT";

/// Eligibility codes assigned when a session starts.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Eligibility {
  Eligible,
  IneligibleTooyoung,
  IneligibleTooold,
  IneligibleCriteriaexpression,
  IneligibleParticipation,
}

// ─── ResponseRecord ──────────────────────────────────────────────────────────

/// A response with its study, child, demographic snapshot and consent history
/// already resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
  /// Short sequential ID.
  pub id:                   i64,
  pub uuid:                 Uuid,
  pub study:                Study,
  pub child:                Child,
  /// The snapshot that was current when the response was created.
  pub demographic_snapshot: Option<DemographicSnapshot>,
  pub date_created:         DateTime<Utc>,
  pub completed:            bool,
  pub is_preview:           bool,
  pub eligibility:          Vec<Eligibility>,
  /// Frame ids in the order they were shown.
  pub sequence:             Vec<String>,
  /// Randomizer assignments keyed by the frame that made them.
  pub conditions:           Value,
  /// Frame id → arbitrary frame payload.
  pub exp_data:             Value,
  /// Session-level timed events, each a flat JSON object.
  pub global_event_timings: Value,
  /// Judgement log, oldest first.
  pub consent_rulings:      Vec<ConsentRuling>,
}

fn exit_frame_in(exp_data: &Value) -> Option<&Map<String, Value>> {
  exp_data
    .as_object()?
    .values()
    .filter_map(Value::as_object)
    .filter(|frame| {
      frame.get("frameType").and_then(Value::as_str) == Some(EXIT_FRAME_TYPE)
    })
    .last()
}

/// Whether a session payload's exit survey withdrew use of video beyond
/// consent footage.
pub fn withdrawal_requested(exp_data: &Value) -> bool {
  exit_frame_in(exp_data)
    .and_then(|f| f.get("withdrawal"))
    .and_then(Value::as_bool)
    .unwrap_or(false)
}

impl ResponseRecord {
  /// The exit survey frame's payload. When a session contains more than one
  /// exit frame, the last one in payload order wins.
  pub fn exit_frame(&self) -> Option<&Map<String, Value>> { exit_frame_in(&self.exp_data) }

  fn exit_str(&self, key: &str) -> Option<&str> {
    self.exit_frame()?.get(key)?.as_str()
  }

  /// Whether the parent withdrew use of all video beyond consent footage.
  pub fn withdrawn(&self) -> bool { withdrawal_requested(&self.exp_data) }

  /// Video privacy level: `private`, `scientific` or `public`.
  pub fn video_privacy(&self) -> Option<&str> { self.exit_str("useOfMedia") }

  /// Databrary sharing answer: `yes` or `no`.
  pub fn databrary(&self) -> Option<&str> { self.exit_str("databraryShare") }

  /// Free-text feedback from the exit survey.
  pub fn parent_feedback(&self) -> Option<&str> { self.exit_str("feedback") }

  /// Exit-survey birthdate minus registered birthdate, in days.
  ///
  /// `None` when either date is missing or the survey value does not start
  /// with a `YYYY-MM-DD` date.
  pub fn birthdate_difference(&self) -> Option<i64> {
    let reported = self.exit_str("birthDate")?;
    let reported = NaiveDate::parse_from_str(reported.get(..10)?, "%Y-%m-%d").ok()?;
    let registered = self.child.birthday?;
    Some((reported - registered).num_days())
  }

  pub fn most_recent_ruling(&self) -> Option<&ConsentRuling> {
    consent::most_recent_ruling(&self.consent_rulings)
  }

  pub fn consent_action(&self) -> ConsentAction {
    consent::current_action(&self.consent_rulings)
  }
}

/// A response as written by the experiment runner or a fixture import, with
/// relations given by UUID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResponse {
  pub uuid:                      Uuid,
  pub study_uuid:                Uuid,
  pub child_uuid:                Uuid,
  #[serde(default)]
  pub demographic_snapshot_uuid: Option<Uuid>,
  pub date_created:              DateTime<Utc>,
  #[serde(default)]
  pub completed:                 bool,
  #[serde(default)]
  pub is_preview:                bool,
  #[serde(default)]
  pub eligibility:               Vec<Eligibility>,
  #[serde(default)]
  pub sequence:                  Vec<String>,
  #[serde(default)]
  pub conditions:                Value,
  #[serde(default)]
  pub exp_data:                  Value,
  #[serde(default)]
  pub global_event_timings:      Value,
}

// ─── Session updates ─────────────────────────────────────────────────────────

/// Payload sent by the experiment runner as a session progresses.
/// Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionUpdate {
  pub completed:            Option<bool>,
  pub sequence:             Option<Vec<String>>,
  pub conditions:           Option<Value>,
  pub exp_data:             Option<Value>,
  pub global_event_timings: Option<Value>,
}

// ─── Videos ──────────────────────────────────────────────────────────────────

/// A recorded media asset belonging to one frame of one response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
  pub uuid:               Uuid,
  pub response_uuid:      Uuid,
  pub frame_id:           String,
  /// Object key at the storage boundary.
  pub key:                String,
  pub is_consent_footage: bool,
  pub created_at:         DateTime<Utc>,
}

/// Input to [`crate::store::ResponseStore::add_video`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVideo {
  pub response_uuid: Uuid,
  pub frame_id:      String,
  pub key:           String,
}

impl NewVideo {
  /// Whether footage from `frame_id` is consent footage.
  pub fn is_consent_frame(frame_id: &str) -> bool {
    frame_id.contains("video-consent")
  }
}

// ─── Feedback ────────────────────────────────────────────────────────────────

/// A researcher's note to the family about a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
  pub uuid:          Uuid,
  pub response_uuid: Uuid,
  pub researcher:    String,
  pub comment:       String,
  pub created_at:    DateTime<Utc>,
}
