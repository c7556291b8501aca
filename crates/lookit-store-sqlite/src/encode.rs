//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates `YYYY-MM-DD`, UUIDs
//! hyphenated lowercase. Schema-free payloads and lists are compact JSON.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use lookit_core::{
  consent::{ConsentAction, ConsentRuling},
  fields::Projection,
  hash::DEFAULT_HASH_DIGITS,
  response::{Feedback, ResponseRecord, Video},
  study::{Account, Child, DemographicSnapshot, Study},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_action(a: ConsentAction) -> &'static str {
  match a {
    ConsentAction::Accepted => "accepted",
    ConsentAction::Rejected => "rejected",
    ConsentAction::Pending => "pending",
  }
}

pub fn decode_action(s: &str) -> Result<ConsentAction> {
  ConsentAction::from_str(s).map_err(|_| Error::UnknownVariant {
    kind:  "consent action",
    value: s.to_owned(),
  })
}

pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json<T: DeserializeOwned>(s: &str) -> Result<T> { Ok(serde_json::from_str(s)?) }

// ─── SQL fragments ───────────────────────────────────────────────────────────

/// Columns read by [`RawResponse::from_row`], in order.
pub const RESPONSE_COLUMNS: &str = "
  r.id, r.uuid, r.date_created, r.completed, r.is_preview,
  r.eligibility_json, r.sequence_json, r.conditions_json,
  r.exp_data_json, r.global_event_timings_json,
  s.uuid, s.name, s.salt, s.hash_digits, s.created_at,
  c.uuid, c.given_name, c.birthday, c.gender, c.age_at_birth,
  c.language_list, c.condition_list, c.additional_information,
  a.uuid, a.nickname,
  d.data_json";

/// Columns read by [`RawProjection::from_row`], in order.
pub const PROJECTION_COLUMNS: &str = "
  r.uuid, r.date_created, c.uuid, a.uuid,
  s.uuid, s.salt, s.hash_digits,
  d.data_json";

pub const RESPONSE_JOINS: &str = "
  FROM responses r
  JOIN studies  s ON s.uuid = r.study_uuid
  JOIN children c ON c.uuid = r.child_uuid
  JOIN accounts a ON a.uuid = c.account_uuid
  LEFT JOIN demographic_snapshots d ON d.uuid = r.demographic_snapshot_uuid";

pub const RULING_COLUMNS: &str =
  "id, response_uuid, action, arbiter, comment, created_at";

pub const VIDEO_COLUMNS: &str =
  "uuid, response_uuid, frame_id, storage_key, is_consent_footage, created_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read from a `studies` row.
pub struct RawStudy {
  pub uuid:        String,
  pub name:        String,
  pub salt:        String,
  pub hash_digits: i64,
  pub created_at:  String,
}

impl RawStudy {
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      uuid:        row.get(offset)?,
      name:        row.get(offset + 1)?,
      salt:        row.get(offset + 2)?,
      hash_digits: row.get(offset + 3)?,
      created_at:  row.get(offset + 4)?,
    })
  }

  pub fn into_study(self) -> Result<Study> {
    Ok(Study {
      uuid:        decode_uuid(&self.uuid)?,
      name:        self.name,
      salt:        decode_uuid(&self.salt)?,
      hash_digits: usize::try_from(self.hash_digits).unwrap_or(DEFAULT_HASH_DIGITS),
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from a `consent_rulings` row.
pub struct RawRuling {
  pub id:            i64,
  pub response_uuid: String,
  pub action:        String,
  pub arbiter:       String,
  pub comment:       Option<String>,
  pub created_at:    String,
}

impl RawRuling {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      response_uuid: row.get(1)?,
      action:        row.get(2)?,
      arbiter:       row.get(3)?,
      comment:       row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_ruling(self) -> Result<ConsentRuling> {
    Ok(ConsentRuling {
      id:            self.id,
      response_uuid: decode_uuid(&self.response_uuid)?,
      action:        decode_action(&self.action)?,
      arbiter:       self.arbiter,
      comment:       self.comment,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from a `videos` row.
pub struct RawVideo {
  pub uuid:               String,
  pub response_uuid:      String,
  pub frame_id:           String,
  pub storage_key:        String,
  pub is_consent_footage: bool,
  pub created_at:         String,
}

impl RawVideo {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      uuid:               row.get(0)?,
      response_uuid:      row.get(1)?,
      frame_id:           row.get(2)?,
      storage_key:        row.get(3)?,
      is_consent_footage: row.get(4)?,
      created_at:         row.get(5)?,
    })
  }

  pub fn into_video(self) -> Result<Video> {
    Ok(Video {
      uuid:               decode_uuid(&self.uuid)?,
      response_uuid:      decode_uuid(&self.response_uuid)?,
      frame_id:           self.frame_id,
      key:                self.storage_key,
      is_consent_footage: self.is_consent_footage,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from a `feedback` row.
pub struct RawFeedback {
  pub uuid:          String,
  pub response_uuid: String,
  pub researcher:    String,
  pub comment:       String,
  pub created_at:    String,
}

impl RawFeedback {
  pub fn into_feedback(self) -> Result<Feedback> {
    Ok(Feedback {
      uuid:          decode_uuid(&self.uuid)?,
      response_uuid: decode_uuid(&self.response_uuid)?,
      researcher:    self.researcher,
      comment:       self.comment,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from a response joined with its study, child, account and
/// demographic snapshot. See [`RESPONSE_COLUMNS`].
pub struct RawResponse {
  pub id:                     i64,
  pub uuid:                   String,
  pub date_created:           String,
  pub completed:              bool,
  pub is_preview:             bool,
  pub eligibility_json:       String,
  pub sequence_json:          String,
  pub conditions_json:        String,
  pub exp_data_json:          String,
  pub global_events_json:     String,
  pub study:                  RawStudy,
  pub child_uuid:             String,
  pub given_name:             String,
  pub birthday:               Option<String>,
  pub gender:                 Option<String>,
  pub age_at_birth:           Option<String>,
  pub language_list:          String,
  pub condition_list:         String,
  pub additional_information: String,
  pub account_uuid:           String,
  pub nickname:               Option<String>,
  pub snapshot_json:          Option<String>,
}

impl RawResponse {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                     row.get(0)?,
      uuid:                   row.get(1)?,
      date_created:           row.get(2)?,
      completed:              row.get(3)?,
      is_preview:             row.get(4)?,
      eligibility_json:       row.get(5)?,
      sequence_json:          row.get(6)?,
      conditions_json:        row.get(7)?,
      exp_data_json:          row.get(8)?,
      global_events_json:     row.get(9)?,
      study:                  RawStudy::from_row(row, 10)?,
      child_uuid:             row.get(15)?,
      given_name:             row.get(16)?,
      birthday:               row.get(17)?,
      gender:                 row.get(18)?,
      age_at_birth:           row.get(19)?,
      language_list:          row.get(20)?,
      condition_list:         row.get(21)?,
      additional_information: row.get(22)?,
      account_uuid:           row.get(23)?,
      nickname:               row.get(24)?,
      snapshot_json:          row.get(25)?,
    })
  }

  pub fn into_record(self, rulings: Vec<RawRuling>) -> Result<ResponseRecord> {
    let child = Child {
      uuid:                   decode_uuid(&self.child_uuid)?,
      account:                Account {
        uuid:     decode_uuid(&self.account_uuid)?,
        nickname: self.nickname,
      },
      given_name:             self.given_name,
      birthday:               self.birthday.as_deref().map(decode_date).transpose()?,
      gender:                 self.gender,
      age_at_birth:           self.age_at_birth,
      language_list:          self.language_list,
      condition_list:         self.condition_list,
      additional_information: self.additional_information,
    };

    Ok(ResponseRecord {
      id: self.id,
      uuid: decode_uuid(&self.uuid)?,
      study: self.study.into_study()?,
      child,
      demographic_snapshot: self
        .snapshot_json
        .as_deref()
        .map(decode_json::<DemographicSnapshot>)
        .transpose()?,
      date_created: decode_dt(&self.date_created)?,
      completed: self.completed,
      is_preview: self.is_preview,
      eligibility: decode_json(&self.eligibility_json)?,
      sequence: decode_json(&self.sequence_json)?,
      conditions: decode_json(&self.conditions_json)?,
      exp_data: decode_json(&self.exp_data_json)?,
      global_event_timings: decode_json(&self.global_events_json)?,
      consent_rulings: rulings
        .into_iter()
        .map(RawRuling::into_ruling)
        .collect::<Result<_>>()?,
    })
  }
}

/// Raw strings for the demographic export's flat projection. See
/// [`PROJECTION_COLUMNS`].
pub struct RawProjection {
  pub uuid:          String,
  pub date_created:  String,
  pub child_uuid:    String,
  pub account_uuid:  String,
  pub study_uuid:    String,
  pub salt:          String,
  pub hash_digits:   i64,
  pub snapshot_json: Option<String>,
}

impl RawProjection {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      uuid:          row.get(0)?,
      date_created:  row.get(1)?,
      child_uuid:    row.get(2)?,
      account_uuid:  row.get(3)?,
      study_uuid:    row.get(4)?,
      salt:          row.get(5)?,
      hash_digits:   row.get(6)?,
      snapshot_json: row.get(7)?,
    })
  }

  /// Snapshot fields appear under `demographic_snapshot__*` only when the
  /// response has a snapshot.
  pub fn into_projection(self) -> Result<Projection> {
    let mut projection = Projection::from_pairs([
      ("uuid".to_owned(), json!(self.uuid)),
      ("date_created".to_owned(), json!(self.date_created)),
      ("child__uuid".to_owned(), json!(self.child_uuid)),
      ("child__user__uuid".to_owned(), json!(self.account_uuid)),
      ("study__uuid".to_owned(), json!(self.study_uuid)),
      ("study__salt".to_owned(), json!(self.salt)),
      ("study__hash_digits".to_owned(), json!(self.hash_digits)),
    ]);

    if let Some(json) = self.snapshot_json {
      let snapshot: DemographicSnapshot = decode_json(&json)?;
      for name in DemographicSnapshot::FIELDS {
        let value = snapshot.field(name).unwrap_or(Value::Null);
        projection.insert(format!("demographic_snapshot__{name}"), value);
      }
    }
    Ok(projection)
  }
}
