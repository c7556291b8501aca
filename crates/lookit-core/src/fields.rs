//! Path-based field access shared by live records and flat projections.
//!
//! Column extractors and the frame flattener never touch a concrete record
//! type. They ask a [`FieldSource`] for a Django-style `relation__field` path
//! and get JSON back, so the same extractor works on a fully resolved
//! [`ResponseRecord`] and on a [`Projection`] built from a bulk query row.

use std::{borrow::Cow, collections::BTreeMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::response::ResponseRecord;

/// Read access to a record by field path.
pub trait FieldSource {
  /// The value at `path`, or `None` when the path is unknown or the relation
  /// it goes through is missing.
  fn field(&self, path: &str) -> Option<Cow<'_, Value>>;

  /// The value at `path` rendered as text. `Null` and containers are `None`.
  fn text(&self, path: &str) -> Option<String> {
    match self.field(path)?.as_ref() {
      Value::String(s) => Some(s.clone()),
      Value::Number(n) => Some(n.to_string()),
      Value::Bool(b) => Some(b.to_string()),
      _ => None,
    }
  }

  fn uuid(&self, path: &str) -> Option<Uuid> {
    Uuid::parse_str(&self.text(path)?).ok()
  }

  /// A calendar date. Timestamps are truncated to their date part.
  fn date(&self, path: &str) -> Option<NaiveDate> {
    let text = self.text(path)?;
    NaiveDate::parse_from_str(text.get(..10)?, "%Y-%m-%d").ok()
  }

  fn datetime(&self, path: &str) -> Option<DateTime<Utc>> {
    let text = self.text(path)?;
    DateTime::parse_from_rfc3339(&text)
      .ok()
      .map(|dt| dt.with_timezone(&Utc))
  }

  fn integer(&self, path: &str) -> Option<i64> {
    match self.field(path)?.as_ref() {
      Value::Number(n) => n.as_i64(),
      Value::String(s) => s.trim().parse().ok(),
      _ => None,
    }
  }
}

// ─── Live records ────────────────────────────────────────────────────────────

const SNAPSHOT_PREFIX: &str = "demographic_snapshot__";

impl FieldSource for ResponseRecord {
  fn field(&self, path: &str) -> Option<Cow<'_, Value>> {
    if let Some(name) = path.strip_prefix(SNAPSHOT_PREFIX) {
      return self
        .demographic_snapshot
        .as_ref()?
        .field(name)
        .map(Cow::Owned);
    }

    let value = match path {
      "conditions" => return Some(Cow::Borrowed(&self.conditions)),
      "exp_data" => return Some(Cow::Borrowed(&self.exp_data)),
      "global_event_timings" => {
        return Some(Cow::Borrowed(&self.global_event_timings));
      }

      "id" => json!(self.id),
      "uuid" => json!(self.uuid),
      "date_created" => json!(self.date_created.to_rfc3339()),
      "completed" => json!(self.completed),
      "withdrawn" => json!(self.withdrawn()),
      "parent_feedback" => json!(self.parent_feedback()),
      "birthdate_difference" => json!(self.birthdate_difference()),
      "video_privacy" => json!(self.video_privacy()),
      "databrary" => json!(self.databrary()),
      "is_preview" => json!(self.is_preview),
      "eligibility" => json!(self.eligibility),
      "sequence" => json!(self.sequence),

      "study__uuid" => json!(self.study.uuid),
      "study__name" => json!(self.study.name),
      "study__salt" => json!(self.study.salt),
      "study__hash_digits" => json!(self.study.hash_digits),

      "child__uuid" => json!(self.child.uuid),
      "child__given_name" => json!(self.child.given_name),
      "child__birthday" => json!(self.child.birthday),
      "child__gender" => json!(self.child.gender),
      "child__age_at_birth" => json!(self.child.age_at_birth),
      "child__language_list" => json!(self.child.language_list),
      "child__condition_list" => json!(self.child.condition_list),
      "child__additional_information" => {
        json!(self.child.additional_information)
      }
      "child__user__uuid" => json!(self.child.account.uuid),
      "child__user__nickname" => json!(self.child.account.nickname),

      "consent__ruling" => json!(self.consent_action()),
      "consent__arbiter" => json!(self.most_recent_ruling().map(|r| &r.arbiter)),
      "consent__time" => {
        json!(self.most_recent_ruling().map(|r| r.created_at.to_rfc3339()))
      }
      "consent__comment" => {
        json!(self.most_recent_ruling().and_then(|r| r.comment.as_ref()))
      }

      _ => return None,
    };
    Some(Cow::Owned(value))
  }
}

// ─── Projections ─────────────────────────────────────────────────────────────

/// A flat row of path → value pairs, as produced by a bulk projection query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Projection(pub BTreeMap<String, Value>);

impl Projection {
  pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Value)>) -> Self {
    Self(pairs.into_iter().collect())
  }

  pub fn insert(&mut self, path: impl Into<String>, value: Value) {
    self.0.insert(path.into(), value);
  }
}

impl FieldSource for Projection {
  fn field(&self, path: &str) -> Option<Cow<'_, Value>> {
    self.0.get(path).map(Cow::Borrowed)
  }
}
