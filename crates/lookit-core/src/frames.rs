//! Frame-level rows for the per-session frame data export.
//!
//! Each response's experiment payload becomes a list of
//! `(response_uuid, child_hashed_id, frame_id, event_number, key, value)`
//! rows. Global timed events come first with `frame_id = "global"`, then every
//! frame in payload order. Which keys are left out is decided by
//! [`EXCLUSION_RULES`], an ordered list of named predicates.

use std::borrow::Cow;

use serde_json::Value;
use uuid::Uuid;

use crate::{
  fields::FieldSource,
  flatten::{flatten, flatten_under},
  hash,
};

/// `frame_id` used for session-level events.
pub const GLOBAL_FRAME_ID: &str = "global";

const EVENT_TIMINGS_PREFIX: &str = "eventTimings.";

/// Columns of the frame data export, with their dictionary descriptions.
pub const FRAME_DATA_COLUMNS: &[(&str, &str)] = &[
  (
    "response_uuid",
    "Unique identifier for this response; can be matched to summary data \
     and video filenames",
  ),
  (
    "child_hashed_id",
    "Hashed identifier for the child associated with this response; unique \
     per child within this study",
  ),
  (
    "frame_id",
    "Identifier for the particular frame responsible for this data; matches \
     up to an element in the response_sequence in the summary data file. \
     Session-level events use \"global\".",
  ),
  (
    "event_number",
    "Index of the event within the frame's eventTimings (or within the \
     session's global events); blank for data not tied to an event",
  ),
  (
    "key",
    "Label for a piece of data collected during this frame. Nested data is \
     flattened into dot-separated keys, e.g. formData.child_favorite_animal",
  ),
  ("value", "Value of the data associated with this key"),
];

// ─── Exclusion rules ─────────────────────────────────────────────────────────

/// What an exclusion rule may know about the frame a key belongs to.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
  pub frame_id:   &'a str,
  pub frame_type: Option<&'a str>,
}

/// A named predicate over a top-level frame key. Returning `true` drops the
/// key and everything nested under it.
#[derive(Clone, Copy)]
pub struct ExclusionRule {
  pub name:     &'static str,
  pub excludes: fn(&str, &Value, &FrameContext<'_>) -> bool,
}

impl std::fmt::Debug for ExclusionRule {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("ExclusionRule").field(&self.name).finish()
  }
}

/// Rules applied to every frame, in order.
pub const EXCLUSION_RULES: &[ExclusionRule] = &[
  ExclusionRule { name: "frame_type", excludes: |key, _, _| key == "frameType" },
  ExclusionRule {
    name:     "exit_birth_date",
    excludes: |key, _, ctx| key == "birthDate" && ctx.frame_type == Some("EXIT"),
  },
  ExclusionRule {
    name:     "empty_generated_properties",
    excludes: |key, value, _| key == "generatedProperties" && is_falsy(value),
  },
];

fn is_falsy(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::Bool(b) => !b,
    Value::Number(n) => n.as_f64() == Some(0.0),
    Value::String(s) => s.is_empty(),
    Value::Array(items) => items.is_empty(),
    Value::Object(map) => map.is_empty(),
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// One flattened key/value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDataRow<'a> {
  pub response_uuid:   Uuid,
  pub child_hashed_id: &'a str,
  pub frame_id:        &'a str,
  pub event_number:    Option<usize>,
  pub key:             String,
  pub value:           &'a Value,
}

/// The inputs the flattener needs from one response.
#[derive(Debug, Clone)]
pub struct FrameSource<'a> {
  pub response_uuid:        Uuid,
  pub child_hashed_id:      String,
  pub exp_data:             Cow<'a, Value>,
  pub global_event_timings: Cow<'a, Value>,
  rules:                    &'static [ExclusionRule],
}

impl<'a> FrameSource<'a> {
  /// Gather the flattener's inputs from a record or projection. `None` when
  /// the source has no response UUID.
  pub fn from_fields(src: &'a dyn FieldSource) -> Option<Self> {
    Some(Self {
      response_uuid:        src.uuid("uuid")?,
      child_hashed_id:      hash::child_hashed_id(src).unwrap_or_default(),
      exp_data:             src.field("exp_data").unwrap_or(Cow::Owned(Value::Null)),
      global_event_timings: src
        .field("global_event_timings")
        .unwrap_or(Cow::Owned(Value::Null)),
      rules:                EXCLUSION_RULES,
    })
  }

  /// Replace the default exclusion rules.
  pub fn with_rules(mut self, rules: &'static [ExclusionRule]) -> Self {
    self.rules = rules;
    self
  }

  fn excluded(&self, key: &str, value: &Value, ctx: &FrameContext<'_>) -> bool {
    self.rules.iter().any(|rule| (rule.excludes)(key, value, ctx))
  }

  /// All rows for this response, produced lazily.
  pub fn rows(&self) -> impl Iterator<Item = FrameDataRow<'_>> + '_ {
    self.global_rows().chain(self.frame_rows())
  }

  fn global_rows(&self) -> impl Iterator<Item = FrameDataRow<'_>> + '_ {
    let events = self.global_event_timings.as_array().map(Vec::as_slice);
    events
      .unwrap_or_default()
      .iter()
      .enumerate()
      .flat_map(move |(index, event)| {
        flatten(event).map(move |(key, value)| FrameDataRow {
          response_uuid: self.response_uuid,
          child_hashed_id: &self.child_hashed_id,
          frame_id: GLOBAL_FRAME_ID,
          event_number: Some(index),
          key,
          value,
        })
      })
  }

  fn frame_rows(&self) -> impl Iterator<Item = FrameDataRow<'_>> + '_ {
    self
      .exp_data
      .as_object()
      .into_iter()
      .flatten()
      .filter_map(|(frame_id, frame)| Some((frame_id, frame.as_object()?)))
      .flat_map(move |(frame_id, frame)| {
        let ctx = FrameContext {
          frame_id,
          frame_type: frame.get("frameType").and_then(Value::as_str),
        };
        frame
          .iter()
          .filter(move |(key, value)| !self.excluded(key, value, &ctx))
          .flat_map(move |(key, value)| {
            flatten_under(key.clone(), value).map(move |(path, value)| {
              let (event_number, key) = split_event_key(path);
              FrameDataRow {
                response_uuid: self.response_uuid,
                child_hashed_id: &self.child_hashed_id,
                frame_id: frame_id.as_str(),
                event_number,
                key,
                value,
              }
            })
          })
      })
  }
}

/// `eventTimings.3.eventType` → `(Some(3), "eventType")`. Keys outside
/// `eventTimings` pass through unchanged.
fn split_event_key(path: String) -> (Option<usize>, String) {
  let Some(rest) = path.strip_prefix(EVENT_TIMINGS_PREFIX) else {
    return (None, path);
  };
  let (index, key) = rest.split_once('.').unwrap_or((rest, ""));
  match index.parse() {
    Ok(n) => (Some(n), key.to_owned()),
    Err(_) => (None, path),
  }
}
