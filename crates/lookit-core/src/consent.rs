//! Consent rulings and the append-only judgement log.
//!
//! A response starts out `pending` (no ruling rows). Researchers append
//! rulings; the current state is the action of the most recently inserted
//! row, ordered by row id rather than wall-clock time so that rulings written
//! in the same instant still have a well-defined winner. Prior rulings are
//! never modified and there is no terminal state.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// A researcher's judgement of a response's consent video.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConsentAction {
  Accepted,
  Rejected,
  #[default]
  Pending,
}

/// One row of the judgement log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRuling {
  /// Insertion order; strictly increasing per store.
  pub id:            i64,
  pub response_uuid: Uuid,
  pub action:        ConsentAction,
  /// Display name of the researcher who made the ruling.
  pub arbiter:       String,
  pub comment:       Option<String>,
  pub created_at:    DateTime<Utc>,
}

/// The authoritative ruling among `rulings`, if any.
pub fn most_recent_ruling(rulings: &[ConsentRuling]) -> Option<&ConsentRuling> {
  rulings.iter().max_by_key(|r| r.id)
}

/// The current consent state implied by `rulings`.
pub fn current_action(rulings: &[ConsentRuling]) -> ConsentAction {
  most_recent_ruling(rulings).map_or(ConsentAction::Pending, |r| r.action)
}

// ─── Batches ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::ResponseStore::record_rulings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRuling {
  pub response_uuid: Uuid,
  pub action:        ConsentAction,
  pub comment:       Option<String>,
}

/// A bulk ruling submission as posted by the consent manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulingBatch {
  pub accepted: Vec<Uuid>,
  pub rejected: Vec<Uuid>,
  pub pending:  Vec<Uuid>,
  /// Optional comment per response.
  pub comments: BTreeMap<Uuid, String>,
}

impl RulingBatch {
  /// Validate the batch and expand it into one [`NewRuling`] per response.
  ///
  /// Fails on an empty batch or when a response is named under more than one
  /// action. Comments for responses not in the batch are ignored.
  pub fn into_rulings(self) -> Result<Vec<NewRuling>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    let mut comments = self.comments;
    let groups = [
      (ConsentAction::Accepted, self.accepted),
      (ConsentAction::Rejected, self.rejected),
      (ConsentAction::Pending, self.pending),
    ];

    for (action, ids) in groups {
      for response_uuid in ids {
        if !seen.insert(response_uuid) {
          return Err(Error::DuplicateRuling(response_uuid));
        }
        out.push(NewRuling {
          response_uuid,
          action,
          comment: comments
            .remove(&response_uuid)
            .filter(|c| !c.trim().is_empty()),
        });
      }
    }

    if out.is_empty() {
      return Err(Error::EmptyBatch);
    }
    Ok(out)
  }
}

/// A response's current consent state together with its full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentStatus {
  pub response_uuid: Uuid,
  pub current:       ConsentAction,
  pub history:       Vec<ConsentRuling>,
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  fn ruling(id: i64, action: ConsentAction, at: DateTime<Utc>) -> ConsentRuling {
    ConsentRuling {
      id,
      response_uuid: Uuid::nil(),
      action,
      arbiter: "Dr. Arbiter".into(),
      comment: None,
      created_at: at,
    }
  }

  #[test]
  fn no_rulings_is_pending() {
    assert_eq!(current_action(&[]), ConsentAction::Pending);
    assert!(most_recent_ruling(&[]).is_none());
  }

  #[test]
  fn last_inserted_wins_under_flips() {
    use ConsentAction::*;
    let now = Utc::now();
    let sequence = [Accepted, Rejected, Pending, Accepted, Rejected, Accepted];

    let mut log = Vec::new();
    for (i, action) in sequence.iter().enumerate() {
      log.push(ruling(i as i64 + 1, *action, now));
      assert_eq!(current_action(&log), *action);
    }
  }

  #[test]
  fn ties_in_time_broken_by_row_id() {
    let now = Utc::now();
    let log = vec![
      ruling(7, ConsentAction::Rejected, now),
      ruling(3, ConsentAction::Accepted, now),
    ];
    assert_eq!(current_action(&log), ConsentAction::Rejected);
  }

  #[test]
  fn row_id_beats_clock_skew() {
    let now = Utc::now();
    let earlier = now - chrono::Duration::hours(1);
    let log = vec![
      ruling(1, ConsentAction::Accepted, now),
      ruling(2, ConsentAction::Rejected, earlier),
    ];
    assert_eq!(current_action(&log), ConsentAction::Rejected);
  }

  #[test]
  fn action_strings() {
    assert_eq!(ConsentAction::Accepted.to_string(), "accepted");
    assert_eq!(
      ConsentAction::from_str("rejected").unwrap(),
      ConsentAction::Rejected
    );
    assert!(ConsentAction::from_str("maybe").is_err());
  }

  #[test]
  fn batch_expands_with_comments() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let batch = RulingBatch {
      accepted: vec![a],
      rejected: vec![b],
      pending:  vec![],
      comments: BTreeMap::from([
        (b, "no audio".to_string()),
        (Uuid::new_v4(), "stray".to_string()),
      ]),
    };

    let rulings = batch.into_rulings().unwrap();
    assert_eq!(rulings.len(), 2);
    assert_eq!(rulings[0].response_uuid, a);
    assert_eq!(rulings[0].action, ConsentAction::Accepted);
    assert_eq!(rulings[0].comment, None);
    assert_eq!(rulings[1].action, ConsentAction::Rejected);
    assert_eq!(rulings[1].comment.as_deref(), Some("no audio"));
  }

  #[test]
  fn batch_rejects_conflicting_actions() {
    let a = Uuid::new_v4();
    let batch = RulingBatch {
      accepted: vec![a],
      pending: vec![a],
      ..Default::default()
    };
    assert!(matches!(batch.into_rulings(), Err(Error::DuplicateRuling(id)) if id == a));
  }

  #[test]
  fn empty_batch_is_rejected() {
    assert!(matches!(
      RulingBatch::default().into_rulings(),
      Err(Error::EmptyBatch)
    ));
  }

  #[test]
  fn batch_deserializes_from_form_shape() {
    let a = Uuid::new_v4();
    let batch: RulingBatch = serde_json::from_value(serde_json::json!({
      "accepted": [a],
      "comments": { (a.to_string()): "confirmed by email" },
    }))
    .unwrap();
    assert_eq!(batch.accepted, vec![a]);
    assert!(batch.rejected.is_empty());
    assert_eq!(batch.comments[&a], "confirmed by email");
  }
}
