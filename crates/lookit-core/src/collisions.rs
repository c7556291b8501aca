//! Hashed-ID collision diagnostics.
//!
//! Six-character hashed IDs can collide. The checker does not try to prevent
//! that; it reports any hashed ID shared by two distinct global IDs so a
//! researcher can review it by hand.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use uuid::Uuid;

use crate::{fields::FieldSource, hash};

/// One hashed ID claimed by more than one global ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
  pub hashed_id:  String,
  pub global_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollisionReport {
  pub child:       Vec<Collision>,
  pub participant: Vec<Collision>,
}

impl CollisionReport {
  pub fn is_empty(&self) -> bool { self.child.is_empty() && self.participant.is_empty() }

  /// Human-readable summary. Empty when there is nothing to report.
  pub fn message(&self) -> String {
    let mut lines = Vec::new();
    for (kind, collisions) in [("child", &self.child), ("participant", &self.participant)] {
      for c in collisions {
        let ids: Vec<String> = c.global_ids.iter().map(Uuid::to_string).collect();
        lines.push(format!(
          "Collision in {kind} hashed id {}: global ids {}",
          c.hashed_id,
          ids.join(", ")
        ));
      }
    }
    lines.join("\n")
  }
}

/// Accumulates hashed → global ID mappings across an export.
#[derive(Debug, Default)]
pub struct CollisionChecker {
  child:       BTreeMap<String, BTreeSet<Uuid>>,
  participant: BTreeMap<String, BTreeSet<Uuid>>,
}

impl CollisionChecker {
  pub fn new() -> Self { Self::default() }

  /// Record one response's child and participant IDs. Records missing either
  /// side are skipped for that side only.
  pub fn observe(&mut self, src: &dyn FieldSource) {
    if let (Some(global), Some(hashed)) =
      (src.uuid("child__uuid"), hash::child_hashed_id(src))
    {
      self.child.entry(hashed).or_default().insert(global);
    }
    if let (Some(global), Some(hashed)) =
      (src.uuid("child__user__uuid"), hash::participant_hashed_id(src))
    {
      self.participant.entry(hashed).or_default().insert(global);
    }
  }

  pub fn report(&self) -> CollisionReport {
    CollisionReport {
      child:       collisions(&self.child),
      participant: collisions(&self.participant),
    }
  }
}

fn collisions(seen: &BTreeMap<String, BTreeSet<Uuid>>) -> Vec<Collision> {
  seen
    .iter()
    .filter(|(_, ids)| ids.len() > 1)
    .map(|(hashed_id, ids)| Collision {
      hashed_id:  hashed_id.clone(),
      global_ids: ids.iter().copied().collect(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::{fields::Projection, fixtures};

  fn projection(child: Uuid, account: Uuid, digits: usize) -> Projection {
    let study = fixtures::study();
    Projection::from_pairs([
      ("study__uuid".to_owned(), json!(study.uuid)),
      ("study__salt".to_owned(), json!(study.salt)),
      ("study__hash_digits".to_owned(), json!(digits)),
      ("child__uuid".to_owned(), json!(child)),
      ("child__user__uuid".to_owned(), json!(account)),
    ])
  }

  #[test]
  fn repeated_sessions_are_not_collisions() {
    let mut checker = CollisionChecker::new();
    let record = fixtures::record();
    checker.observe(&record);
    checker.observe(&record);
    assert!(checker.report().is_empty());
    assert_eq!(checker.report().message(), "");
  }

  #[test]
  fn truncated_ids_collide() {
    // With a single character, 40 distinct children must share some IDs.
    let mut checker = CollisionChecker::new();
    let account = Uuid::new_v4();
    for _ in 0..40 {
      checker.observe(&projection(Uuid::new_v4(), account, 1));
    }

    let report = checker.report();
    assert!(!report.child.is_empty());
    assert!(report.participant.is_empty());
    assert!(report.message().starts_with("Collision in child hashed id"));
    for c in &report.child {
      assert!(c.global_ids.len() > 1);
    }
  }

  #[test]
  fn records_without_ids_are_skipped() {
    let mut checker = CollisionChecker::new();
    checker.observe(&Projection::default());
    assert!(checker.report().is_empty());
  }
}
