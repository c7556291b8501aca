//! Studies, family accounts, children and demographic snapshots.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::hash::DEFAULT_HASH_DIGITS;

// ─── Study ───────────────────────────────────────────────────────────────────

/// A study definition, reduced to what the response pipeline needs.
///
/// `salt` and `hash_digits` are fixed when the study is created. Changing
/// either would silently re-key every hashed ID already published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Study {
  pub uuid:        Uuid,
  pub name:        String,
  pub salt:        Uuid,
  #[serde(default = "default_hash_digits")]
  pub hash_digits: usize,
  pub created_at:  DateTime<Utc>,
}

fn default_hash_digits() -> usize { DEFAULT_HASH_DIGITS }

impl Study {
  /// A new study with a fresh UUID and salt.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      uuid:        Uuid::new_v4(),
      name:        name.into(),
      salt:        Uuid::new_v4(),
      hash_digits: DEFAULT_HASH_DIGITS,
      created_at:  Utc::now(),
    }
  }
}

// ─── Family ──────────────────────────────────────────────────────────────────

/// The parent/family account that registers children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub uuid:     Uuid,
  pub nickname: Option<String>,
}

/// A child registered under a family account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
  pub uuid:                   Uuid,
  pub account:                Account,
  pub given_name:             String,
  pub birthday:               Option<NaiveDate>,
  /// One of `m`, `f`, `o`, `na`.
  pub gender:                 Option<String>,
  pub age_at_birth:           Option<String>,
  /// Space-separated ISO 639-1 codes.
  #[serde(default)]
  pub language_list:          String,
  #[serde(default)]
  pub condition_list:         String,
  #[serde(default)]
  pub additional_information: String,
}

// ─── Demographics ────────────────────────────────────────────────────────────

/// Parent-reported household data.
///
/// A new snapshot is written whenever the parent edits the demographic form;
/// responses keep pointing at the snapshot that was current when they were
/// created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemographicSnapshot {
  pub uuid:                            Uuid,
  pub account_uuid:                    Uuid,
  pub created_at:                      DateTime<Utc>,
  pub number_of_children:              Option<String>,
  pub child_birthdays:                 Vec<NaiveDate>,
  pub languages_spoken_at_home:        Option<String>,
  pub number_of_guardians:             Option<String>,
  pub number_of_guardians_explanation: Option<String>,
  pub race_identification:             Vec<String>,
  pub age:                             Option<String>,
  pub gender:                          Option<String>,
  pub education_level:                 Option<String>,
  pub spouse_education_level:          Option<String>,
  pub annual_income:                   Option<String>,
  pub number_of_books:                 Option<i64>,
  pub additional_comments:             Option<String>,
  pub country:                         Option<String>,
  pub state:                           Option<String>,
  pub density:                         Option<String>,
  pub lookit_referrer:                 Option<String>,
}

impl DemographicSnapshot {
  /// Every field name answered by [`DemographicSnapshot::field`].
  pub const FIELDS: &'static [&'static str] = &[
    "uuid",
    "created_at",
    "number_of_children",
    "child_birthdays",
    "languages_spoken_at_home",
    "number_of_guardians",
    "number_of_guardians_explanation",
    "race_identification",
    "age",
    "gender",
    "education_level",
    "spouse_education_level",
    "annual_income",
    "number_of_books",
    "additional_comments",
    "country",
    "state",
    "density",
    "lookit_referrer",
  ];

  /// Look up a single field as JSON. Unset optional fields are `Null`;
  /// unknown names are `None`.
  pub fn field(&self, name: &str) -> Option<Value> {
    let value = match name {
      "uuid" => json!(self.uuid),
      "created_at" => json!(self.created_at.to_rfc3339()),
      "number_of_children" => json!(self.number_of_children),
      "child_birthdays" => json!(self.child_birthdays),
      "languages_spoken_at_home" => json!(self.languages_spoken_at_home),
      "number_of_guardians" => json!(self.number_of_guardians),
      "number_of_guardians_explanation" => {
        json!(self.number_of_guardians_explanation)
      }
      "race_identification" => json!(self.race_identification),
      "age" => json!(self.age),
      "gender" => json!(self.gender),
      "education_level" => json!(self.education_level),
      "spouse_education_level" => json!(self.spouse_education_level),
      "annual_income" => json!(self.annual_income),
      "number_of_books" => json!(self.number_of_books),
      "additional_comments" => json!(self.additional_comments),
      "country" => json!(self.country),
      "state" => json!(self.state),
      "density" => json!(self.density),
      "lookit_referrer" => json!(self.lookit_referrer),
      _ => return None,
    };
    Some(value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_listed_field_resolves() {
    let snapshot = DemographicSnapshot::default();
    for name in DemographicSnapshot::FIELDS {
      assert!(snapshot.field(name).is_some(), "{name} not resolvable");
    }
    assert!(snapshot.field("favourite_colour").is_none());
  }

  #[test]
  fn study_defaults_to_six_digits() {
    let study: Study = serde_json::from_value(json!({
      "uuid": Uuid::new_v4(),
      "name": "Baby physics",
      "salt": Uuid::new_v4(),
      "created_at": "2020-01-01T00:00:00Z",
    }))
    .unwrap();
    assert_eq!(study.hash_digits, 6);
  }
}
