//! Researcher identity and per-study permissions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
  /// Download response and demographic data for real (non-preview) sessions.
  ReadResponseData,
  /// Download data generated by previewing the study.
  ReadPreviewData,
  /// Submit consent rulings.
  CodeConsent,
}

/// An authenticated researcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Researcher {
  pub username:     String,
  /// Shown as the arbiter on consent rulings.
  pub display_name: String,
  #[serde(default)]
  pub permissions:  BTreeSet<Permission>,
  #[serde(default)]
  pub studies:      BTreeSet<Uuid>,
}

impl Researcher {
  pub fn can(&self, permission: Permission) -> bool {
    self.permissions.contains(&permission)
  }

  pub fn can_access(&self, study: Uuid) -> bool { self.studies.contains(&study) }

  /// Which slices of a study's responses this researcher may read.
  pub fn scope(&self) -> PermissionScope {
    PermissionScope {
      real:    self.can(Permission::ReadResponseData),
      preview: self.can(Permission::ReadPreviewData),
    }
  }
}

/// Which responses a query may return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionScope {
  /// Responses from real participants.
  pub real:    bool,
  /// Responses generated while previewing the study.
  pub preview: bool,
}

impl PermissionScope {
  pub const ALL: Self = Self { real: true, preview: true };

  pub fn is_empty(&self) -> bool { !self.real && !self.preview }

  pub fn admits(&self, is_preview: bool) -> bool {
    if is_preview { self.preview } else { self.real }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn scope_follows_permissions() {
    let researcher = Researcher {
      username:     "ada".into(),
      display_name: "Ada L.".into(),
      permissions:  [Permission::ReadPreviewData].into(),
      studies:      BTreeSet::new(),
    };
    let scope = researcher.scope();
    assert!(!scope.real);
    assert!(scope.preview);
    assert!(scope.admits(true));
    assert!(!scope.admits(false));
    assert!(!researcher.can_access(Uuid::new_v4()));
  }

  #[test]
  fn permission_names() {
    assert_eq!(Permission::CodeConsent.to_string(), "code_consent");
    assert_eq!(
      Permission::from_str("read_response_data").unwrap(),
      Permission::ReadResponseData
    );
  }
}
