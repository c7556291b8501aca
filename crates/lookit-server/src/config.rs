//! Server configuration, read from `config.toml` and `LOOKIT_*` variables.

use std::{
  collections::BTreeSet,
  path::{Path, PathBuf},
};

use lookit_core::access::{Permission, Researcher};
use serde::Deserialize;
use uuid::Uuid;

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  /// Public origin used to build signed media links.
  pub base_url:            String,
  pub store_path:          PathBuf,
  /// Directory holding video objects and generated exports.
  pub media_root:          PathBuf,
  pub signing_secret:      String,
  #[serde(default = "default_ttl")]
  pub signed_url_ttl_secs: u64,
  #[serde(default)]
  pub researchers:         Vec<ResearcherAccount>,
}

/// A researcher login.
#[derive(Debug, Deserialize, Clone)]
pub struct ResearcherAccount {
  pub username:      String,
  pub display_name:  String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  #[serde(default)]
  pub permissions:   BTreeSet<Permission>,
  #[serde(default)]
  pub studies:       BTreeSet<Uuid>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_ttl() -> u64 { 60 }

impl ServerConfig {
  /// Layer `LOOKIT_*` environment variables over the file at `path`. A
  /// missing file is not an error.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    let mut cfg: Self = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("LOOKIT"))
      .build()?
      .try_deserialize()?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    cfg.media_root = expand_tilde(&cfg.media_root);
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

impl ResearcherAccount {
  pub fn researcher(&self) -> Researcher {
    Researcher {
      username:     self.username.clone(),
      display_name: self.display_name.clone(),
      permissions:  self.permissions.clone(),
      studies:      self.studies.clone(),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn loads_file_with_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
      file,
      r#"
base_url       = "http://localhost:8080"
store_path     = "/var/lib/lookit/lookit.db"
media_root     = "/var/lib/lookit/media"
signing_secret = "s3cret"

[[researchers]]
username      = "rsmith"
display_name  = "Dr. Smith"
password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaA"
permissions   = ["read_response_data", "code_consent"]
studies       = ["6f1c1bd4-3f57-4c1c-8a3c-5f5a8a47c001"]
"#
    )
    .unwrap();

    let cfg = ServerConfig::load(file.path()).unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.signed_url_ttl_secs, 60);
    assert_eq!(cfg.researchers.len(), 1);

    let researcher = cfg.researchers[0].researcher();
    assert!(researcher.can(Permission::CodeConsent));
    assert!(!researcher.can(Permission::ReadPreviewData));
    assert!(researcher.can_access("6f1c1bd4-3f57-4c1c-8a3c-5f5a8a47c001".parse().unwrap()));
  }

  #[test]
  fn tilde_expands_only_as_prefix() {
    let plain = Path::new("/data/~/lookit.db");
    assert_eq!(expand_tilde(plain), plain);
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expand_tilde(Path::new("~/lookit.db")), Path::new(&home).join("lookit.db"));
    }
  }
}
