//! Output formats, dataset labels and file naming.

use std::str::FromStr;

use strum::{AsRefStr, Display};
use uuid::Uuid;

use crate::Error;

/// The data-type selector of a download request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
  Csv,
  Json,
  /// A ZIP holding one frame data CSV per response.
  Framedata,
}

impl FromStr for ExportFormat {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "csv" => Ok(Self::Csv),
      "json" => Ok(Self::Json),
      "framedata" => Ok(Self::Framedata),
      other => Err(Error::UnsupportedFormat(other.to_owned())),
    }
  }
}

/// What a file contains; becomes part of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum DatasetLabel {
  #[strum(serialize = "all-responses")]
  Responses,
  #[strum(serialize = "all-responses-dict")]
  ResponsesDict,
  #[strum(serialize = "all-demographic-snapshots")]
  Demographics,
  #[strum(serialize = "all-demographic-snapshots-dict")]
  DemographicsDict,
  #[strum(serialize = "all-frames-dict")]
  FramedataDict,
  #[strum(serialize = "framedata_per_session")]
  FramedataArchive,
}

/// Replace every character that is not an ASCII letter or digit with `-`.
pub fn sanitize(name: &str) -> String {
  name
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
    .collect()
}

/// `{study}_{label}[-identifiable].{ext}`
pub fn export_filename(
  study_name: &str,
  label: DatasetLabel,
  identifiable: bool,
  ext: &str,
) -> String {
  let suffix = if identifiable { "-identifiable" } else { "" };
  format!("{}_{label}{suffix}.{ext}", sanitize(study_name))
}

/// Name of one response's frame data CSV, inside or outside an archive.
pub fn frame_filename(study_name: &str, response: Uuid) -> String {
  format!("{}_{response}_frames.csv", sanitize(study_name))
}

// ─── Artifact ────────────────────────────────────────────────────────────────

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A finished, downloadable export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
  pub filename:     String,
  pub content_type: &'static str,
  pub bytes:        Vec<u8>,
}
