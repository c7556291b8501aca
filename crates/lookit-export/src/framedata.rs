//! Frame data exports: one CSV per response, the per-session ZIP archive,
//! and the frame data dictionary.
//!
//! Large studies produce frame data in the tens of megabytes, so the archive
//! holds one bounded CSV per response and is written straight to the caller's
//! sink. [`archive_file`] uses a temporary file as that sink.

use std::{
  collections::BTreeSet,
  io::{Seek, Write},
};

use lookit_core::{
  fields::FieldSource,
  frames::{FRAME_DATA_COLUMNS, FrameSource},
  store::{ResponseQuery, ResponseStore},
  study::Study,
};
use tempfile::NamedTempFile;
use tracing::info;
use zip::{ZipWriter, write::SimpleFileOptions};

use crate::{
  Artifact, DatasetLabel, Result,
  format::{CSV_CONTENT_TYPE, export_filename, frame_filename},
  pages::for_each_response_page,
  render::{cell, csv_writer, finish},
};

pub fn archive_filename(study: &Study) -> String {
  export_filename(&study.name, DatasetLabel::FramedataArchive, false, "zip")
}

/// Frame data CSV for one response. A source without a response UUID yields
/// a header-only file.
pub fn response_frames_csv(src: &dyn FieldSource) -> Result<Vec<u8>> {
  let mut writer = csv_writer(Vec::new());
  writer.write_record(FRAME_DATA_COLUMNS.iter().map(|(name, _)| name))?;

  if let Some(source) = FrameSource::from_fields(src) {
    for row in source.rows() {
      let response_uuid = row.response_uuid.to_string();
      let event_number = row.event_number.map(|n| n.to_string()).unwrap_or_default();
      let value = cell(Some(row.value));
      writer.write_record([
        response_uuid.as_str(),
        row.child_hashed_id,
        row.frame_id,
        event_number.as_str(),
        row.key.as_str(),
        &*value,
      ])?;
    }
  }
  finish(writer)
}

/// Single-response download.
pub fn response_frames(study: &Study, src: &dyn FieldSource) -> Result<Artifact> {
  let response = src.uuid("uuid").unwrap_or_default();
  Ok(Artifact {
    filename:     frame_filename(&study.name, response),
    content_type: CSV_CONTENT_TYPE,
    bytes:        response_frames_csv(src)?,
  })
}

/// Write a ZIP with one frame data CSV per response. Returns the number of
/// entries written.
pub async fn write_archive<S, W>(
  store: &S,
  study: &Study,
  query: &ResponseQuery,
  out: W,
) -> Result<usize>
where
  S: ResponseStore,
  W: Write + Seek,
{
  let options = SimpleFileOptions::default()
    .compression_method(zip::CompressionMethod::Deflated)
    .last_modified_time(zip::DateTime::default());
  let mut zip = ZipWriter::new(out);

  let entries = for_each_response_page(store, query, |page| {
    for record in page {
      zip.start_file(frame_filename(&study.name, record.uuid), options)?;
      zip.write_all(&response_frames_csv(record)?)?;
    }
    Ok(())
  })
  .await?;
  zip.finish()?;

  info!(study = %study.uuid, entries, "built frame data archive");
  Ok(entries)
}

/// Build the archive in a temporary file, removed when the handle drops.
pub async fn archive_file<S: ResponseStore>(
  store: &S,
  study: &Study,
  query: &ResponseQuery,
) -> Result<NamedTempFile> {
  let mut file = NamedTempFile::new()?;
  write_archive(store, study, query, file.as_file_mut()).await?;
  Ok(file)
}

/// Standard column descriptions followed by every `(frame_id, key)` pair seen
/// anywhere in the recordset.
pub async fn framedata_dictionary<S: ResponseStore>(
  store: &S,
  study: &Study,
  query: &ResponseQuery,
) -> Result<Artifact> {
  let mut observed = BTreeSet::new();
  for_each_response_page(store, query, |page| {
    for record in page {
      if let Some(source) = FrameSource::from_fields(record) {
        observed.extend(source.rows().map(|row| (row.frame_id.to_owned(), row.key)));
      }
    }
    Ok(())
  })
  .await?;

  let mut writer = csv_writer(Vec::new());
  writer.write_record(["frame_id", "key", "description"])?;
  for &(column, description) in FRAME_DATA_COLUMNS {
    writer.write_record(["", column, description])?;
  }
  for (frame_id, key) in &observed {
    writer.write_record([frame_id.as_str(), key.as_str(), ""])?;
  }

  info!(study = %study.uuid, keys = observed.len(), "built frame data dictionary");
  Ok(Artifact {
    filename:     export_filename(&study.name, DatasetLabel::FramedataDict, false, "csv"),
    content_type: CSV_CONTENT_TYPE,
    bytes:        finish(writer)?,
  })
}
