//! Response overview exports: CSV, JSON, and the column dictionary.

use std::{collections::BTreeSet, io::Write};

use lookit_core::{
  columns::{RESPONSES, Selection},
  fields::FieldSource,
  store::{ResponseQuery, ResponseStore},
  study::Study,
};
use serde_json::Value;
use tracing::info;

use crate::{
  Artifact, DatasetLabel, Error, ExportFormat, Result,
  format::{CSV_CONTENT_TYPE, JSON_CONTENT_TYPE, export_filename},
  pages::for_each_response_page,
  render::{cell, csv_writer, dictionary_csv, finish},
};

/// Build the download for `format`. The frame data archive is never held in
/// memory; callers build it with [`crate::framedata::archive_file`] instead.
pub async fn download<S: ResponseStore>(
  store: &S,
  study: &Study,
  query: &ResponseQuery,
  format: ExportFormat,
  selection: &Selection,
) -> Result<Artifact> {
  match format {
    ExportFormat::Csv => responses_csv(store, study, query, selection).await,
    ExportFormat::Json => responses_json(store, study, query, selection).await,
    ExportFormat::Framedata => Err(Error::UnsupportedFormat(format.to_string())),
  }
}

/// One row per response. Nested columns widen the header with one column per
/// leaf key seen anywhere in the recordset.
pub async fn responses_csv<S: ResponseStore>(
  store: &S,
  study: &Study,
  query: &ResponseQuery,
  selection: &Selection,
) -> Result<Artifact> {
  let mut keys = BTreeSet::new();
  for_each_response_page(store, query, |page| {
    for record in page {
      keys.extend(RESPONSES.csv_row(selection, record).into_keys());
    }
    Ok(())
  })
  .await?;

  let header = RESPONSES.header(selection, &keys);
  let mut writer = csv_writer(Vec::new());
  writer.write_record(&header)?;

  let rows = for_each_response_page(store, query, |page| {
    for record in page {
      let row = RESPONSES.csv_row(selection, record);
      writer.write_record(header.iter().map(|h| cell(row.get(h)).into_owned()))?;
    }
    Ok(())
  })
  .await?;

  info!(study = %study.uuid, rows, "built response csv");
  Ok(Artifact {
    filename:     export_filename(
      &study.name,
      DatasetLabel::Responses,
      RESPONSES.is_identifiable(selection),
      "csv",
    ),
    content_type: CSV_CONTENT_TYPE,
    bytes:        finish(writer)?,
  })
}

/// A JSON array with one object per response, grouped by column prefix and
/// carrying the raw experiment payload.
pub async fn responses_json<S: ResponseStore>(
  store: &S,
  study: &Study,
  query: &ResponseQuery,
  selection: &Selection,
) -> Result<Artifact> {
  let mut out = Vec::new();
  out.write_all(b"[")?;
  let mut first = true;

  let rows = for_each_response_page(store, query, |page| {
    for record in page {
      let mut object = RESPONSES.json_record(selection, record);
      for path in ["exp_data", "global_event_timings"] {
        let value = record
          .field(path)
          .map(|v| v.into_owned())
          .unwrap_or(Value::Null);
        object.insert(path.to_owned(), value);
      }

      let separator: &[u8] = if first { b"\n" } else { b",\n" };
      out.write_all(separator)?;
      serde_json::to_writer_pretty(&mut out, &object)?;
      first = false;
    }
    Ok(())
  })
  .await?;
  out.write_all(b"\n]\n")?;

  info!(study = %study.uuid, rows, "built response json");
  Ok(Artifact {
    filename:     export_filename(
      &study.name,
      DatasetLabel::Responses,
      RESPONSES.is_identifiable(selection),
      "json",
    ),
    content_type: JSON_CONTENT_TYPE,
    bytes:        out,
  })
}

/// Column descriptions for the selected columns; reads no response data.
pub fn responses_dictionary(study: &Study, selection: &Selection) -> Result<Artifact> {
  Ok(Artifact {
    filename:     export_filename(
      &study.name,
      DatasetLabel::ResponsesDict,
      RESPONSES.is_identifiable(selection),
      "csv",
    ),
    content_type: CSV_CONTENT_TYPE,
    bytes:        dictionary_csv(RESPONSES.dictionary(selection))?,
  })
}
