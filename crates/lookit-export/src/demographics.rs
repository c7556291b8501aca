//! Demographic snapshot exports, built from flat projections.

use std::{collections::BTreeSet, io::Write};

use lookit_core::{
  columns::{DEMOGRAPHICS, Selection},
  store::{ResponseQuery, ResponseStore},
  study::Study,
};
use tracing::info;

use crate::{
  Artifact, DatasetLabel, Error, ExportFormat, Result,
  format::{CSV_CONTENT_TYPE, JSON_CONTENT_TYPE, export_filename},
  pages::for_each_projection_page,
  render::{cell, csv_writer, dictionary_csv, finish},
};

/// Build the download for `format`. Demographics have no frame data.
pub async fn download<S: ResponseStore>(
  store: &S,
  study: &Study,
  query: &ResponseQuery,
  format: ExportFormat,
  selection: &Selection,
) -> Result<Artifact> {
  match format {
    ExportFormat::Csv => demographics_csv(store, study, query, selection).await,
    ExportFormat::Json => demographics_json(store, study, query, selection).await,
    ExportFormat::Framedata => Err(Error::UnsupportedFormat(format.to_string())),
  }
}

pub async fn demographics_csv<S: ResponseStore>(
  store: &S,
  study: &Study,
  query: &ResponseQuery,
  selection: &Selection,
) -> Result<Artifact> {
  let mut keys = BTreeSet::new();
  for_each_projection_page(store, query, |page| {
    for projection in page {
      keys.extend(DEMOGRAPHICS.csv_row(selection, projection).into_keys());
    }
    Ok(())
  })
  .await?;

  let header = DEMOGRAPHICS.header(selection, &keys);
  let mut writer = csv_writer(Vec::new());
  writer.write_record(&header)?;

  let rows = for_each_projection_page(store, query, |page| {
    for projection in page {
      let row = DEMOGRAPHICS.csv_row(selection, projection);
      writer.write_record(header.iter().map(|h| cell(row.get(h)).into_owned()))?;
    }
    Ok(())
  })
  .await?;

  info!(study = %study.uuid, rows, "built demographic csv");
  Ok(Artifact {
    filename:     export_filename(
      &study.name,
      DatasetLabel::Demographics,
      DEMOGRAPHICS.is_identifiable(selection),
      "csv",
    ),
    content_type: CSV_CONTENT_TYPE,
    bytes:        finish(writer)?,
  })
}

pub async fn demographics_json<S: ResponseStore>(
  store: &S,
  study: &Study,
  query: &ResponseQuery,
  selection: &Selection,
) -> Result<Artifact> {
  let mut out = Vec::new();
  out.write_all(b"[")?;
  let mut first = true;

  for_each_projection_page(store, query, |page| {
    for projection in page {
      let object = DEMOGRAPHICS.json_record(selection, projection);
      let separator: &[u8] = if first { b"\n" } else { b",\n" };
      out.write_all(separator)?;
      serde_json::to_writer_pretty(&mut out, &object)?;
      first = false;
    }
    Ok(())
  })
  .await?;
  out.write_all(b"\n]\n")?;

  Ok(Artifact {
    filename:     export_filename(
      &study.name,
      DatasetLabel::Demographics,
      DEMOGRAPHICS.is_identifiable(selection),
      "json",
    ),
    content_type: JSON_CONTENT_TYPE,
    bytes:        out,
  })
}

pub fn demographics_dictionary(study: &Study, selection: &Selection) -> Result<Artifact> {
  Ok(Artifact {
    filename:     export_filename(
      &study.name,
      DatasetLabel::DemographicsDict,
      DEMOGRAPHICS.is_identifiable(selection),
      "csv",
    ),
    content_type: CSV_CONTENT_TYPE,
    bytes:        dictionary_csv(DEMOGRAPHICS.dictionary(selection))?,
  })
}
