//! Cell rendering and the CSV writer configuration shared by every builder.

use std::{borrow::Cow, io::Write};

use serde_json::Value;

use crate::Result;

/// Every field is quoted so spreadsheet tools keep values such as `007` or
/// `1e3` as text.
pub fn csv_writer<W: Write>(out: W) -> csv::Writer<W> {
  csv::WriterBuilder::new()
    .quote_style(csv::QuoteStyle::Always)
    .from_writer(out)
}

/// Render one JSON value as a CSV cell. `Null` (and a missing value) is the
/// empty string; containers are written as compact JSON.
pub fn cell(value: Option<&Value>) -> Cow<'_, str> {
  match value {
    None | Some(Value::Null) => Cow::Borrowed(""),
    Some(Value::String(s)) => Cow::Borrowed(s),
    Some(Value::Bool(b)) => Cow::Borrowed(if *b { "true" } else { "false" }),
    Some(Value::Number(n)) => Cow::Owned(n.to_string()),
    Some(other) => Cow::Owned(other.to_string()),
  }
}

/// A two-column `column,description` dictionary.
pub fn dictionary_csv<'a>(
  rows: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<Vec<u8>> {
  let mut writer = csv_writer(Vec::new());
  writer.write_record(["column", "description"])?;
  for (column, description) in rows {
    writer.write_record([column, description])?;
  }
  finish(writer)
}

pub(crate) fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
  writer.into_inner().map_err(|e| e.into_error().into())
}
