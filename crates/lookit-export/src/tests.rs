//! Export builders driven end to end against an in-memory SQLite store.

use std::io::Cursor;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use lookit_core::{
  access::PermissionScope,
  columns::{DEMOGRAPHICS, RESPONSES},
  consent::{ConsentAction, NewRuling},
  response::NewResponse,
  store::{ResponseQuery, ResponseStore},
  study::{Account, Child, DemographicSnapshot, Study},
};
use lookit_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  Error, ExportFormat, demographics,
  format::frame_filename,
  framedata, pages, responses,
};

struct Seeded {
  store:    SqliteStore,
  study:    Study,
  real:     Uuid,
  preview:  Uuid,
  rejected: Uuid,
}

fn exp_data() -> Value {
  json!({
    "0-video-config": {
      "frameType": "DEFAULT",
      "eventTimings": [
        { "eventType": "nextFrame", "timestamp": "2020-03-03T12:00:05Z" },
      ],
    },
    "2-test-trial": {
      "frameType": "DEFAULT",
      "selectedImage": "left",
      "generatedProperties": {},
    },
    "4-exit-survey": {
      "frameType": "EXIT",
      "birthDate": "2019-03-03T05:00:00.000Z",
      "withdrawal": false,
      "useOfMedia": "scientific",
      "feedback": "Fun study!",
    },
  })
}

async fn seeded() -> Seeded {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  let study = Study::new("Baby Physics: Round 2");
  store.insert_study(&study).await.unwrap();

  let account = Account { uuid: Uuid::new_v4(), nickname: Some("Jo".into()) };
  let child = Child {
    uuid:                   Uuid::new_v4(),
    account:                account.clone(),
    given_name:             "Sam".into(),
    birthday:               NaiveDate::from_ymd_opt(2019, 3, 3),
    gender:                 Some("f".into()),
    age_at_birth:           None,
    language_list:          "en".into(),
    condition_list:         String::new(),
    additional_information: String::new(),
  };
  store.insert_child(&child).await.unwrap();

  let snapshot = DemographicSnapshot {
    uuid: Uuid::new_v4(),
    account_uuid: account.uuid,
    created_at: Utc.with_ymd_and_hms(2020, 1, 15, 9, 30, 0).unwrap(),
    child_birthdays: vec![NaiveDate::from_ymd_opt(2019, 3, 3).unwrap()],
    country: Some("US".into()),
    ..Default::default()
  };
  store.insert_demographic_snapshot(&snapshot).await.unwrap();

  let base = Utc.with_ymd_and_hms(2020, 3, 3, 12, 0, 0).unwrap();
  let mut ids = Vec::new();
  for (n, is_preview) in [(0, false), (1, true), (2, false)] {
    let record = store
      .insert_response(NewResponse {
        uuid: Uuid::new_v4(),
        study_uuid: study.uuid,
        child_uuid: child.uuid,
        demographic_snapshot_uuid: Some(snapshot.uuid),
        date_created: base + Duration::days(n),
        completed: true,
        is_preview,
        eligibility: Vec::new(),
        sequence: vec!["0-video-config".into(), "2-test-trial".into(), "4-exit-survey".into()],
        conditions: json!({ "1-randomizer": { "conditionNum": n } }),
        exp_data: exp_data(),
        global_event_timings: json!([{ "eventType": "exitEarly" }]),
      })
      .await
      .unwrap();
    ids.push(record.uuid);
  }

  store
    .record_rulings(study.uuid, "Dr. Arbiter".into(), vec![
      NewRuling { response_uuid: ids[0], action: ConsentAction::Accepted, comment: None },
      NewRuling { response_uuid: ids[2], action: ConsentAction::Rejected, comment: None },
    ])
    .await
    .unwrap();

  Seeded { store, study, real: ids[0], preview: ids[1], rejected: ids[2] }
}

fn export_query(s: &Seeded) -> ResponseQuery {
  ResponseQuery::for_export(s.study.uuid, PermissionScope::ALL).with_page_size(1)
}

fn read_csv(bytes: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
  let mut reader = csv::Reader::from_reader(bytes);
  let header = reader.headers().unwrap().iter().map(str::to_owned).collect();
  let rows = reader
    .records()
    .map(|r| r.unwrap().iter().map(str::to_owned).collect())
    .collect();
  (header, rows)
}

// ─── Response exports ────────────────────────────────────────────────────────

#[tokio::test]
async fn response_csv_is_stable_across_exports() {
  let s = seeded().await;
  let selection = RESPONSES.default_selection();
  let query = export_query(&s);

  let first = responses::download(&s.store, &s.study, &query, ExportFormat::Csv, &selection)
    .await
    .unwrap();
  let second = responses::download(&s.store, &s.study, &query, ExportFormat::Csv, &selection)
    .await
    .unwrap();
  assert_eq!(first, second);
  // Additional information is selected by default and is identifying.
  assert_eq!(
    first.filename,
    "Baby-Physics--Round-2_all-responses-identifiable.csv"
  );
}

#[tokio::test]
async fn response_csv_has_consented_and_preview_rows() {
  let s = seeded().await;
  let selection = RESPONSES.default_selection();
  let artifact = responses::responses_csv(&s.store, &s.study, &export_query(&s), &selection)
    .await
    .unwrap();

  let (header, rows) = read_csv(&artifact.bytes);
  assert_eq!(header[0], "response__id");
  assert!(header.contains(&"response__sequence.2".to_owned()));
  assert!(header.contains(&"response__conditions.1-randomizer.conditionNum".to_owned()));
  assert!(!header.contains(&"child__name".to_owned()));

  let uuid_col = header.iter().position(|h| h == "response__uuid").unwrap();
  let uuids: Vec<&str> = rows.iter().map(|r| r[uuid_col].as_str()).collect();
  assert_eq!(uuids, vec![s.real.to_string(), s.preview.to_string()]);
  assert!(!uuids.contains(&s.rejected.to_string().as_str()));

  let withdrawn = header.iter().position(|h| h == "response__withdrawn").unwrap();
  assert_eq!(rows[0][withdrawn], "false");
}

#[tokio::test]
async fn identifiable_columns_mark_the_filename() {
  let s = seeded().await;
  let safe = RESPONSES.parse_selection(Some("child__gender")).unwrap();
  let artifact = responses::responses_csv(&s.store, &s.study, &export_query(&s), &safe)
    .await
    .unwrap();
  assert_eq!(artifact.filename, "Baby-Physics--Round-2_all-responses.csv");

  let selection = RESPONSES.parse_selection(Some("child__name,child__birthday")).unwrap();
  let artifact = responses::responses_csv(&s.store, &s.study, &export_query(&s), &selection)
    .await
    .unwrap();

  assert_eq!(
    artifact.filename,
    "Baby-Physics--Round-2_all-responses-identifiable.csv"
  );
  let (header, rows) = read_csv(&artifact.bytes);
  let name = header.iter().position(|h| h == "child__name").unwrap();
  assert_eq!(rows[0][name], "Sam");
}

#[tokio::test]
async fn response_json_groups_columns_and_keeps_payload() {
  let s = seeded().await;
  let selection = RESPONSES.default_selection();
  let artifact = responses::download(&s.store, &s.study, &export_query(&s), ExportFormat::Json, &selection)
    .await
    .unwrap();
  assert_eq!(artifact.content_type, "application/json");

  let parsed: Value = serde_json::from_slice(&artifact.bytes).unwrap();
  let records = parsed.as_array().unwrap();
  assert_eq!(records.len(), 2);
  assert_eq!(records[0]["response"]["uuid"], json!(s.real.to_string()));
  assert_eq!(records[0]["consent"]["ruling"], json!("accepted"));
  assert_eq!(records[0]["exp_data"]["2-test-trial"]["selectedImage"], json!("left"));
  assert_eq!(records[1]["response"]["is_preview"], json!(true));
}

#[tokio::test]
async fn unknown_column_is_an_input_error() {
  let err: Error = RESPONSES
    .parse_selection(Some("child__favourite_colour"))
    .unwrap_err()
    .into();
  assert!(err.is_input_error());
}

#[tokio::test]
async fn empty_recordset_still_has_header_and_dictionary() {
  let s = seeded().await;
  let query = ResponseQuery::for_export(s.study.uuid, PermissionScope {
    real:    true,
    preview: false,
  });
  s.store
    .record_rulings(s.study.uuid, "Dr. Arbiter".into(), vec![NewRuling {
      response_uuid: s.real,
      action:        ConsentAction::Pending,
      comment:       None,
    }])
    .await
    .unwrap();

  let selection = RESPONSES.default_selection();
  let csv = responses::responses_csv(&s.store, &s.study, &query, &selection)
    .await
    .unwrap();
  let (header, rows) = read_csv(&csv.bytes);
  assert!(rows.is_empty());
  assert_eq!(header[0], "response__id");

  let json = responses::responses_json(&s.store, &s.study, &query, &selection)
    .await
    .unwrap();
  assert_eq!(serde_json::from_slice::<Value>(&json.bytes).unwrap(), json!([]));

  let dict = responses::responses_dictionary(&s.study, &selection).unwrap();
  let (header, rows) = read_csv(&dict.bytes);
  assert_eq!(header, vec!["column", "description"]);
  assert_eq!(rows.len(), RESPONSES.selected(&selection).count());
}

// ─── Demographics ────────────────────────────────────────────────────────────

#[tokio::test]
async fn demographic_csv_reads_snapshot_fields() {
  let s = seeded().await;
  let selection = DEMOGRAPHICS.default_selection();
  let artifact = demographics::download(&s.store, &s.study, &export_query(&s), ExportFormat::Csv, &selection)
    .await
    .unwrap();
  assert_eq!(
    artifact.filename,
    "Baby-Physics--Round-2_all-demographic-snapshots.csv"
  );

  let (header, rows) = read_csv(&artifact.bytes);
  assert_eq!(rows.len(), 2);
  let country = header.iter().position(|h| h == "demographic__country").unwrap();
  assert!(rows.iter().all(|r| r[country] == "US"));
  assert!(!header.contains(&"participant__global_id".to_owned()));
}

#[tokio::test]
async fn demographics_have_no_frame_data() {
  let s = seeded().await;
  let selection = DEMOGRAPHICS.default_selection();
  let err = demographics::download(
    &s.store,
    &s.study,
    &export_query(&s),
    ExportFormat::Framedata,
    &selection,
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::UnsupportedFormat(ref f) if f == "framedata"));
  assert!(err.is_input_error());
}

// ─── Frame data ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_response_frames_start_with_global_events() {
  let s = seeded().await;
  let record = s.store.get_response(s.study.uuid, s.real).await.unwrap().unwrap();
  let artifact = framedata::response_frames(&s.study, &record).unwrap();
  assert_eq!(artifact.filename, frame_filename(&s.study.name, s.real));

  let (header, rows) = read_csv(&artifact.bytes);
  assert_eq!(header, vec![
    "response_uuid",
    "child_hashed_id",
    "frame_id",
    "event_number",
    "key",
    "value",
  ]);
  assert_eq!(rows[0][2], "global");
  assert_eq!(rows[0][3], "0");
  assert!(rows.iter().any(|r| r[2] == "2-test-trial" && r[4] == "selectedImage"));
  assert!(!rows.iter().any(|r| r[4] == "frameType" || r[4] == "birthDate"));
  assert!(!rows.iter().any(|r| r[4] == "generatedProperties"));
}

#[tokio::test]
async fn archive_holds_one_csv_per_response() {
  let s = seeded().await;
  let mut out = Cursor::new(Vec::new());
  let entries = framedata::write_archive(&s.store, &s.study, &export_query(&s), &mut out)
    .await
    .unwrap();
  assert_eq!(entries, 2);

  let mut archive = zip::ZipArchive::new(Cursor::new(out.into_inner())).unwrap();
  assert_eq!(archive.len(), 2);
  let first = archive.by_index(0).unwrap().name().to_owned();
  assert_eq!(first, frame_filename(&s.study.name, s.real));
  assert!(archive.by_name(&frame_filename(&s.study.name, s.preview)).is_ok());
}

#[tokio::test]
async fn archive_file_is_reproducible() {
  let s = seeded().await;
  let query = export_query(&s);
  let a = framedata::archive_file(&s.store, &s.study, &query).await.unwrap();
  let b = framedata::archive_file(&s.store, &s.study, &query).await.unwrap();
  assert_ne!(a.path(), b.path());

  let bytes = std::fs::read(a.path()).unwrap();
  assert!(bytes.starts_with(b"PK"));
  assert_eq!(bytes, std::fs::read(b.path()).unwrap());
  assert_eq!(
    framedata::archive_filename(&s.study),
    "Baby-Physics--Round-2_framedata_per_session.zip"
  );

  let mut archive = zip::ZipArchive::new(std::fs::File::open(a.path()).unwrap()).unwrap();
  assert_eq!(archive.len(), 2);
  assert!(archive.by_name(&frame_filename(&s.study.name, s.real)).is_ok());
}

#[tokio::test]
async fn response_download_does_not_buffer_the_archive() {
  let s = seeded().await;
  let selection = RESPONSES.default_selection();
  let err = responses::download(
    &s.store,
    &s.study,
    &export_query(&s),
    ExportFormat::Framedata,
    &selection,
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::UnsupportedFormat(ref f) if f == "framedata"));
}

#[tokio::test]
async fn frame_dictionary_lists_observed_keys() {
  let s = seeded().await;
  let artifact = framedata::framedata_dictionary(&s.store, &s.study, &export_query(&s))
    .await
    .unwrap();
  let (header, rows) = read_csv(&artifact.bytes);
  assert_eq!(header, vec!["frame_id", "key", "description"]);
  assert_eq!(rows[0][..2], ["", "response_uuid"]);
  assert!(rows.iter().any(|r| r[0] == "2-test-trial" && r[1] == "selectedImage"));
  assert!(rows.iter().any(|r| r[0] == "global" && r[1] == "eventType"));
}

// ─── Collisions ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_child_has_no_collisions() {
  let s = seeded().await;
  let report = pages::check_collisions(&s.store, &export_query(&s)).await.unwrap();
  assert!(report.is_empty());
}
