//! Integration tests for `SqliteStore` against an in-memory database.

use std::{collections::BTreeSet, path::Path, sync::Mutex};

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use lookit_core::{
  access::PermissionScope,
  consent::{ConsentAction, NewRuling},
  response::{NewResponse, NewVideo, SessionUpdate},
  store::{ResponseQuery, ResponseStore, SortKey, VideoStorage},
  study::{Account, Child, DemographicSnapshot, Study},
  video,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{Error, FixtureBundle, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn child() -> Child {
  Child {
    uuid:                   Uuid::new_v4(),
    account:                Account { uuid: Uuid::new_v4(), nickname: Some("Jo".into()) },
    given_name:             "Sam".into(),
    birthday:               NaiveDate::from_ymd_opt(2019, 3, 3),
    gender:                 Some("f".into()),
    age_at_birth:           Some("40".into()),
    language_list:          "en".into(),
    condition_list:         String::new(),
    additional_information: String::new(),
  }
}

fn exit_frame(withdrawn: bool) -> Value {
  json!({
    "1-video-consent": { "frameType": "CONSENT" },
    "2-exit-survey": {
      "frameType": "EXIT",
      "withdrawal": withdrawn,
      "useOfMedia": "private",
    },
  })
}

fn new_response(study: &Study, child: &Child, n: i64, is_preview: bool) -> NewResponse {
  NewResponse {
    uuid: Uuid::new_v4(),
    study_uuid: study.uuid,
    child_uuid: child.uuid,
    demographic_snapshot_uuid: None,
    date_created: Utc.with_ymd_and_hms(2020, 3, 3, 12, 0, 0).unwrap() + Duration::minutes(n),
    completed: true,
    is_preview,
    eligibility: Vec::new(),
    sequence: vec!["1-video-consent".into(), "2-exit-survey".into()],
    conditions: Value::Null,
    exp_data: exit_frame(false),
    global_event_timings: json!([]),
  }
}

/// A store with one study and one child.
async fn seeded() -> (SqliteStore, Study, Child) {
  let s = store().await;
  let study = Study::new("Baby Physics");
  let child = child();
  s.insert_study(&study).await.unwrap();
  s.insert_child(&child).await.unwrap();
  (s, study, child)
}

async fn respond(s: &SqliteStore, study: &Study, child: &Child, n: i64, preview: bool) -> Uuid {
  s.insert_response(new_response(study, child, n, preview))
    .await
    .unwrap()
    .uuid
}

async fn rule(s: &SqliteStore, study: &Study, response: Uuid, action: ConsentAction) {
  s.record_rulings(
    study.uuid,
    "Dr. Arbiter".into(),
    vec![NewRuling { response_uuid: response, action, comment: None }],
  )
  .await
  .unwrap();
}

async fn collect_uuids(s: &SqliteStore, query: &ResponseQuery) -> Vec<Uuid> {
  let mut out = Vec::new();
  let mut page = 1;
  loop {
    let p = s.fetch_page(query, page).await.unwrap();
    out.extend(p.items.iter().map(|r| r.uuid));
    if !p.has_next {
      return out;
    }
    page += 1;
  }
}

#[derive(Default)]
struct FakeStorage {
  deleted: Mutex<Vec<String>>,
  failing: Vec<String>,
}

impl VideoStorage for FakeStorage {
  type Error = std::io::Error;

  async fn delete_video<'a>(&'a self, key: &'a str) -> Result<(), std::io::Error> {
    if self.failing.iter().any(|k| k == key) {
      return Err(std::io::Error::other("bucket unavailable"));
    }
    self.deleted.lock().unwrap().push(key.to_owned());
    Ok(())
  }

  async fn signed_download_url<'a>(&'a self, key: &'a str) -> Result<String, std::io::Error> {
    Ok(format!("https://media.test/{key}"))
  }

  async fn upload<'a>(&'a self, _key: &'a str, _bytes: Vec<u8>) -> Result<(), std::io::Error> {
    Ok(())
  }

  async fn upload_file<'a>(&'a self, _key: &'a str, _source: &'a Path) -> Result<(), std::io::Error> {
    Ok(())
  }
}

// ─── Studies and responses ───────────────────────────────────────────────────

#[tokio::test]
async fn study_round_trips() {
  let (s, study, _) = seeded().await;
  let fetched = s.get_study(study.uuid).await.unwrap().unwrap();
  assert_eq!(fetched.salt, study.salt);
  assert_eq!(fetched.hash_digits, 6);
  assert!(s.get_study(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn insert_response_resolves_relations() {
  let (s, study, child) = seeded().await;
  let record = s
    .insert_response(new_response(&study, &child, 0, false))
    .await
    .unwrap();

  assert_eq!(record.study.name, "Baby Physics");
  assert_eq!(record.child.account.nickname.as_deref(), Some("Jo"));
  assert_eq!(record.child.birthday, NaiveDate::from_ymd_opt(2019, 3, 3));
  assert_eq!(record.video_privacy(), Some("private"));
  assert!(record.consent_rulings.is_empty());
  assert!(record.demographic_snapshot.is_none());
}

#[tokio::test]
async fn insert_response_requires_study() {
  let (s, _, child) = seeded().await;
  let orphan = Study::new("Never saved");
  let err = s
    .insert_response(new_response(&orphan, &child, 0, false))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::StudyNotFound(id) if id == orphan.uuid));
}

#[tokio::test]
async fn get_response_is_scoped_to_study() {
  let (s, study, child) = seeded().await;
  let other = Study::new("Other");
  s.insert_study(&other).await.unwrap();
  let id = respond(&s, &study, &child, 0, false).await;

  assert!(s.get_response(study.uuid, id).await.unwrap().is_some());
  assert!(s.get_response(other.uuid, id).await.unwrap().is_none());
}

// ─── Pagination ──────────────────────────────────────────────────────────────

fn every_response(study: &Study) -> ResponseQuery {
  ResponseQuery {
    consented_only: false,
    ..ResponseQuery::for_export(study.uuid, PermissionScope::ALL)
  }
}

#[tokio::test]
async fn pages_cover_every_response_exactly_once() {
  let (s, study, child) = seeded().await;
  let mut inserted = Vec::new();
  for n in 0..7 {
    inserted.push(respond(&s, &study, &child, n, false).await);
  }

  let query = every_response(&study).with_page_size(3);
  let first = s.fetch_page(&query, 1).await.unwrap();
  assert_eq!(first.items.len(), 3);
  assert!(first.has_next);
  let last = s.fetch_page(&query, 3).await.unwrap();
  assert_eq!(last.items.len(), 1);
  assert!(!last.has_next);

  let seen = collect_uuids(&s, &query).await;
  assert_eq!(seen, inserted);
}

#[tokio::test]
async fn date_created_sort_overrides_insertion_order() {
  let (s, study, child) = seeded().await;
  let mut inserted = Vec::new();
  for n in [5, 2, 9] {
    inserted.push(respond(&s, &study, &child, n, false).await);
  }

  let by_id = every_response(&study).with_page_size(2);
  assert_eq!(collect_uuids(&s, &by_id).await, inserted);

  let by_date = by_id.with_sort(SortKey::DateCreated);
  assert_eq!(collect_uuids(&s, &by_date).await, vec![inserted[1], inserted[0], inserted[2]]);
}

#[tokio::test]
async fn empty_study_has_single_empty_page() {
  let (s, study, _) = seeded().await;
  let page = s
    .fetch_page(&every_response(&study), 1)
    .await
    .unwrap();
  assert!(page.items.is_empty());
  assert!(!page.has_next);
}

// ─── Consent gating ──────────────────────────────────────────────────────────

#[tokio::test]
async fn export_query_follows_current_ruling_and_scope() {
  let (s, study, child) = seeded().await;
  let accepted = respond(&s, &study, &child, 0, false).await;
  let flipped = respond(&s, &study, &child, 1, false).await;
  let _pending = respond(&s, &study, &child, 2, false).await;
  let preview = respond(&s, &study, &child, 3, true).await;

  rule(&s, &study, accepted, ConsentAction::Accepted).await;
  rule(&s, &study, flipped, ConsentAction::Accepted).await;
  rule(&s, &study, flipped, ConsentAction::Rejected).await;

  let all = ResponseQuery::for_export(study.uuid, PermissionScope::ALL);
  assert_eq!(collect_uuids(&s, &all).await, vec![accepted, preview]);

  let real_only = ResponseQuery::for_export(study.uuid, PermissionScope {
    real:    true,
    preview: false,
  });
  assert_eq!(collect_uuids(&s, &real_only).await, vec![accepted]);

  let preview_only = ResponseQuery::for_export(study.uuid, PermissionScope {
    real:    false,
    preview: true,
  });
  assert_eq!(collect_uuids(&s, &preview_only).await, vec![preview]);

  // Flipping back to accepted readmits the response.
  rule(&s, &study, flipped, ConsentAction::Accepted).await;
  assert_eq!(collect_uuids(&s, &all).await, vec![accepted, flipped, preview]);
}

#[tokio::test]
async fn preview_responses_ignore_rulings() {
  let (s, study, child) = seeded().await;
  let preview = respond(&s, &study, &child, 0, true).await;
  rule(&s, &study, preview, ConsentAction::Rejected).await;

  let query = ResponseQuery::for_export(study.uuid, PermissionScope::ALL);
  assert_eq!(collect_uuids(&s, &query).await, vec![preview]);
}

// ─── Rulings ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_shares_arbiter_and_timestamp() {
  let (s, study, child) = seeded().await;
  let a = respond(&s, &study, &child, 0, false).await;
  let b = respond(&s, &study, &child, 1, false).await;

  let rulings = s
    .record_rulings(study.uuid, "Dr. Batch".into(), vec![
      NewRuling { response_uuid: a, action: ConsentAction::Accepted, comment: None },
      NewRuling {
        response_uuid: b,
        action:        ConsentAction::Rejected,
        comment:       Some("no audio".into()),
      },
    ])
    .await
    .unwrap();

  assert_eq!(rulings.len(), 2);
  assert!(rulings[0].id < rulings[1].id);
  assert_eq!(rulings[0].created_at, rulings[1].created_at);
  assert!(rulings.iter().all(|r| r.arbiter == "Dr. Batch"));
  assert_eq!(rulings[1].comment.as_deref(), Some("no audio"));
}

#[tokio::test]
async fn foreign_response_aborts_whole_batch() {
  let (s, study, child) = seeded().await;
  let other = Study::new("Other");
  s.insert_study(&other).await.unwrap();
  let ours = respond(&s, &study, &child, 0, false).await;
  let theirs = respond(&s, &other, &child, 1, false).await;

  let err = s
    .record_rulings(study.uuid, "Dr. Arbiter".into(), vec![
      NewRuling { response_uuid: ours, action: ConsentAction::Accepted, comment: None },
      NewRuling { response_uuid: theirs, action: ConsentAction::Accepted, comment: None },
    ])
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(lookit_core::Error::ResponseNotInStudy(r, st)) if r == theirs && st == study.uuid
  ));

  let statuses = s.list_consent_statuses(study.uuid).await.unwrap();
  assert_eq!(statuses.len(), 1);
  assert!(statuses[0].history.is_empty());
  assert_eq!(statuses[0].current, ConsentAction::Pending);
}

#[tokio::test]
async fn empty_batch_is_rejected() {
  let (s, study, _) = seeded().await;
  let err = s
    .record_rulings(study.uuid, "Dr. Arbiter".into(), Vec::new())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(lookit_core::Error::EmptyBatch)));
}

#[tokio::test]
async fn consent_statuses_keep_full_history() {
  let (s, study, child) = seeded().await;
  let id = respond(&s, &study, &child, 0, false).await;
  rule(&s, &study, id, ConsentAction::Rejected).await;
  rule(&s, &study, id, ConsentAction::Pending).await;
  rule(&s, &study, id, ConsentAction::Accepted).await;

  let statuses = s.list_consent_statuses(study.uuid).await.unwrap();
  let status = &statuses[0];
  assert_eq!(status.response_uuid, id);
  assert_eq!(status.current, ConsentAction::Accepted);
  let actions: Vec<_> = status.history.iter().map(|r| r.action).collect();
  assert_eq!(actions, vec![
    ConsentAction::Rejected,
    ConsentAction::Pending,
    ConsentAction::Accepted,
  ]);
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_update_changes_only_given_fields() {
  let (s, study, child) = seeded().await;
  let id = respond(&s, &study, &child, 0, false).await;

  let updated = s
    .update_session(id, SessionUpdate {
      completed: Some(false),
      exp_data: Some(exit_frame(true)),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();

  assert!(!updated.completed);
  assert!(updated.withdrawn());
  assert_eq!(updated.sequence, vec!["1-video-consent", "2-exit-survey"]);
  assert!(s.update_session(Uuid::new_v4(), SessionUpdate::default()).await.unwrap().is_none());
}

// ─── Videos ──────────────────────────────────────────────────────────────────

async fn add_videos(s: &SqliteStore, response: Uuid) {
  for frame_id in ["1-video-consent", "3-test-trial", "4-test-trial"] {
    s.add_video(NewVideo {
      response_uuid: response,
      frame_id:      frame_id.into(),
      key:           format!("videoStream_{response}_{frame_id}"),
    })
    .await
    .unwrap();
  }
}

#[tokio::test]
async fn videos_flag_consent_footage() {
  let (s, study, child) = seeded().await;
  let id = respond(&s, &study, &child, 0, false).await;
  add_videos(&s, id).await;

  let videos = s.list_videos(id).await.unwrap();
  assert_eq!(videos.len(), 3);
  let consent: Vec<_> = videos.iter().filter(|v| v.is_consent_footage).collect();
  assert_eq!(consent.len(), 1);
  assert_eq!(consent[0].frame_id, "1-video-consent");
}

#[tokio::test]
async fn video_for_unknown_response_is_rejected() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = s
    .add_video(NewVideo { response_uuid: missing, frame_id: "x".into(), key: "k".into() })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ResponseNotFound(id) if id == missing));
}

#[tokio::test]
async fn withdrawal_keeps_only_consent_footage() {
  let (s, study, child) = seeded().await;
  let id = respond(&s, &study, &child, 0, false).await;
  add_videos(&s, id).await;
  let record = s
    .update_session(id, SessionUpdate { exp_data: Some(exit_frame(true)), ..Default::default() })
    .await
    .unwrap()
    .unwrap();

  let storage = FakeStorage::default();
  let report = video::enforce_withdrawal(&s, &storage, &record).await.unwrap();
  assert_eq!(report.rows_deleted, 2);
  assert_eq!(report.objects_deleted, 2);
  assert!(report.failures.is_empty());

  let remaining = s.list_videos(id).await.unwrap();
  assert_eq!(remaining.len(), 1);
  assert!(remaining[0].is_consent_footage);
  assert!(storage.deleted.lock().unwrap().iter().all(|k| k.ends_with("-test-trial")));
}

#[tokio::test]
async fn withdrawn_response_accepts_only_consent_footage() {
  let (s, study, child) = seeded().await;
  let id = respond(&s, &study, &child, 0, false).await;
  s.update_session(id, SessionUpdate { exp_data: Some(exit_frame(true)), ..Default::default() })
    .await
    .unwrap()
    .unwrap();

  let late = NewVideo { response_uuid: id, frame_id: "3-test-trial".into(), key: "late".into() };
  let err = s.add_video(late).await.unwrap_err();
  assert!(matches!(err, Error::ResponseWithdrawn(r) if r == id));

  let consent = NewVideo { response_uuid: id, frame_id: "1-video-consent".into(), key: "c".into() };
  assert!(s.add_video(consent).await.unwrap().is_consent_footage);

  let videos = s.list_videos(id).await.unwrap();
  assert_eq!(videos.len(), 1);
  assert_eq!(videos[0].key, "c");
}

#[tokio::test]
async fn withdrawal_is_noop_for_consenting_family() {
  let (s, study, child) = seeded().await;
  let id = respond(&s, &study, &child, 0, false).await;
  add_videos(&s, id).await;
  let record = s.get_response(study.uuid, id).await.unwrap().unwrap();

  let storage = FakeStorage::default();
  let report = video::enforce_withdrawal(&s, &storage, &record).await.unwrap();
  assert_eq!(report.rows_deleted, 0);
  assert_eq!(s.list_videos(id).await.unwrap().len(), 3);
}

// ─── Preview purge ───────────────────────────────────────────────────────────

#[tokio::test]
async fn preview_purge_cascades_and_reports_failures() {
  let (s, study, child) = seeded().await;
  let real = respond(&s, &study, &child, 0, false).await;
  let preview = respond(&s, &study, &child, 1, true).await;
  add_videos(&s, real).await;
  add_videos(&s, preview).await;
  rule(&s, &study, preview, ConsentAction::Accepted).await;
  s.add_feedback(study.uuid, preview, "Dr. Arbiter".into(), "thanks".into())
    .await
    .unwrap();

  let storage = FakeStorage {
    failing: vec![format!("videoStream_{preview}_3-test-trial")],
    ..Default::default()
  };
  let report = video::purge_preview_responses(&s, &storage, study.uuid)
    .await
    .unwrap();

  assert_eq!(report.rows_deleted, 3);
  assert_eq!(report.objects_deleted, 2);
  assert_eq!(report.failures.len(), 1);
  assert_eq!(report.failures[0].key, format!("videoStream_{preview}_3-test-trial"));

  assert!(s.get_response(study.uuid, preview).await.unwrap().is_none());
  assert!(s.list_videos(preview).await.unwrap().is_empty());
  assert_eq!(s.list_videos(real).await.unwrap().len(), 3);

  let statuses = s.list_consent_statuses(study.uuid).await.unwrap();
  let remaining: BTreeSet<_> = statuses.iter().map(|st| st.response_uuid).collect();
  assert_eq!(remaining, BTreeSet::from([real]));
}

// ─── Feedback ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn feedback_must_name_a_response_of_the_study() {
  let (s, study, child) = seeded().await;
  let other = Study::new("Other");
  s.insert_study(&other).await.unwrap();
  let id = respond(&s, &study, &child, 0, false).await;

  let feedback = s
    .add_feedback(study.uuid, id, "Dr. Arbiter".into(), "Lovely session".into())
    .await
    .unwrap();
  assert_eq!(feedback.response_uuid, id);
  assert_eq!(feedback.comment, "Lovely session");

  let err = s
    .add_feedback(other.uuid, id, "Dr. Arbiter".into(), "wrong study".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(lookit_core::Error::ResponseNotInStudy(..))));
}

// ─── Projections ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn projections_include_snapshot_fields_when_present() {
  let (s, study, child) = seeded().await;
  let snapshot = DemographicSnapshot {
    uuid: Uuid::new_v4(),
    account_uuid: child.account.uuid,
    created_at: Utc.with_ymd_and_hms(2020, 1, 15, 9, 30, 0).unwrap(),
    country: Some("US".into()),
    number_of_books: Some(75),
    ..Default::default()
  };
  s.insert_demographic_snapshot(&snapshot).await.unwrap();

  let mut with = new_response(&study, &child, 0, true);
  with.demographic_snapshot_uuid = Some(snapshot.uuid);
  s.insert_response(with).await.unwrap();
  s.insert_response(new_response(&study, &child, 1, true)).await.unwrap();

  let query = ResponseQuery::for_export(study.uuid, PermissionScope::ALL);
  let page = s.fetch_projection_page(&query, 1).await.unwrap();
  assert_eq!(page.items.len(), 2);

  let first = &page.items[0].0;
  assert_eq!(first["child__uuid"], json!(child.uuid.to_string()));
  assert_eq!(first["study__salt"], json!(study.salt.to_string()));
  assert_eq!(first["demographic_snapshot__country"], json!("US"));
  assert_eq!(first["demographic_snapshot__number_of_books"], json!(75));

  let second = &page.items[1].0;
  assert!(!second.contains_key("demographic_snapshot__country"));
}

// ─── Import ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn import_counts_rows_and_flags_withdrawals() {
  let study = Study::new("Imported");
  let child = child();
  let keep = new_response(&study, &child, 0, false);
  let mut withdraw = new_response(&study, &child, 1, false);
  withdraw.exp_data = exit_frame(true);

  let bundle: FixtureBundle = serde_json::from_value(json!({
    "studies": [study],
    "children": [child],
    "responses": [keep, withdraw],
    "rulings": [{
      "response_uuid": keep.uuid,
      "action": "accepted",
      "arbiter": "Dr. Import",
      "created_at": "2020-04-01T00:00:00Z",
    }],
    "videos": [{
      "response_uuid": withdraw.uuid,
      "frame_id": "3-test-trial",
      "key": "videoStream_imported",
    }],
  }))
  .unwrap();

  let s = store().await;
  let report = s.import(bundle).await.unwrap();
  assert_eq!(report.studies, 1);
  assert_eq!(report.children, 1);
  assert_eq!(report.responses, 2);
  assert_eq!(report.rulings, 1);
  assert_eq!(report.videos, 1);
  assert_eq!(report.withdrawn, vec![(study.uuid, withdraw.uuid)]);

  let record = s.get_response(study.uuid, keep.uuid).await.unwrap().unwrap();
  assert_eq!(record.consent_action(), ConsentAction::Accepted);
  assert_eq!(record.consent_rulings[0].arbiter, "Dr. Import");
}
