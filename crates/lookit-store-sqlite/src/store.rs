//! [`SqliteStore`]: the SQLite implementation of [`ResponseStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tracing::{debug, info};
use uuid::Uuid;

use lookit_core::{
  consent::{self, ConsentAction, ConsentRuling, ConsentStatus, NewRuling},
  fields::Projection,
  response::{self, Feedback, NewResponse, NewVideo, ResponseRecord, SessionUpdate, Video},
  store::{Page, ResponseQuery, ResponseStore, SortKey},
  study::{Account, Child, DemographicSnapshot, Study},
};

use crate::{
  Error, Result,
  encode::{
    PROJECTION_COLUMNS, RESPONSE_COLUMNS, RESPONSE_JOINS, RULING_COLUMNS, RawFeedback,
    RawProjection, RawResponse, RawRuling, RawStudy, RawVideo, VIDEO_COLUMNS, decode_uuid,
    encode_action, encode_date, encode_dt, encode_json, encode_uuid,
  },
  schema::SCHEMA,
};

fn order_by(sort: SortKey) -> &'static str {
  match sort {
    SortKey::Id => "r.id",
    SortKey::DateCreated => "r.date_created, r.id",
  }
}

enum VideoInsert {
  Stored,
  NoResponse,
  Withdrawn,
}

/// Rows visible to a [`ResponseQuery`].
///
/// `?1` study, `?2` preview allowed, `?3` real allowed, `?4` consented only.
/// The current ruling is the one with the highest row id.
const SCOPE_FILTER: &str = "
  WHERE r.study_uuid = ?1
    AND ((r.is_preview = 1 AND ?2)
      OR (r.is_preview = 0 AND ?3 AND (NOT ?4 OR (
            SELECT cr.action FROM consent_rulings cr
            WHERE cr.response_uuid = r.uuid
            ORDER BY cr.id DESC LIMIT 1
          ) IS 'accepted')))";

/// `(limit, offset)` for a 1-based page. One extra row is fetched so the
/// caller can tell whether another page follows.
fn page_window(query: &ResponseQuery, page: usize) -> (i64, i64) {
  let size = query.page_size.max(1);
  let offset = page.saturating_sub(1).saturating_mul(size);
  (size as i64 + 1, offset as i64)
}

fn paged<T>(mut items: Vec<T>, number: usize, page_size: usize) -> Page<T> {
  let page_size = page_size.max(1);
  let has_next = items.len() > page_size;
  items.truncate(page_size);
  Page { items, number: number.max(1), has_next }
}

fn rulings_for(
  stmt: &mut rusqlite::Statement<'_>,
  response_uuid: &str,
) -> rusqlite::Result<Vec<RawRuling>> {
  stmt
    .query_map([response_uuid], RawRuling::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()
}

/// Load full response rows matching `tail` (a `WHERE … ORDER BY …` clause)
/// together with each response's ruling history.
fn load_responses(
  conn: &rusqlite::Connection,
  tail: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<(RawResponse, Vec<RawRuling>)>> {
  let sql = format!("SELECT {RESPONSE_COLUMNS} {RESPONSE_JOINS} {tail}");
  let raws = conn
    .prepare(&sql)?
    .query_map(params, RawResponse::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut rulings = conn.prepare(&format!(
    "SELECT {RULING_COLUMNS} FROM consent_rulings WHERE response_uuid = ?1 ORDER BY id"
  ))?;
  raws
    .into_iter()
    .map(|raw| {
      let history = rulings_for(&mut rulings, &raw.uuid)?;
      Ok((raw, history))
    })
    .collect()
}

fn into_records(rows: Vec<(RawResponse, Vec<RawRuling>)>) -> Result<Vec<ResponseRecord>> {
  rows
    .into_iter()
    .map(|(raw, rulings)| raw.into_record(rulings))
    .collect()
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lookit response store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Seeding ───────────────────────────────────────────────────────────────

  pub async fn insert_study(&self, study: &Study) -> Result<()> {
    let uuid_str    = encode_uuid(study.uuid);
    let name        = study.name.clone();
    let salt_str    = encode_uuid(study.salt);
    let hash_digits = study.hash_digits as i64;
    let at_str      = encode_dt(study.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO studies (uuid, name, salt, hash_digits, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![uuid_str, name, salt_str, hash_digits, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a family account, or refresh its nickname if it already exists.
  pub async fn insert_account(&self, account: &Account) -> Result<()> {
    let uuid_str = encode_uuid(account.uuid);
    let nickname = account.nickname.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO accounts (uuid, nickname) VALUES (?1, ?2)
           ON CONFLICT(uuid) DO UPDATE SET nickname = excluded.nickname",
          rusqlite::params![uuid_str, nickname],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a child together with its account.
  pub async fn insert_child(&self, child: &Child) -> Result<()> {
    self.insert_account(&child.account).await?;

    let uuid_str     = encode_uuid(child.uuid);
    let account_str  = encode_uuid(child.account.uuid);
    let given_name   = child.given_name.clone();
    let birthday_str = child.birthday.map(encode_date);
    let gender       = child.gender.clone();
    let age_at_birth = child.age_at_birth.clone();
    let languages    = child.language_list.clone();
    let conditions   = child.condition_list.clone();
    let additional   = child.additional_information.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO children (
             uuid, account_uuid, given_name, birthday, gender, age_at_birth,
             language_list, condition_list, additional_information
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            uuid_str,
            account_str,
            given_name,
            birthday_str,
            gender,
            age_at_birth,
            languages,
            conditions,
            additional,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn insert_demographic_snapshot(&self, snapshot: &DemographicSnapshot) -> Result<()> {
    let uuid_str    = encode_uuid(snapshot.uuid);
    let account_str = encode_uuid(snapshot.account_uuid);
    let at_str      = encode_dt(snapshot.created_at);
    let data_json   = encode_json(snapshot)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO demographic_snapshots (uuid, account_uuid, created_at, data_json)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![uuid_str, account_str, at_str, data_json],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Create a response. The study must already exist.
  pub async fn insert_response(&self, input: NewResponse) -> Result<ResponseRecord> {
    if self.get_study(input.study_uuid).await?.is_none() {
      return Err(Error::StudyNotFound(input.study_uuid));
    }

    let uuid_str      = encode_uuid(input.uuid);
    let study_str     = encode_uuid(input.study_uuid);
    let child_str     = encode_uuid(input.child_uuid);
    let snapshot_str  = input.demographic_snapshot_uuid.map(encode_uuid);
    let created_str   = encode_dt(input.date_created);
    let eligibility   = encode_json(&input.eligibility)?;
    let sequence      = encode_json(&input.sequence)?;
    let conditions    = encode_json(&input.conditions)?;
    let exp_data      = encode_json(&input.exp_data)?;
    let global_events = encode_json(&input.global_event_timings)?;
    let completed     = input.completed;
    let is_preview    = input.is_preview;

    let mut rows = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO responses (
             uuid, study_uuid, child_uuid, demographic_snapshot_uuid, date_created,
             completed, is_preview, eligibility_json, sequence_json,
             conditions_json, exp_data_json, global_event_timings_json
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            uuid_str,
            study_str,
            child_str,
            snapshot_str,
            created_str,
            completed,
            is_preview,
            eligibility,
            sequence,
            conditions,
            exp_data,
            global_events,
          ],
        )?;
        Ok(load_responses(conn, "WHERE r.uuid = ?1", [&uuid_str])?)
      })
      .await?;

    let (raw, rulings) = rows.pop().ok_or(Error::ResponseNotFound(input.uuid))?;
    raw.into_record(rulings)
  }

  /// Append a ruling with an explicit timestamp, bypassing the batch checks.
  /// Used when importing historical judgement logs.
  pub async fn insert_ruling(
    &self,
    response_uuid: Uuid,
    action: ConsentAction,
    arbiter: String,
    comment: Option<String>,
    created_at: DateTime<Utc>,
  ) -> Result<ConsentRuling> {
    let response_str = encode_uuid(response_uuid);
    let action_str   = encode_action(action);
    let at_str       = encode_dt(created_at);

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO consent_rulings (response_uuid, action, arbiter, comment, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![response_str, action_str, arbiter, comment, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    debug!(response = %response_uuid, ruling = id, %action, "inserted consent ruling");
    self
      .ruling_by_id(id)
      .await?
      .ok_or(Error::ResponseNotFound(response_uuid))
  }

  /// Record an uploaded video. Non-consent footage for a response whose exit
  /// survey withdrew video consent is refused unless `keep_withdrawn` is
  /// set. Import keeps those rows so the follow-up purge can delete their
  /// objects.
  pub(crate) async fn insert_video(&self, input: NewVideo, keep_withdrawn: bool) -> Result<Video> {
    let video = Video {
      uuid:               Uuid::new_v4(),
      response_uuid:      input.response_uuid,
      is_consent_footage: NewVideo::is_consent_frame(&input.frame_id),
      frame_id:           input.frame_id,
      key:                input.key,
      created_at:         Utc::now(),
    };

    let uuid_str     = encode_uuid(video.uuid);
    let response_str = encode_uuid(video.response_uuid);
    let frame_id     = video.frame_id.clone();
    let key          = video.key.clone();
    let consent      = video.is_consent_footage;
    let at_str       = encode_dt(video.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let exp_data: Option<String> = conn
          .query_row(
            "SELECT exp_data_json FROM responses WHERE uuid = ?1",
            [&response_str],
            |row| row.get(0),
          )
          .optional()?;
        let Some(exp_data) = exp_data else {
          return Ok(VideoInsert::NoResponse);
        };
        if !consent && !keep_withdrawn {
          let exp_data: serde_json::Value = serde_json::from_str(&exp_data)
            .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
          if response::withdrawal_requested(&exp_data) {
            return Ok(VideoInsert::Withdrawn);
          }
        }
        conn.execute(
          &format!("INSERT INTO videos ({VIDEO_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
          rusqlite::params![uuid_str, response_str, frame_id, key, consent, at_str],
        )?;
        Ok(VideoInsert::Stored)
      })
      .await?;

    match outcome {
      VideoInsert::Stored => Ok(video),
      VideoInsert::NoResponse => Err(Error::ResponseNotFound(video.response_uuid)),
      VideoInsert::Withdrawn => {
        debug!(response = %video.response_uuid, frame = %video.frame_id, "refused video after withdrawal");
        Err(Error::ResponseWithdrawn(video.response_uuid))
      }
    }
  }

  async fn ruling_by_id(&self, id: i64) -> Result<Option<ConsentRuling>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {RULING_COLUMNS} FROM consent_rulings WHERE id = ?1"),
              [id],
              RawRuling::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawRuling::into_ruling).transpose()
  }

  /// Whether `response_id` exists and belongs to `study_id`.
  async fn response_in_study(&self, study_id: Uuid, response_id: Uuid) -> Result<bool> {
    let study_str    = encode_uuid(study_id);
    let response_str = encode_uuid(response_id);

    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM responses WHERE uuid = ?1 AND study_uuid = ?2",
              rusqlite::params![response_str, study_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(found)
  }
}

// ─── ResponseStore impl ──────────────────────────────────────────────────────

impl ResponseStore for SqliteStore {
  type Error = Error;

  // ── Studies ───────────────────────────────────────────────────────────────

  async fn get_study(&self, id: Uuid) -> Result<Option<Study>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT uuid, name, salt, hash_digits, created_at FROM studies WHERE uuid = ?1",
              [id_str],
              |row| RawStudy::from_row(row, 0),
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawStudy::into_study).transpose()
  }

  // ── Paginated reads ───────────────────────────────────────────────────────

  async fn fetch_page<'a>(
    &'a self,
    query: &'a ResponseQuery,
    page: usize,
  ) -> Result<Page<ResponseRecord>> {
    let (limit, offset) = page_window(query, page);
    let study_str = encode_uuid(query.study_id);
    let preview   = query.scope.preview;
    let real      = query.scope.real;
    let consented = query.consented_only;
    let tail = format!(
      "{SCOPE_FILTER} ORDER BY {} LIMIT ?5 OFFSET ?6",
      order_by(query.sort)
    );

    let rows = self
      .conn
      .call(move |conn| {
        Ok(load_responses(
          conn,
          &tail,
          rusqlite::params![study_str, preview, real, consented, limit, offset],
        )?)
      })
      .await?;

    let items = into_records(rows)?;
    debug!(study = %query.study_id, page, rows = items.len(), "fetched response page");
    Ok(paged(items, page, query.page_size))
  }

  async fn fetch_projection_page<'a>(
    &'a self,
    query: &'a ResponseQuery,
    page: usize,
  ) -> Result<Page<Projection>> {
    let (limit, offset) = page_window(query, page);
    let study_str = encode_uuid(query.study_id);
    let preview   = query.scope.preview;
    let real      = query.scope.real;
    let consented = query.consented_only;
    let sql = format!(
      "SELECT {PROJECTION_COLUMNS} {RESPONSE_JOINS} {SCOPE_FILTER}
       ORDER BY {} LIMIT ?5 OFFSET ?6",
      order_by(query.sort)
    );

    let raws = self
      .conn
      .call(move |conn| {
        let rows = conn
          .prepare(&sql)?
          .query_map(
            rusqlite::params![study_str, preview, real, consented, limit, offset],
            RawProjection::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawProjection::into_projection)
      .collect::<Result<Vec<_>>>()?;
    Ok(paged(items, page, query.page_size))
  }

  async fn get_response(
    &self,
    study_id: Uuid,
    response_id: Uuid,
  ) -> Result<Option<ResponseRecord>> {
    let study_str    = encode_uuid(study_id);
    let response_str = encode_uuid(response_id);

    let rows = self
      .conn
      .call(move |conn| {
        Ok(load_responses(
          conn,
          "WHERE r.uuid = ?1 AND r.study_uuid = ?2",
          rusqlite::params![response_str, study_str],
        )?)
      })
      .await?;
    Ok(into_records(rows)?.pop())
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn update_session(
    &self,
    response_id: Uuid,
    update: SessionUpdate,
  ) -> Result<Option<ResponseRecord>> {
    let response_str  = encode_uuid(response_id);
    let completed     = update.completed;
    let sequence      = update.sequence.as_ref().map(encode_json).transpose()?;
    let conditions    = update.conditions.as_ref().map(encode_json).transpose()?;
    let exp_data      = update.exp_data.as_ref().map(encode_json).transpose()?;
    let global_events = update
      .global_event_timings
      .as_ref()
      .map(encode_json)
      .transpose()?;

    let rows = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE responses SET
             completed                 = COALESCE(?2, completed),
             sequence_json             = COALESCE(?3, sequence_json),
             conditions_json           = COALESCE(?4, conditions_json),
             exp_data_json             = COALESCE(?5, exp_data_json),
             global_event_timings_json = COALESCE(?6, global_event_timings_json)
           WHERE uuid = ?1",
          rusqlite::params![
            response_str,
            completed,
            sequence,
            conditions,
            exp_data,
            global_events,
          ],
        )?;
        if changed == 0 {
          return Ok(Vec::new());
        }
        Ok(load_responses(conn, "WHERE r.uuid = ?1", [&response_str])?)
      })
      .await?;
    Ok(into_records(rows)?.pop())
  }

  // ── Consent ───────────────────────────────────────────────────────────────

  async fn record_rulings(
    &self,
    study_id: Uuid,
    arbiter: String,
    rulings: Vec<NewRuling>,
  ) -> Result<Vec<ConsentRuling>> {
    if rulings.is_empty() {
      return Err(lookit_core::Error::EmptyBatch.into());
    }

    let study_str = encode_uuid(study_id);
    let at_str    = encode_dt(Utc::now());
    let count     = rulings.len();
    let entries: Vec<(String, &'static str, Option<String>)> = rulings
      .into_iter()
      .map(|r| (encode_uuid(r.response_uuid), encode_action(r.action), r.comment))
      .collect();
    let arbiter_log = arbiter.clone();

    // The whole batch commits or none of it does. A foreign response aborts
    // the transaction and is reported back as the inner error.
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = Vec::with_capacity(entries.len());
        {
          let mut check =
            tx.prepare("SELECT 1 FROM responses WHERE uuid = ?1 AND study_uuid = ?2")?;
          let mut insert = tx.prepare(
            "INSERT INTO consent_rulings (response_uuid, action, arbiter, comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;

          for (response, action, comment) in entries {
            if !check.exists(rusqlite::params![response, study_str])? {
              return Ok(Err(response));
            }
            insert.execute(rusqlite::params![response, action, arbiter, comment, at_str])?;
            inserted.push(RawRuling {
              id: tx.last_insert_rowid(),
              response_uuid: response,
              action: action.to_owned(),
              arbiter: arbiter.clone(),
              comment,
              created_at: at_str.clone(),
            });
          }
        }
        tx.commit()?;
        Ok(Ok(inserted))
      })
      .await?;

    let inserted = match outcome {
      Ok(inserted) => inserted,
      Err(response) => {
        let response = decode_uuid(&response)?;
        return Err(lookit_core::Error::ResponseNotInStudy(response, study_id).into());
      }
    };

    info!(study = %study_id, arbiter = %arbiter_log, count, "recorded consent rulings");
    inserted.into_iter().map(RawRuling::into_ruling).collect()
  }

  async fn list_consent_statuses(&self, study_id: Uuid) -> Result<Vec<ConsentStatus>> {
    let study_str = encode_uuid(study_id);

    let rows = self
      .conn
      .call(move |conn| {
        let ids = conn
          .prepare("SELECT uuid FROM responses WHERE study_uuid = ?1 ORDER BY date_created, id")?
          .query_map([&study_str], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut rulings = conn.prepare(&format!(
          "SELECT {RULING_COLUMNS} FROM consent_rulings WHERE response_uuid = ?1 ORDER BY id"
        ))?;
        let rows = ids
          .into_iter()
          .map(|id| {
            let history = rulings_for(&mut rulings, &id)?;
            Ok((id, history))
          })
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(id, history)| {
        let history = history
          .into_iter()
          .map(RawRuling::into_ruling)
          .collect::<Result<Vec<_>>>()?;
        Ok(ConsentStatus {
          response_uuid: decode_uuid(&id)?,
          current: consent::current_action(&history),
          history,
        })
      })
      .collect()
  }

  // ── Videos ────────────────────────────────────────────────────────────────

  async fn add_video(&self, input: NewVideo) -> Result<Video> {
    self.insert_video(input, false).await
  }

  async fn list_videos(&self, response_id: Uuid) -> Result<Vec<Video>> {
    let response_str = encode_uuid(response_id);

    let raws = self
      .conn
      .call(move |conn| {
        let rows = conn
          .prepare(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE response_uuid = ?1
             ORDER BY created_at, uuid"
          ))?
          .query_map([&response_str], RawVideo::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawVideo::into_video).collect()
  }

  async fn delete_videos(&self, ids: Vec<Uuid>) -> Result<usize> {
    let id_strs: Vec<String> = ids.into_iter().map(encode_uuid).collect();

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut deleted = 0;
        {
          let mut stmt = tx.prepare("DELETE FROM videos WHERE uuid = ?1")?;
          for id in &id_strs {
            deleted += stmt.execute([id])?;
          }
        }
        tx.commit()?;
        Ok(deleted)
      })
      .await?;
    Ok(deleted)
  }

  // ── Feedback ──────────────────────────────────────────────────────────────

  async fn add_feedback(
    &self,
    study_id: Uuid,
    response_id: Uuid,
    researcher: String,
    comment: String,
  ) -> Result<Feedback> {
    if !self.response_in_study(study_id, response_id).await? {
      return Err(lookit_core::Error::ResponseNotInStudy(response_id, study_id).into());
    }

    let raw = RawFeedback {
      uuid: encode_uuid(Uuid::new_v4()),
      response_uuid: encode_uuid(response_id),
      researcher,
      comment,
      created_at: encode_dt(Utc::now()),
    };

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO feedback (uuid, response_uuid, researcher, comment, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            raw.uuid,
            raw.response_uuid,
            raw.researcher,
            raw.comment,
            raw.created_at,
          ],
        )?;
        Ok(raw)
      })
      .await?;
    raw.into_feedback()
  }

  // ── Preview data ──────────────────────────────────────────────────────────

  async fn delete_preview_responses(&self, study_id: Uuid) -> Result<Vec<Video>> {
    let study_str = encode_uuid(study_id);

    let (raws, removed) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raws = tx
          .prepare(
            "SELECT v.uuid, v.response_uuid, v.frame_id, v.storage_key,
                    v.is_consent_footage, v.created_at
             FROM videos v
             JOIN responses r ON r.uuid = v.response_uuid
             WHERE r.study_uuid = ?1 AND r.is_preview = 1
             ORDER BY v.created_at, v.uuid",
          )?
          .query_map([&study_str], RawVideo::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        // Rulings, videos and feedback go with the response via ON DELETE CASCADE.
        let removed = tx.execute(
          "DELETE FROM responses WHERE study_uuid = ?1 AND is_preview = 1",
          [&study_str],
        )?;
        tx.commit()?;
        Ok((raws, removed))
      })
      .await?;

    info!(study = %study_id, responses = removed, videos = raws.len(), "purged preview responses");
    raws.into_iter().map(RawVideo::into_video).collect()
  }
}
