//! SQL schema for the Lookit SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS studies (
    uuid        TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    salt        TEXT NOT NULL,      -- fixed at creation, never updated
    hash_digits INTEGER NOT NULL,   -- fixed at creation, never updated
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    uuid     TEXT PRIMARY KEY,
    nickname TEXT
);

CREATE TABLE IF NOT EXISTS children (
    uuid                   TEXT PRIMARY KEY,
    account_uuid           TEXT NOT NULL REFERENCES accounts(uuid),
    given_name             TEXT NOT NULL,
    birthday               TEXT,    -- YYYY-MM-DD
    gender                 TEXT,
    age_at_birth           TEXT,
    language_list          TEXT NOT NULL DEFAULT '',
    condition_list         TEXT NOT NULL DEFAULT '',
    additional_information TEXT NOT NULL DEFAULT ''
);

-- Snapshots are immutable once written.
CREATE TABLE IF NOT EXISTS demographic_snapshots (
    uuid         TEXT PRIMARY KEY,
    account_uuid TEXT NOT NULL REFERENCES accounts(uuid),
    created_at   TEXT NOT NULL,
    data_json    TEXT NOT NULL    -- full DemographicSnapshot
);

CREATE TABLE IF NOT EXISTS responses (
    id                        INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid                      TEXT NOT NULL UNIQUE,
    study_uuid                TEXT NOT NULL REFERENCES studies(uuid),
    child_uuid                TEXT NOT NULL REFERENCES children(uuid),
    demographic_snapshot_uuid TEXT REFERENCES demographic_snapshots(uuid),
    date_created              TEXT NOT NULL,
    completed                 INTEGER NOT NULL DEFAULT 0,
    is_preview                INTEGER NOT NULL DEFAULT 0,
    eligibility_json          TEXT NOT NULL DEFAULT '[]',
    sequence_json             TEXT NOT NULL DEFAULT '[]',
    conditions_json           TEXT NOT NULL DEFAULT 'null',
    exp_data_json             TEXT NOT NULL DEFAULT 'null',
    global_event_timings_json TEXT NOT NULL DEFAULT 'null'
);

-- Append-only. Row id order is the authoritative ruling order.
CREATE TABLE IF NOT EXISTS consent_rulings (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    response_uuid TEXT NOT NULL REFERENCES responses(uuid) ON DELETE CASCADE,
    action        TEXT NOT NULL CHECK (action IN ('accepted', 'rejected', 'pending')),
    arbiter       TEXT NOT NULL,
    comment       TEXT,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS videos (
    uuid               TEXT PRIMARY KEY,
    response_uuid      TEXT NOT NULL REFERENCES responses(uuid) ON DELETE CASCADE,
    frame_id           TEXT NOT NULL,
    storage_key        TEXT NOT NULL,
    is_consent_footage INTEGER NOT NULL,
    created_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS feedback (
    uuid          TEXT PRIMARY KEY,
    response_uuid TEXT NOT NULL REFERENCES responses(uuid) ON DELETE CASCADE,
    researcher    TEXT NOT NULL,
    comment       TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS responses_study_idx  ON responses(study_uuid, id);
CREATE INDEX IF NOT EXISTS rulings_response_idx ON consent_rulings(response_uuid, id);
CREATE INDEX IF NOT EXISTS videos_response_idx  ON videos(response_uuid);

PRAGMA user_version = 1;
";
