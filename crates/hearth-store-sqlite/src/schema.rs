//! SQL schema for the Hearth SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS people (
    id           TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    role         TEXT NOT NULL DEFAULT 'guest',  -- 'admin' | 'adult' | 'child' | 'guest'
    restrictions TEXT,                           -- JSON Restrictions or NULL
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

-- The audit trail is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table. person_id carries no
-- foreign key so history outlives the people it mentions.
CREATE TABLE IF NOT EXISTS permissions_log (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    person_id TEXT,
    device_id TEXT NOT NULL,
    action    TEXT NOT NULL,
    allowed   INTEGER NOT NULL,
    reason    TEXT NOT NULL,
    context   TEXT NOT NULL DEFAULT '{}',  -- JSON PermissionContext as evaluated
    timestamp TEXT NOT NULL                -- RFC 3339 UTC, decision time
);

CREATE TABLE IF NOT EXISTS face_detections (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    person_id  TEXT NOT NULL REFERENCES people(id) ON DELETE CASCADE,
    camera_id  TEXT NOT NULL,
    location   TEXT NOT NULL,
    confidence REAL NOT NULL,
    timestamp  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS people_role_idx            ON people(role);
CREATE INDEX IF NOT EXISTS permissions_log_person_idx ON permissions_log(person_id);
CREATE INDEX IF NOT EXISTS face_detections_person_idx ON face_detections(person_id, timestamp);
CREATE INDEX IF NOT EXISTS face_detections_time_idx   ON face_detections(timestamp);

PRAGMA user_version = 1;
";
