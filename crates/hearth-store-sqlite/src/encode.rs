//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that lexical order matches time order.
//! Restrictions and audit contexts are stored as compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use hearth_core::{
  permission::AuditRecord,
  person::{Person, Restrictions, Role},
  presence::PresenceRecord,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Restrictions ────────────────────────────────────────────────────────────

pub fn encode_restrictions(r: Option<&Restrictions>) -> Result<Option<String>> {
  r.map(serde_json::to_string).transpose().map_err(Error::from)
}

pub fn decode_restrictions(s: Option<&str>) -> Result<Option<Restrictions>> {
  match s {
    None | Some("null") => Ok(None),
    Some(json) => Ok(Some(serde_json::from_str(json)?)),
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// Column order used by every `SELECT` that produces a [`RawPerson`].
pub const PERSON_COLUMNS: &str = "id, name, role, restrictions, created_at, updated_at";

/// A `people` row before decoding.
pub struct RawPerson {
  pub id:           String,
  pub name:         String,
  pub role:         String,
  pub restrictions: Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      name:         row.get(1)?,
      role:         row.get(2)?,
      restrictions: row.get(3)?,
      created_at:   row.get(4)?,
      updated_at:   row.get(5)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      id:           self.id,
      name:         self.name,
      role:         Role::parse(&self.role)?,
      restrictions: decode_restrictions(self.restrictions.as_deref())?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

pub const DETECTION_COLUMNS: &str = "person_id, camera_id, location, confidence, timestamp";

/// A `face_detections` row before decoding.
pub struct RawDetection {
  pub person_id:  String,
  pub camera_id:  String,
  pub location:   String,
  pub confidence: f64,
  pub timestamp:  String,
}

impl RawDetection {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:  row.get(0)?,
      camera_id:  row.get(1)?,
      location:   row.get(2)?,
      confidence: row.get(3)?,
      timestamp:  row.get(4)?,
    })
  }

  pub fn into_record(self) -> Result<PresenceRecord> {
    Ok(PresenceRecord {
      person_id:  self.person_id,
      camera_id:  self.camera_id,
      location:   self.location,
      confidence: self.confidence,
      timestamp:  decode_dt(&self.timestamp)?,
    })
  }
}

pub const AUDIT_COLUMNS: &str =
  "id, person_id, device_id, action, allowed, reason, context, timestamp";

/// A `permissions_log` row before decoding.
pub struct RawAuditRecord {
  pub id:        i64,
  pub person_id: Option<String>,
  pub device_id: String,
  pub action:    String,
  pub allowed:   bool,
  pub reason:    String,
  pub context:   String,
  pub timestamp: String,
}

impl RawAuditRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      person_id: row.get(1)?,
      device_id: row.get(2)?,
      action:    row.get(3)?,
      allowed:   row.get(4)?,
      reason:    row.get(5)?,
      context:   row.get(6)?,
      timestamp: row.get(7)?,
    })
  }

  pub fn into_record(self) -> Result<AuditRecord> {
    Ok(AuditRecord {
      id:        self.id,
      person_id: self.person_id,
      device_id: self.device_id,
      action:    self.action,
      allowed:   self.allowed,
      reason:    self.reason,
      context:   serde_json::from_str(&self.context)?,
      timestamp: decode_dt(&self.timestamp)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let early = DateTime::parse_from_rfc3339("2024-01-02T10:00:00Z")
      .unwrap()
      .with_timezone(&Utc);
    let later = early + chrono::Duration::microseconds(1500);
    assert!(encode_dt(early) < encode_dt(later));
    assert_eq!(encode_dt(early), "2024-01-02T10:00:00.000000Z");
    assert_eq!(decode_dt(&encode_dt(later)).unwrap(), later);
  }

  #[test]
  fn null_restrictions_decode_to_none() {
    assert_eq!(decode_restrictions(None).unwrap(), None);
    assert_eq!(decode_restrictions(Some("null")).unwrap(), None);
    assert!(decode_restrictions(Some("{not json")).is_err());
  }
}
