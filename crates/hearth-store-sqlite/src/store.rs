//! [`SqliteStore`]: people registry, audit trail, and detection history.

use std::path::Path;

use chrono::{DateTime, Utc};
use hearth_core::{
  permission::{AuditEntry, AuditQuery, AuditRecord},
  person::{NewPerson, Person, PersonUpdate, Restrictions},
  ports::{AuditSink, PeopleRepository},
  presence::PresenceRecord,
};
use rusqlite::{OptionalExtension as _, types::Value};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    AUDIT_COLUMNS, DETECTION_COLUMNS, PERSON_COLUMNS, RawAuditRecord,
    RawDetection, RawPerson, encode_dt, encode_restrictions,
  },
  schema::SCHEMA,
};

/// Detections returned by [`SqliteStore::detections_for`] when no limit is
/// given, and the most it will ever return.
pub const DEFAULT_DETECTION_LIMIT: usize = 50;
pub const MAX_DETECTION_LIMIT: usize = 1000;

/// Audit rows returned by [`SqliteStore::audit_history`] when no limit is
/// given, and the most it will ever return.
pub const DEFAULT_AUDIT_LIMIT: usize = 100;
pub const MAX_AUDIT_LIMIT: usize = 1000;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Hearth store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
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

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  #[cfg(test)]
  pub(crate) fn conn_for_tests(&self) -> &tokio_rusqlite::Connection { &self.conn }

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

  // ── People registry ───────────────────────────────────────────────────────

  /// Register a new person with a generated id.
  pub async fn create_person(&self, input: NewPerson) -> Result<Person> {
    let now = Utc::now();
    let person = Person {
      id:           format!("person-{}", Uuid::new_v4().simple()),
      name:         input.name,
      role:         input.role,
      restrictions: Some(input.restrictions.unwrap_or_else(Restrictions::unrestricted)),
      created_at:   now,
      updated_at:   now,
    };

    let id           = person.id.clone();
    let name         = person.name.clone();
    let role         = person.role.as_ref().to_owned();
    let restrictions = encode_restrictions(person.restrictions.as_ref())?;
    let at           = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO people (id, name, role, restrictions, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![id, name, role, restrictions, at],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(person_id = %person.id, role = %person.role, "person registered");
    Ok(person)
  }

  /// Retrieve a person by id. Returns `None` if not found.
  pub async fn get_person(&self, id: &str) -> Result<Option<Person>> {
    let id = id.to_owned();
    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PERSON_COLUMNS} FROM people WHERE id = ?1"),
              rusqlite::params![id],
              RawPerson::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  /// All registered people, ordered by name.
  pub async fn list_people(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {PERSON_COLUMNS} FROM people ORDER BY name, id"))?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  /// Apply a partial update. Returns `None` if the person does not exist.
  pub async fn update_person(
    &self,
    id: &str,
    update: PersonUpdate,
  ) -> Result<Option<Person>> {
    let Some(mut person) = self.get_person(id).await? else {
      return Ok(None);
    };

    if let Some(name) = update.name {
      person.name = name;
    }
    if let Some(role) = update.role {
      person.role = role;
    }
    if let Some(restrictions) = update.restrictions {
      person.restrictions = Some(restrictions);
    }
    person.updated_at = Utc::now();

    let id_str       = person.id.clone();
    let name         = person.name.clone();
    let role         = person.role.as_ref().to_owned();
    let restrictions = encode_restrictions(person.restrictions.as_ref())?;
    let at           = encode_dt(person.updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE people SET name = ?2, role = ?3, restrictions = ?4, updated_at = ?5
           WHERE id = ?1",
          rusqlite::params![id_str, name, role, restrictions, at],
        )?)
      })
      .await?;

    // Deleted between the read and the write.
    if changed == 0 {
      return Ok(None);
    }
    tracing::info!(person_id = %person.id, "person updated");
    Ok(Some(person))
  }

  /// Remove a person and their detection history. Returns whether a row was
  /// deleted. Audit rows are kept.
  pub async fn delete_person(&self, id: &str) -> Result<bool> {
    let id_str = id.to_owned();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM people WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    if changed > 0 {
      tracing::info!(person_id = %id, "person deleted");
    }
    Ok(changed > 0)
  }

  // ── Face detections ───────────────────────────────────────────────────────

  /// Persist a sighting. Fails with [`Error::PersonNotFound`] for ids that
  /// are not registered.
  pub async fn record_detection(&self, record: &PresenceRecord) -> Result<()> {
    let person_id  = record.person_id.clone();
    let camera_id  = record.camera_id.clone();
    let location   = record.location.clone();
    let confidence = record.confidence;
    let at         = encode_dt(record.timestamp);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO face_detections (person_id, camera_id, location, confidence, timestamp)
           SELECT ?1, ?2, ?3, ?4, ?5
           WHERE EXISTS (SELECT 1 FROM people WHERE id = ?1)",
          rusqlite::params![person_id, camera_id, location, confidence, at],
        )?)
      })
      .await?;

    if inserted == 0 {
      return Err(Error::PersonNotFound(record.person_id.clone()));
    }
    Ok(())
  }

  /// Detection history for one person, newest first.
  pub async fn detections_for(
    &self,
    person_id: &str,
    limit: Option<usize>,
  ) -> Result<Vec<PresenceRecord>> {
    let person_id = person_id.to_owned();
    let limit = limit
      .unwrap_or(DEFAULT_DETECTION_LIMIT)
      .min(MAX_DETECTION_LIMIT) as i64;

    let raws: Vec<RawDetection> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DETECTION_COLUMNS} FROM face_detections
           WHERE person_id = ?1
           ORDER BY timestamp DESC, id DESC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![person_id, limit], RawDetection::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDetection::into_record).collect()
  }

  /// Every detection stamped after `since`, in arrival (insertion) order.
  /// Replaying the result into a presence tracker leaves each person at
  /// their last reported sighting, even when a late report carries an older
  /// timestamp.
  pub async fn detections_since(
    &self,
    since: DateTime<Utc>,
  ) -> Result<Vec<PresenceRecord>> {
    let since = encode_dt(since);

    let raws: Vec<RawDetection> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DETECTION_COLUMNS} FROM face_detections
           WHERE timestamp > ?1
           ORDER BY id ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![since], RawDetection::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDetection::into_record).collect()
  }

  // ── Audit history ─────────────────────────────────────────────────────────

  /// Read the audit trail back, newest first.
  pub async fn audit_history(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>> {
    let mut sql = format!("SELECT {AUDIT_COLUMNS} FROM permissions_log WHERE 1 = 1");
    let mut params: Vec<Value> = Vec::new();

    if let Some(person_id) = &query.person_id {
      params.push(Value::Text(person_id.clone()));
      sql.push_str(&format!(" AND person_id = ?{}", params.len()));
    }
    if let Some(allowed) = query.allowed {
      params.push(Value::Integer(i64::from(allowed)));
      sql.push_str(&format!(" AND allowed = ?{}", params.len()));
    }
    let limit = query
      .limit
      .unwrap_or(DEFAULT_AUDIT_LIMIT)
      .min(MAX_AUDIT_LIMIT) as i64;
    params.push(Value::Integer(limit));
    sql.push_str(&format!(" ORDER BY id DESC LIMIT ?{}", params.len()));

    let raws: Vec<RawAuditRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawAuditRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuditRecord::into_record).collect()
  }
}

// ─── Engine collaborators ────────────────────────────────────────────────────

impl PeopleRepository for SqliteStore {
  type Error = Error;

  async fn find_by_id(&self, id: &str) -> Result<Option<Person>> {
    self.get_person(id).await
  }
}

impl AuditSink for SqliteStore {
  type Error = Error;

  async fn append(&self, entry: &AuditEntry) -> Result<()> {
    let result    = &entry.result;
    let person_id = result.person_id().map(str::to_owned);
    let device_id = result.device_id().to_owned();
    let action    = result.action().to_owned();
    let allowed   = result.allowed();
    let reason    = result.reason().to_owned();
    let context   = serde_json::to_string(&entry.context)?;
    let at        = encode_dt(result.timestamp());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO permissions_log
             (person_id, device_id, action, allowed, reason, context, timestamp)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![person_id, device_id, action, allowed, reason, context, at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
