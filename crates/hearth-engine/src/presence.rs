//! [`PresenceTracker`]: the in-memory "last seen" map.

use std::{collections::HashMap, sync::Arc};

use chrono::{Duration, Utc};
use hearth_core::presence::{PresenceRecord, PresenceSummary};
use parking_lot::RwLock;

/// Last known sighting per person, shared by every camera feed and every
/// permission check.
///
/// Exactly one record is kept per person. [`update`](Self::update) replaces
/// it unconditionally, so the latest call wins regardless of the timestamps
/// involved. State is volatile and lives only as long as the process.
///
/// Cloning is cheap and yields a handle onto the same map.
#[derive(Clone, Default)]
pub struct PresenceTracker {
  records: Arc<RwLock<HashMap<String, PresenceRecord>>>,
}

impl PresenceTracker {
  pub fn new() -> Self { Self::default() }

  /// Upsert the sighting for `record.person_id`.
  pub fn update(&self, record: PresenceRecord) {
    tracing::debug!(
      person_id = %record.person_id,
      camera_id = %record.camera_id,
      location = %record.location,
      confidence = record.confidence,
      "presence updated"
    );
    self.records.write().insert(record.person_id.clone(), record);
  }

  /// Whether `person_id` was seen within the last `max_age`.
  pub fn is_present(&self, person_id: &str, max_age: Duration) -> bool {
    let now = Utc::now();
    self
      .records
      .read()
      .get(person_id)
      .is_some_and(|r| r.is_fresh(now, max_age))
  }

  /// Fresh records at `location`, most recent first.
  pub fn people_at(&self, location: &str, max_age: Duration) -> Vec<PresenceRecord> {
    self.fresh_where(max_age, |r| r.location == location)
  }

  /// Every fresh record, most recent first.
  pub fn all_present(&self, max_age: Duration) -> Vec<PresenceRecord> {
    self.fresh_where(max_age, |_| true)
  }

  /// Last known location of `person_id`, however old.
  pub fn location_of(&self, person_id: &str) -> Option<String> {
    self.records.read().get(person_id).map(|r| r.location.clone())
  }

  /// Last known record of `person_id`, however old.
  pub fn presence_of(&self, person_id: &str) -> Option<PresenceRecord> {
    self.records.read().get(person_id).cloned()
  }

  /// Snapshot of who is present and where.
  pub fn summary(&self, max_age: Duration) -> PresenceSummary {
    let now = Utc::now();
    let records = self.records.read();

    let mut present_people = Vec::new();
    let mut locations = std::collections::BTreeMap::<String, Vec<String>>::new();
    for record in records.values().filter(|r| r.is_fresh(now, max_age)) {
      present_people.push(record.person_id.clone());
      locations
        .entry(record.location.clone())
        .or_default()
        .push(record.person_id.clone());
    }
    present_people.sort();
    locations.values_mut().for_each(|ids| ids.sort());

    PresenceSummary {
      total_people: records.len(),
      present_people,
      locations,
      last_updated: now,
    }
  }

  /// Number of people with a record, fresh or stale.
  pub fn len(&self) -> usize { self.records.read().len() }

  pub fn is_empty(&self) -> bool { self.records.read().is_empty() }

  fn fresh_where(
    &self,
    max_age: Duration,
    keep: impl Fn(&PresenceRecord) -> bool,
  ) -> Vec<PresenceRecord> {
    let now = Utc::now();
    let mut out: Vec<PresenceRecord> = self
      .records
      .read()
      .values()
      .filter(|r| r.is_fresh(now, max_age) && keep(r))
      .cloned()
      .collect();
    out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    out
  }
}
