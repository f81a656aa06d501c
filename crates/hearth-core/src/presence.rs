//! Presence records: the last known sighting of a person.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Location tag used when a detection arrives without one.
pub const UNKNOWN_LOCATION: &str = "unknown";

/// A single face-recognition sighting, and the presence fact derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
  pub person_id:  String,
  pub camera_id:  String,
  pub location:   String,
  /// Recognition confidence in `[0, 1]`.
  pub confidence: f64,
  pub timestamp:  DateTime<Utc>,
}

impl PresenceRecord {
  /// Build a record, rejecting confidences outside `[0, 1]` (including NaN).
  pub fn new(
    person_id: impl Into<String>,
    camera_id: impl Into<String>,
    location: Option<String>,
    confidence: f64,
    timestamp: DateTime<Utc>,
  ) -> Result<Self> {
    if !(0.0..=1.0).contains(&confidence) {
      return Err(Error::InvalidConfidence(confidence));
    }
    Ok(Self {
      person_id: person_id.into(),
      camera_id: camera_id.into(),
      location: location.unwrap_or_else(|| UNKNOWN_LOCATION.to_owned()),
      confidence,
      timestamp,
    })
  }

  /// Whether this sighting is no older than `max_age` at `now`.
  pub fn is_fresh(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
    now - self.timestamp <= max_age
  }
}

/// Household-wide snapshot of who is where.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceSummary {
  /// Every person with a record, fresh or stale.
  pub total_people:   usize,
  pub present_people: Vec<String>,
  /// Location tag to the ids of the people currently seen there.
  pub locations:      BTreeMap<String, Vec<String>>,
  pub last_updated:   DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn confidence_must_be_a_probability() {
    let now = Utc::now();
    assert!(PresenceRecord::new("p1", "cam", None, 0.0, now).is_ok());
    assert!(PresenceRecord::new("p1", "cam", None, 1.0, now).is_ok());
    assert!(matches!(
      PresenceRecord::new("p1", "cam", None, 1.2, now),
      Err(Error::InvalidConfidence(_))
    ));
    assert!(PresenceRecord::new("p1", "cam", None, f64::NAN, now).is_err());
  }

  #[test]
  fn missing_location_becomes_unknown() {
    let r = PresenceRecord::new("p1", "cam", None, 0.9, Utc::now()).unwrap();
    assert_eq!(r.location, UNKNOWN_LOCATION);
  }

  #[test]
  fn freshness_is_inclusive() {
    let now = Utc::now();
    let r = PresenceRecord::new(
      "p1",
      "cam",
      Some("kitchen".into()),
      0.9,
      now - chrono::Duration::minutes(5),
    )
    .unwrap();
    assert!(r.is_fresh(now, chrono::Duration::minutes(5)));
    assert!(!r.is_fresh(now, chrono::Duration::minutes(4)));
  }
}
