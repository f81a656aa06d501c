//! Permission requests, decisions, and the records derived from them.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

pub const REASON_AUTOMATED: &str = "automated action - no person context";
pub const REASON_PERSON_NOT_FOUND: &str = "person not found";
pub const REASON_CHECK_FAILED: &str = "permission check failed due to error";

// ─── Request ─────────────────────────────────────────────────────────────────

/// A request to perform `action` on `device_id`, optionally on behalf of a
/// person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionContext {
  /// `None` marks a system-initiated action.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub person_id:    Option<String>,
  pub device_id:    String,
  pub action:       String,
  /// Evaluation instant; its offset decides the weekday and clock time used
  /// for time windows. Defaults to the host's local now.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub time:         Option<DateTime<FixedOffset>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub other_people: Option<Vec<String>>,
}

impl PermissionContext {
  pub fn new(device_id: impl Into<String>, action: impl Into<String>) -> Self {
    Self {
      person_id:    None,
      device_id:    device_id.into(),
      action:       action.into(),
      time:         None,
      location:     None,
      other_people: None,
    }
  }

  pub fn for_person(mut self, person_id: impl Into<String>) -> Self {
    self.person_id = Some(person_id.into());
    self
  }

  pub fn at(mut self, time: DateTime<FixedOffset>) -> Self {
    self.time = Some(time);
    self
  }

  pub fn in_location(mut self, location: impl Into<String>) -> Self {
    self.location = Some(location.into());
    self
  }

  pub fn with_others(mut self, people: Vec<String>) -> Self {
    self.other_people = Some(people);
    self
  }
}

// ─── Decision ────────────────────────────────────────────────────────────────

/// The outcome of a permission check. Built once and never modified; the same
/// value is returned to the caller and written to the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionResult {
  allowed:   bool,
  reason:    String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  person_id: Option<String>,
  device_id: String,
  action:    String,
  timestamp: DateTime<Utc>,
}

impl PermissionResult {
  /// Decide `context` with the given outcome, stamped now.
  pub fn decide(
    context: &PermissionContext,
    allowed: bool,
    reason: impl Into<String>,
  ) -> Self {
    Self {
      allowed,
      reason: reason.into(),
      person_id: context.person_id.clone(),
      device_id: context.device_id.clone(),
      action: context.action.clone(),
      timestamp: Utc::now(),
    }
  }

  /// Like [`decide`](Self::decide), but without recording who asked. Used when
  /// the supplied person id does not resolve to anyone.
  pub fn decide_anonymous(
    context: &PermissionContext,
    allowed: bool,
    reason: impl Into<String>,
  ) -> Self {
    Self {
      person_id: None,
      ..Self::decide(context, allowed, reason)
    }
  }

  pub fn allowed(&self) -> bool { self.allowed }

  pub fn reason(&self) -> &str { &self.reason }

  pub fn person_id(&self) -> Option<&str> { self.person_id.as_deref() }

  pub fn device_id(&self) -> &str { &self.device_id }

  pub fn action(&self) -> &str { &self.action }

  pub fn timestamp(&self) -> DateTime<Utc> { self.timestamp }
}

// ─── Audit & alerts ──────────────────────────────────────────────────────────

/// A decision together with the context it was made in, as handed to an
/// [`AuditSink`](crate::ports::AuditSink).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
  pub result:  PermissionResult,
  /// The effective context, including any location filled in from presence.
  pub context: PermissionContext,
}

/// A persisted audit row, as read back from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
  /// Monotonically increasing storage sequence number.
  pub id:        i64,
  pub person_id: Option<String>,
  pub device_id: String,
  pub action:    String,
  pub allowed:   bool,
  pub reason:    String,
  pub context:   serde_json::Value,
  pub timestamp: DateTime<Utc>,
}

/// Filters for reading the audit history back.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
  pub person_id: Option<String>,
  pub allowed:   Option<bool>,
  pub limit:     Option<usize>,
}

/// Payload of a blocked-action alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedAction {
  pub person_name: String,
  pub device_id:   String,
  pub action:      String,
  pub reason:      String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn context_accepts_minimal_json() {
    let ctx: PermissionContext =
      serde_json::from_str(r#"{"deviceId":"tv","action":"turn-on"}"#).unwrap();
    assert_eq!(ctx, PermissionContext::new("tv", "turn-on"));
  }

  #[test]
  fn context_accepts_full_json() {
    let ctx: PermissionContext = serde_json::from_str(
      r#"{
        "personId": "p1",
        "deviceId": "tv",
        "action": "turn-on",
        "time": "2024-01-02T21:00:00-03:00",
        "location": "living-room",
        "otherPeople": ["p2"]
      }"#,
    )
    .unwrap();
    assert_eq!(ctx.person_id.as_deref(), Some("p1"));
    assert_eq!(ctx.other_people, Some(vec!["p2".to_owned()]));
    assert_eq!(ctx.time.unwrap().offset().local_minus_utc(), -3 * 3600);
  }

  #[test]
  fn anonymous_result_drops_person_id() {
    let ctx = PermissionContext::new("tv", "turn-on").for_person("ghost");
    let result =
      PermissionResult::decide_anonymous(&ctx, false, REASON_PERSON_NOT_FOUND);
    assert_eq!(result.person_id(), None);

    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("personId").is_none());
    assert_eq!(json["deviceId"], "tv");
    assert_eq!(json["allowed"], false);
  }
}
