//! Evaluator tests against in-memory collaborators.

use std::{
  collections::HashMap,
  sync::Arc,
  time::{Duration, Instant},
};

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use hearth_core::{
  permission::{
    AuditEntry, BlockedAction, PermissionContext, REASON_AUTOMATED,
    REASON_CHECK_FAILED, REASON_PERSON_NOT_FOUND,
  },
  person::{Person, Restrictions, Role, TimeWindow},
  ports::{AuditSink, NotificationSink, PeopleRepository},
  presence::{PresenceRecord, UNKNOWN_LOCATION},
};
use parking_lot::Mutex;

use crate::{EngineConfig, PermissionEvaluator, PresenceTracker};

// ─── Fakes ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct FakeError(&'static str);

#[derive(Default)]
struct People {
  people:      HashMap<String, Person>,
  unreachable: bool,
}

impl People {
  fn with(people: impl IntoIterator<Item = Person>) -> Self {
    Self {
      people:      people.into_iter().map(|p| (p.id.clone(), p)).collect(),
      unreachable: false,
    }
  }
}

impl PeopleRepository for People {
  type Error = FakeError;

  async fn find_by_id(&self, id: &str) -> Result<Option<Person>, FakeError> {
    if self.unreachable {
      return Err(FakeError("database is locked"));
    }
    Ok(self.people.get(id).cloned())
  }
}

#[derive(Default)]
struct Audit {
  entries: Mutex<Vec<AuditEntry>>,
  broken:  bool,
}

impl AuditSink for Audit {
  type Error = FakeError;

  async fn append(&self, entry: &AuditEntry) -> Result<(), FakeError> {
    if self.broken {
      return Err(FakeError("disk full"));
    }
    self.entries.lock().push(entry.clone());
    Ok(())
  }
}

#[derive(Default)]
struct Alerts {
  sent:   Mutex<Vec<BlockedAction>>,
  broken: bool,
}

impl Alerts {
  /// Wait for the background delivery of `n` alerts.
  async fn delivered(&self, n: usize) -> Vec<BlockedAction> {
    tokio::time::timeout(Duration::from_secs(2), async {
      loop {
        {
          let sent = self.sent.lock();
          if sent.len() >= n {
            return sent.clone();
          }
        }
        tokio::task::yield_now().await;
      }
    })
    .await
    .expect("alerts were not delivered")
  }
}

impl NotificationSink for Alerts {
  type Error = FakeError;

  async fn notify(&self, alert: &BlockedAction) -> Result<(), FakeError> {
    self.sent.lock().push(alert.clone());
    if self.broken {
      return Err(FakeError("telegram unreachable"));
    }
    Ok(())
  }
}

type Evaluator = PermissionEvaluator<Arc<People>, Arc<Audit>, Arc<Alerts>>;

struct Harness {
  evaluator: Evaluator,
  audit:     Arc<Audit>,
  alerts:    Arc<Alerts>,
}

fn harness_with(people: People, audit: Audit, alerts: Alerts) -> Harness {
  let audit = Arc::new(audit);
  let alerts = Arc::new(alerts);
  let evaluator = PermissionEvaluator::new(
    Arc::new(people),
    audit.clone(),
    alerts.clone(),
    PresenceTracker::new(),
    EngineConfig::default(),
  );
  Harness { evaluator, audit, alerts }
}

fn harness(people: impl IntoIterator<Item = Person>) -> Harness {
  harness_with(People::with(people), Audit::default(), Alerts::default())
}

fn person(id: &str, role: Role, restrictions: Restrictions) -> Person {
  Person {
    id: id.into(),
    name: format!("{id}-name"),
    role,
    restrictions: Some(restrictions),
    created_at: Utc::now(),
    updated_at: Utc::now(),
  }
}

fn blocking_tv() -> Restrictions {
  Restrictions {
    blocked_devices: ["tv-living-room".to_owned()].into(),
    ..Restrictions::unrestricted()
  }
}

/// 2024-01-02 is a Tuesday.
fn tuesday(h: u32, m: u32) -> DateTime<FixedOffset> {
  FixedOffset::east_opt(0)
    .unwrap()
    .with_ymd_and_hms(2024, 1, 2, h, m, 0)
    .unwrap()
}

// ─── No person / unknown person ──────────────────────────────────────────────

#[tokio::test]
async fn automated_actions_are_allowed_and_audited() {
  let h = harness([]);
  let result = h
    .evaluator
    .check(PermissionContext::new("porch-light", "turn-on"))
    .await;

  assert!(result.allowed());
  assert_eq!(result.reason(), REASON_AUTOMATED);
  assert_eq!(h.audit.entries.lock().len(), 1);
  assert!(h.alerts.sent.lock().is_empty());
}

#[tokio::test]
async fn unknown_person_is_denied_without_a_dangling_id() {
  let h = harness([]);
  let result = h
    .evaluator
    .check(PermissionContext::new("tv", "turn-on").for_person("ghost"))
    .await;

  assert!(!result.allowed());
  assert_eq!(result.reason(), REASON_PERSON_NOT_FOUND);
  assert_eq!(result.person_id(), None);

  let entries = h.audit.entries.lock();
  assert_eq!(entries[0].result.person_id(), None);
  assert_eq!(entries[0].context.person_id, None);
  // Nobody to name in an alert.
  assert!(h.alerts.sent.lock().is_empty());
}

// ─── Policy outcomes ─────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_is_always_allowed() {
  let h = harness([person("boss", Role::Admin, blocking_tv())]);
  let ctx = PermissionContext::new("tv-living-room", "turn-on")
    .for_person("boss")
    .at(tuesday(23, 0))
    .in_location("garage");
  let result = h.evaluator.check(ctx).await;
  assert!(result.allowed());
  assert_eq!(result.reason(), "admin access granted");
}

#[tokio::test]
async fn blocked_device_is_denied_and_alerted() {
  let h = harness([person("p1", Role::Child, blocking_tv())]);
  let result = h
    .evaluator
    .check(PermissionContext::new("tv-living-room", "turn-on").for_person("p1"))
    .await;

  assert!(!result.allowed());
  assert!(result.reason().contains("tv-living-room"));
  assert_eq!(result.person_id(), Some("p1"));

  let sent = h.alerts.delivered(1).await;
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].person_name, "p1-name");
  assert_eq!(sent[0].reason, result.reason());
}

#[tokio::test]
async fn evening_window_blocks_on_a_tuesday_night() {
  let restrictions = Restrictions {
    time_limits: vec![
      TimeWindow::new("20:00", "23:59", [1, 2, 3, 4, 5]).unwrap(),
    ],
    ..Restrictions::unrestricted()
  };
  let h = harness([person("p1", Role::Child, restrictions)]);
  let ctx = PermissionContext::new("console", "turn-on").for_person("p1");

  let night = h.evaluator.check(ctx.clone().at(tuesday(21, 0))).await;
  assert!(!night.allowed());
  assert!(night.reason().contains("20:00-23:59"));

  let morning = h.evaluator.check(ctx.at(tuesday(10, 0))).await;
  assert!(morning.allowed());
  assert_eq!(morning.reason(), "permission granted");
}

#[tokio::test]
async fn identical_checks_give_identical_decisions() {
  let h = harness([person("p1", Role::Child, blocking_tv())]);
  let ctx = PermissionContext::new("tv-living-room", "turn-on")
    .for_person("p1")
    .at(tuesday(12, 0));

  let first = h.evaluator.check(ctx.clone()).await;
  let second = h.evaluator.check(ctx).await;
  assert_eq!(first.allowed(), second.allowed());
  assert_eq!(first.reason(), second.reason());
  assert_eq!(h.audit.entries.lock().len(), 2);
}

// ─── Presence enrichment ─────────────────────────────────────────────────────

fn kitchen_only() -> Restrictions {
  Restrictions {
    allowed_areas: ["kitchen".to_owned()].into(),
    ..Restrictions::default()
  }
}

#[tokio::test]
async fn location_is_filled_in_from_presence() {
  let h = harness([person("p1", Role::Child, kitchen_only())]);
  h.evaluator.presence().update(
    PresenceRecord::new("p1", "cam-garage", Some("garage".into()), 0.97, Utc::now())
      .unwrap(),
  );

  let result = h
    .evaluator
    .check(PermissionContext::new("drill", "turn-on").for_person("p1"))
    .await;
  assert!(!result.allowed());
  assert!(result.reason().contains("garage"));
  assert_eq!(
    h.audit.entries.lock()[0].context.location.as_deref(),
    Some("garage")
  );
}

#[tokio::test]
async fn explicit_location_beats_presence() {
  let h = harness([person("p1", Role::Child, kitchen_only())]);
  h.evaluator.presence().update(
    PresenceRecord::new("p1", "cam-garage", Some("garage".into()), 0.97, Utc::now())
      .unwrap(),
  );

  let result = h
    .evaluator
    .check(
      PermissionContext::new("kettle", "turn-on")
        .for_person("p1")
        .in_location("kitchen"),
    )
    .await;
  assert!(result.allowed());
}

#[tokio::test]
async fn enrichment_can_be_disabled() {
  let audit = Arc::new(Audit::default());
  let evaluator = PermissionEvaluator::new(
    Arc::new(People::with([person("p1", Role::Child, kitchen_only())])),
    audit.clone(),
    Arc::new(Alerts::default()),
    PresenceTracker::new(),
    EngineConfig {
      enrich_location: false,
      ..EngineConfig::default()
    },
  );
  evaluator.presence().update(
    PresenceRecord::new("p1", "cam", Some("garage".into()), 0.9, Utc::now()).unwrap(),
  );

  let result = evaluator
    .check(PermissionContext::new("drill", "turn-on").for_person("p1"))
    .await;
  assert!(result.allowed());
  assert_eq!(audit.entries.lock()[0].context.location, None);
}

#[tokio::test]
async fn untagged_sighting_does_not_become_a_location() {
  let h = harness([person("p1", Role::Child, kitchen_only())]);
  h.evaluator.presence().update(
    PresenceRecord::new("p1", "cam-hall", None, 0.9, Utc::now()).unwrap(),
  );
  assert_eq!(
    h.evaluator.presence().location_of("p1").as_deref(),
    Some(UNKNOWN_LOCATION)
  );

  let result = h
    .evaluator
    .check(PermissionContext::new("kettle", "turn-on").for_person("p1"))
    .await;
  assert!(result.allowed());
  assert_eq!(h.audit.entries.lock()[0].context.location, None);
}

// ─── Failure isolation ───────────────────────────────────────────────────────

#[tokio::test]
async fn repository_failure_fails_closed() {
  let people = People {
    unreachable: true,
    ..People::default()
  };
  let h = harness_with(people, Audit::default(), Alerts::default());
  let result = h
    .evaluator
    .check(PermissionContext::new("front-door", "unlock").for_person("p1"))
    .await;

  assert!(!result.allowed());
  assert_eq!(result.reason(), REASON_CHECK_FAILED);
  // Still audited, best effort.
  assert_eq!(h.audit.entries.lock().len(), 1);
}

#[tokio::test]
async fn audit_failure_does_not_change_the_decision() {
  let audit = Audit {
    broken: true,
    ..Audit::default()
  };
  let h = harness_with(
    People::with([person("p1", Role::Adult, Restrictions::unrestricted())]),
    audit,
    Alerts::default(),
  );
  let result = h
    .evaluator
    .check(PermissionContext::new("lamp", "turn-on").for_person("p1"))
    .await;
  assert!(result.allowed());
}

#[tokio::test]
async fn notification_failure_does_not_change_the_decision() {
  let alerts = Alerts {
    broken: true,
    ..Alerts::default()
  };
  let h = harness_with(
    People::with([person("p1", Role::Child, blocking_tv())]),
    Audit::default(),
    alerts,
  );
  let result = h
    .evaluator
    .check(PermissionContext::new("tv-living-room", "turn-on").for_person("p1"))
    .await;

  assert!(!result.allowed());
  assert!(result.reason().contains("tv-living-room"));
  assert_eq!(h.alerts.delivered(1).await.len(), 1);
  assert_eq!(h.audit.entries.lock().len(), 1);
}

struct SlowAlerts;

impl NotificationSink for SlowAlerts {
  type Error = FakeError;

  async fn notify(&self, _alert: &BlockedAction) -> Result<(), FakeError> {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Ok(())
  }
}

#[tokio::test]
async fn slow_notifier_does_not_hold_up_the_check() {
  let audit = Arc::new(Audit::default());
  let evaluator = PermissionEvaluator::new(
    Arc::new(People::with([person("p1", Role::Child, blocking_tv())])),
    audit.clone(),
    SlowAlerts,
    PresenceTracker::new(),
    EngineConfig::default(),
  );

  let started = Instant::now();
  let result = evaluator
    .check(PermissionContext::new("tv-living-room", "turn-on").for_person("p1"))
    .await;

  assert!(!result.allowed());
  assert!(started.elapsed() < Duration::from_millis(500));
  assert_eq!(audit.entries.lock().len(), 1);
}

#[tokio::test]
async fn person_without_restrictions_is_denied() {
  let mut p = person("p1", Role::Guest, Restrictions::default());
  p.restrictions = None;
  let h = harness([p]);
  let result = h
    .evaluator
    .check(PermissionContext::new("lamp", "turn-on").for_person("p1"))
    .await;
  assert!(!result.allowed());
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checks_are_all_audited() {
  let h = Arc::new(harness([
    person("p1", Role::Child, blocking_tv()),
    person("p2", Role::Adult, Restrictions::unrestricted()),
  ]));

  let tasks: Vec<_> = (0..50)
    .map(|i| {
      let h = h.clone();
      tokio::spawn(async move {
        let who = if i % 2 == 0 { "p1" } else { "p2" };
        h.evaluator
          .check(PermissionContext::new("tv-living-room", "turn-on").for_person(who))
          .await
      })
    })
    .collect();

  let mut denied = 0;
  for t in tasks {
    if !t.await.unwrap().allowed() {
      denied += 1;
    }
  }
  assert_eq!(denied, 25);
  assert_eq!(h.audit.entries.lock().len(), 50);
}
