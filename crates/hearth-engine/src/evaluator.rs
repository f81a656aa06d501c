//! [`PermissionEvaluator`]: the public permission-check entry point.

use std::sync::Arc;

use chrono::Local;
use hearth_core::{
  permission::{
    AuditEntry, BlockedAction, PermissionContext, PermissionResult,
    REASON_AUTOMATED, REASON_CHECK_FAILED, REASON_PERSON_NOT_FOUND,
  },
  policy::RestrictionPolicy,
  ports::{AuditSink, NotificationSink, PeopleRepository},
  presence::UNKNOWN_LOCATION,
};

use crate::{AuditLog, EngineConfig, Error, PresenceTracker, Result};

/// A decision plus everything that has to happen after it.
struct Outcome {
  result:  PermissionResult,
  /// The context as actually evaluated (time and location filled in).
  context: PermissionContext,
  alert:   Option<BlockedAction>,
}

/// Decides whether a person may perform an action on a device.
///
/// Every call produces a [`PermissionResult`]: lookup and storage failures
/// resolve to a denial rather than an error, every decision is offered to the
/// audit log, and denials for known people raise a blocked-action alert.
/// Alerts are delivered on a spawned task, so `check` never waits on the
/// notifier and delivery cannot affect the result.
pub struct PermissionEvaluator<P, A, N> {
  people:   P,
  audit:    AuditLog<A>,
  notifier: Arc<N>,
  presence: PresenceTracker,
  config:   EngineConfig,
}

impl<P, A, N> PermissionEvaluator<P, A, N>
where
  P: PeopleRepository,
  A: AuditSink,
  N: NotificationSink + 'static,
{
  pub fn new(
    people: P,
    audit: A,
    notifier: N,
    presence: PresenceTracker,
    config: EngineConfig,
  ) -> Self {
    Self {
      people,
      audit: AuditLog::new(audit),
      notifier: Arc::new(notifier),
      presence,
      config,
    }
  }

  pub fn presence(&self) -> &PresenceTracker { &self.presence }

  pub fn config(&self) -> &EngineConfig { &self.config }

  pub fn people(&self) -> &P { &self.people }

  /// Check `context` and return the decision. Never fails.
  pub async fn check(&self, context: PermissionContext) -> PermissionResult {
    let outcome = match self.decide(context.clone()).await {
      Ok(outcome) => outcome,
      Err(e) => {
        tracing::error!(
          error = %e,
          person_id = ?context.person_id,
          device_id = %context.device_id,
          action = %context.action,
          "permission check failed, denying"
        );
        Outcome {
          result: PermissionResult::decide(&context, false, REASON_CHECK_FAILED),
          context,
          alert: None,
        }
      }
    };

    let entry = AuditEntry {
      result:  outcome.result,
      context: outcome.context,
    };
    self.audit.record(&entry).await;

    if let Some(alert) = outcome.alert {
      self.dispatch(alert);
    }

    entry.result
  }

  /// Deliver `alert` in the background. Failures only reach the log.
  fn dispatch(&self, alert: BlockedAction) {
    let notifier = self.notifier.clone();
    tokio::spawn(async move {
      if let Err(e) = notifier.notify(&alert).await {
        tracing::warn!(
          error = %e,
          device_id = %alert.device_id,
          action = %alert.action,
          "failed to deliver blocked-action alert"
        );
      }
    });
  }

  async fn decide(&self, mut context: PermissionContext) -> Result<Outcome> {
    let Some(person_id) = context.person_id.clone() else {
      tracing::debug!(
        device_id = %context.device_id,
        action = %context.action,
        "no person context, allowing automated action"
      );
      return Ok(Outcome {
        result: PermissionResult::decide(&context, true, REASON_AUTOMATED),
        context,
        alert: None,
      });
    };

    let person = self
      .people
      .find_by_id(&person_id)
      .await
      .map_err(|e| Error::Repository(Box::new(e)))?;

    let Some(person) = person else {
      tracing::info!(%person_id, device_id = %context.device_id, "unknown person, denying");
      context.person_id = None;
      return Ok(Outcome {
        result: PermissionResult::decide_anonymous(
          &context,
          false,
          REASON_PERSON_NOT_FOUND,
        ),
        context,
        alert: None,
      });
    };

    // An untagged camera says nothing about where the person is.
    if context.location.is_none() && self.config.enrich_location {
      context.location = self
        .presence
        .location_of(&person_id)
        .filter(|loc| loc.as_str() != UNKNOWN_LOCATION);
    }
    let now = *context.time.get_or_insert_with(|| Local::now().fixed_offset());

    let verdict = RestrictionPolicy::evaluate(&person, &context, now);
    let result =
      PermissionResult::decide(&context, verdict.is_allowed(), verdict.to_string());

    let alert = if verdict.is_allowed() {
      None
    } else {
      tracing::info!(
        %person_id,
        device_id = %context.device_id,
        action = %context.action,
        reason = %verdict,
        "permission denied"
      );
      Some(BlockedAction {
        person_name: person.name,
        device_id:   context.device_id.clone(),
        action:      context.action.clone(),
        reason:      result.reason().to_owned(),
      })
    };

    Ok(Outcome { result, context, alert })
  }
}
