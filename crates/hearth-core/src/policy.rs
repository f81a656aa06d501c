//! The restriction policy: a pure decision over a person's static rules.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset};

use crate::{
  permission::PermissionContext,
  person::{Person, TimeWindow},
};

/// Which rule decided a request. `Display` renders the human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
  AdminAccess,
  /// A non-admin with no usable restrictions is treated as fully restricted.
  NoRestrictions,
  DeviceBlocked { device_id: String },
  ActionBlocked { action: String },
  TimeLimit { window: TimeWindow, weekday: u8 },
  LocationNotAllowed { location: String },
  Granted,
}

impl Verdict {
  pub fn is_allowed(&self) -> bool {
    matches!(self, Self::AdminAccess | Self::Granted)
  }
}

impl fmt::Display for Verdict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::AdminAccess => f.write_str("admin access granted"),
      Self::NoRestrictions => {
        f.write_str("no restrictions on record for this person")
      }
      Self::DeviceBlocked { device_id } => {
        write!(f, "device {device_id} is blocked for this person")
      }
      Self::ActionBlocked { action } => {
        write!(f, "action {action} is blocked for this person")
      }
      Self::TimeLimit { window, weekday } => {
        write!(f, "time limit active: {window} on day {weekday}")
      }
      Self::LocationNotAllowed { location } => {
        write!(f, "location {location} is not allowed for this person")
      }
      Self::Granted => f.write_str("permission granted"),
    }
  }
}

/// Evaluates a person's restrictions against a request.
///
/// Rules short-circuit in a fixed order and the first match decides, so the
/// order also determines which reason is reported:
///
/// 1. admin role → allow
/// 2. missing or empty restrictions → deny
/// 3. blocked device → deny
/// 4. blocked action → deny
/// 5. active time window, in declaration order → deny
/// 6. location present and outside the allowed areas → deny
/// 7. otherwise → allow
pub struct RestrictionPolicy;

impl RestrictionPolicy {
  /// Decide `context` for `person`. `now` is used when the context carries no
  /// explicit time.
  pub fn evaluate(
    person: &Person,
    context: &PermissionContext,
    now: DateTime<FixedOffset>,
  ) -> Verdict {
    if person.role.is_admin() {
      return Verdict::AdminAccess;
    }

    let Some(restrictions) =
      person.restrictions.as_ref().filter(|r| !r.is_empty())
    else {
      return Verdict::NoRestrictions;
    };

    if restrictions.blocked_devices.contains(&context.device_id) {
      return Verdict::DeviceBlocked {
        device_id: context.device_id.clone(),
      };
    }

    if restrictions.blocked_actions.contains(&context.action) {
      return Verdict::ActionBlocked {
        action: context.action.clone(),
      };
    }

    let at = context.time.unwrap_or(now);
    let weekday = at.weekday().num_days_from_sunday() as u8;
    let time = at.time();
    if let Some(window) = restrictions
      .time_limits
      .iter()
      .find(|w| w.covers(weekday, time))
    {
      return Verdict::TimeLimit {
        window: window.clone(),
        weekday,
      };
    }

    if let Some(location) = &context.location
      && !restrictions.allows_area(location)
    {
      return Verdict::LocationNotAllowed {
        location: location.clone(),
      };
    }

    Verdict::Granted
  }
}
