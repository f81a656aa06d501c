//! Person: an identity under access-control policy.
//!
//! People are created and edited by the registry; the permission engine only
//! ever reads them.

use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

/// Sentinel entry in [`Restrictions::allowed_areas`] meaning "any location".
pub const ALL_AREAS: &str = "all";

// ─── Role ────────────────────────────────────────────────────────────────────

/// The household role of a person. `Admin` bypasses every restriction.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  Adult,
  Child,
  Guest,
}

impl Role {
  /// Parse a stored role string, mapping failures onto [`Error::UnknownRole`].
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownRole(s.to_owned()))
  }

  pub fn is_admin(self) -> bool { matches!(self, Self::Admin) }
}

// ─── Time windows ────────────────────────────────────────────────────────────

/// A recurring denial window: the person is restricted while "now" falls on
/// one of `days` between `start` and `end` (both inclusive, minute precision).
///
/// A window whose `start` is later than its `end` wraps past midnight. Its
/// `days` name the weekday on which the window opens, so a Friday 20:00-06:00
/// window also covers Saturday until 06:00.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow", into = "RawTimeWindow")]
pub struct TimeWindow {
  start: NaiveTime,
  end:   NaiveTime,
  /// Weekday indices, 0 = Sunday.
  days:  BTreeSet<u8>,
}

impl TimeWindow {
  /// Build a window from `HH:MM` strings and weekday indices (0 = Sunday).
  pub fn new(
    start: &str,
    end: &str,
    days: impl IntoIterator<Item = u8>,
  ) -> Result<Self> {
    let days = days
      .into_iter()
      .map(|d| if d <= 6 { Ok(d) } else { Err(Error::InvalidWeekday(d)) })
      .collect::<Result<BTreeSet<_>>>()?;
    Ok(Self {
      start: parse_hhmm(start)?,
      end: parse_hhmm(end)?,
      days,
    })
  }

  pub fn start(&self) -> NaiveTime { self.start }

  pub fn end(&self) -> NaiveTime { self.end }

  pub fn days(&self) -> &BTreeSet<u8> { &self.days }

  pub fn wraps_midnight(&self) -> bool { self.start > self.end }

  /// Whether this window is active on `weekday` (0 = Sunday) at `time`.
  pub fn covers(&self, weekday: u8, time: NaiveTime) -> bool {
    let time = truncate_to_minute(time);
    if !self.wraps_midnight() {
      return self.days.contains(&weekday)
        && self.start <= time
        && time <= self.end;
    }

    let previous = (weekday + 6) % 7;
    (self.days.contains(&weekday) && time >= self.start)
      || (self.days.contains(&previous) && time <= self.end)
  }
}

impl fmt::Display for TimeWindow {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", format_hhmm(self.start), format_hhmm(self.end))
  }
}

/// Wire shape of a [`TimeWindow`]: `{"start":"20:00","end":"23:59","days":[1]}`.
#[derive(Serialize, Deserialize)]
struct RawTimeWindow {
  start: String,
  end:   String,
  #[serde(default)]
  days:  Vec<u8>,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
  type Error = Error;

  fn try_from(raw: RawTimeWindow) -> Result<Self> {
    TimeWindow::new(&raw.start, &raw.end, raw.days)
  }
}

impl From<TimeWindow> for RawTimeWindow {
  fn from(w: TimeWindow) -> Self {
    RawTimeWindow {
      start: format_hhmm(w.start),
      end:   format_hhmm(w.end),
      days:  w.days.into_iter().collect(),
    }
  }
}

fn parse_hhmm(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s.trim(), "%H:%M")
    .map_err(|_| Error::InvalidTimeOfDay(s.to_owned()))
}

fn format_hhmm(t: NaiveTime) -> String { t.format("%H:%M").to_string() }

fn truncate_to_minute(t: NaiveTime) -> NaiveTime {
  t.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(t)
}

// ─── Restrictions ────────────────────────────────────────────────────────────

/// Static rules limiting what a non-admin person may do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restrictions {
  #[serde(default)]
  pub blocked_devices: BTreeSet<String>,
  #[serde(default)]
  pub blocked_actions: BTreeSet<String>,
  /// Checked in declaration order; the first active window is reported.
  #[serde(default)]
  pub time_limits:     Vec<TimeWindow>,
  /// Location tags the person may act from; [`ALL_AREAS`] lifts the check.
  #[serde(default)]
  pub allowed_areas:   BTreeSet<String>,
}

impl Restrictions {
  /// Nothing blocked, every area allowed. The registry default for new people.
  pub fn unrestricted() -> Self {
    Self {
      allowed_areas: BTreeSet::from([ALL_AREAS.to_owned()]),
      ..Self::default()
    }
  }

  /// `true` when no rule of any kind has been recorded.
  pub fn is_empty(&self) -> bool {
    self.blocked_devices.is_empty()
      && self.blocked_actions.is_empty()
      && self.time_limits.is_empty()
      && self.allowed_areas.is_empty()
  }

  pub fn allows_area(&self, location: &str) -> bool {
    self.allowed_areas.contains(ALL_AREAS)
      || self.allowed_areas.contains(location)
  }
}

// ─── Person ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
  pub id:           String,
  pub name:         String,
  pub role:         Role,
  /// `None` only for records written without a restrictions payload; the
  /// policy treats that as fully restricted for non-admins.
  #[serde(default)]
  pub restrictions: Option<Restrictions>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Input for registering a new person.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
  pub name:         String,
  pub role:         Role,
  /// Defaults to [`Restrictions::unrestricted`] when omitted.
  #[serde(default)]
  pub restrictions: Option<Restrictions>,
}

/// A partial edit of a registered person; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonUpdate {
  pub name:         Option<String>,
  pub role:         Option<Role>,
  pub restrictions: Option<Restrictions>,
}
