//! Engine tuning knobs.

use serde::Deserialize;

/// How long a sighting keeps a person "present", in seconds.
pub const DEFAULT_PRESENCE_MAX_AGE_SECS: u64 = 5 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  #[serde(default = "default_presence_max_age_secs")]
  pub presence_max_age_secs: u64,
  /// Fill a missing request location from the person's last sighting.
  #[serde(default = "default_enrich_location")]
  pub enrich_location:       bool,
}

impl EngineConfig {
  pub fn presence_max_age(&self) -> chrono::Duration {
    i64::try_from(self.presence_max_age_secs)
      .ok()
      .and_then(chrono::Duration::try_seconds)
      .unwrap_or(chrono::Duration::MAX)
  }
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      presence_max_age_secs: DEFAULT_PRESENCE_MAX_AGE_SECS,
      enrich_location:       default_enrich_location(),
    }
  }
}

fn default_presence_max_age_secs() -> u64 { DEFAULT_PRESENCE_MAX_AGE_SECS }

fn default_enrich_location() -> bool { true }
