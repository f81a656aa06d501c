//! Error types for `hearth-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid time of day {0:?}, expected HH:MM")]
  InvalidTimeOfDay(String),

  #[error("invalid weekday index {0}, expected 0 (Sunday) through 6")]
  InvalidWeekday(u8),

  #[error("confidence {0} is outside [0, 1]")]
  InvalidConfidence(f64),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
