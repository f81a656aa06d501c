//! The Hearth access-control and presence engine.
//!
//! [`PresenceTracker`] keeps the last known sighting of every person;
//! [`PermissionEvaluator`] combines it with the people registry and the
//! [`RestrictionPolicy`](hearth_core::policy::RestrictionPolicy) to decide
//! device actions, writing every decision to the [`AuditLog`].

mod audit;
mod config;
mod evaluator;
mod presence;

pub mod error;

pub use audit::AuditLog;
pub use config::{DEFAULT_PRESENCE_MAX_AGE_SECS, EngineConfig};
pub use error::{Error, Result};
pub use evaluator::PermissionEvaluator;
pub use presence::PresenceTracker;

#[cfg(test)]
mod tests;
