//! SQLite backend for the Hearth hub.
//!
//! Implements the engine's [`PeopleRepository`](hearth_core::ports::PeopleRepository)
//! and [`AuditSink`](hearth_core::ports::AuditSink), and owns the people
//! registry and the face-detection history. Wraps [`tokio_rusqlite`] so all
//! database access runs on a dedicated thread without blocking the async
//! runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{
  DEFAULT_AUDIT_LIMIT, DEFAULT_DETECTION_LIMIT, MAX_AUDIT_LIMIT,
  MAX_DETECTION_LIMIT, SqliteStore,
};
