//! Collaborator traits the permission engine is wired against.
//!
//! Storage backends (e.g. `hearth-store-sqlite`) and delivery channels
//! implement these; the engine never depends on a concrete implementation.
//!
//! All methods return `Send` futures so implementations can be shared across
//! a multi-threaded tokio runtime.

use std::{future::Future, sync::Arc};

use crate::{
  permission::{AuditEntry, BlockedAction},
  person::Person,
};

/// Read access to the people registry.
pub trait PeopleRepository: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Look a person up by id. `Ok(None)` means the id is unknown.
  fn find_by_id<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + 'a;
}

/// Append-only destination for permission decisions.
pub trait AuditSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Durably append one entry. Each append is atomic on its own; no ordering
  /// across different people is promised.
  fn append<'a>(
    &'a self,
    entry: &'a AuditEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Delivery channel for blocked-action alerts.
pub trait NotificationSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn notify<'a>(
    &'a self,
    alert: &'a BlockedAction,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Shared handles ──────────────────────────────────────────────────────────

impl<T: PeopleRepository> PeopleRepository for Arc<T> {
  type Error = T::Error;

  fn find_by_id<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + 'a {
    (**self).find_by_id(id)
  }
}

impl<T: AuditSink> AuditSink for Arc<T> {
  type Error = T::Error;

  fn append<'a>(
    &'a self,
    entry: &'a AuditEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a {
    (**self).append(entry)
  }
}

impl<T: NotificationSink> NotificationSink for Arc<T> {
  type Error = T::Error;

  fn notify<'a>(
    &'a self,
    alert: &'a BlockedAction,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a {
    (**self).notify(alert)
  }
}
