//! [`AuditLog`]: unconditional, failure-tolerant recording of decisions.

use hearth_core::{permission::AuditEntry, ports::AuditSink};

/// Wraps an [`AuditSink`] so that a failed append is reported to the
/// operational log and never to whoever asked for the decision.
pub struct AuditLog<A> {
  sink: A,
}

impl<A: AuditSink> AuditLog<A> {
  pub fn new(sink: A) -> Self { Self { sink } }

  pub fn sink(&self) -> &A { &self.sink }

  /// Append `entry`, returning whether the sink accepted it.
  pub async fn record(&self, entry: &AuditEntry) -> bool {
    match self.sink.append(entry).await {
      Ok(()) => true,
      Err(e) => {
        tracing::error!(
          error = %e,
          person_id = ?entry.result.person_id(),
          device_id = %entry.result.device_id(),
          action = %entry.result.action(),
          allowed = entry.result.allowed(),
          "failed to append permission decision to audit log"
        );
        false
      }
    }
  }
}
