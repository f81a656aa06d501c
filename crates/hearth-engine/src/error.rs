//! Error type for `hearth-engine`.
//!
//! These never reach callers of
//! [`PermissionEvaluator::check`](crate::PermissionEvaluator::check); they are
//! logged and turned into a denial.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("people repository error: {0}")]
  Repository(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
