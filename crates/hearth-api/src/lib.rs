//! JSON REST API for the Hearth hub.
//!
//! Exposes an axum [`Router`] over a [`PermissionEvaluator`] and its SQLite
//! store. Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", hearth_api::api_router(state))
//! ```

pub mod audit;
pub mod error;
pub mod extract;
pub mod people;
pub mod permissions;
pub mod presence;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use hearth_core::ports::NotificationSink;
use hearth_engine::PermissionEvaluator;
use hearth_store_sqlite::SqliteStore;

pub use error::ApiError;

/// The evaluator as wired by the API: SQLite for people and audit, `N` for
/// alerts.
pub type Evaluator<N> = PermissionEvaluator<Arc<SqliteStore>, Arc<SqliteStore>, N>;

/// Shared state threaded through all handlers.
pub struct AppState<N> {
  pub store:     Arc<SqliteStore>,
  pub evaluator: Arc<Evaluator<N>>,
}

impl<N> Clone for AppState<N> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      evaluator: self.evaluator.clone(),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<N>(state: AppState<N>) -> Router<()>
where
  N: NotificationSink + 'static,
{
  Router::new()
    // Permissions
    .route("/permissions/check", post(permissions::check::<N>))
    // Presence
    .route("/presence", get(presence::list::<N>))
    .route("/presence/summary", get(presence::summary::<N>))
    .route("/presence/locations/{location}", get(presence::at_location::<N>))
    // People
    .route("/people", get(people::list::<N>).post(people::create::<N>))
    .route(
      "/people/{id}",
      get(people::get_one::<N>)
        .put(people::update::<N>)
        .delete(people::delete::<N>),
    )
    .route("/people/{id}/presence", get(presence::person::<N>))
    .route(
      "/people/{id}/detections",
      get(people::detections::<N>).post(people::record_detection::<N>),
    )
    // Audit
    .route("/audit", get(audit::list::<N>))
    .with_state(state)
}
