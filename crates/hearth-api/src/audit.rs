//! Handler for `GET /audit`.

use axum::{Json, extract::State};
use hearth_core::{
  permission::{AuditQuery, AuditRecord},
  ports::NotificationSink,
};

use crate::{
  AppState,
  error::ApiError,
  extract::ApiQuery,
};

/// `GET /audit[?person_id=<id>][&allowed=<bool>][&limit=<n>]`: newest first.
pub async fn list<N>(
  State(state): State<AppState<N>>,
  ApiQuery(query): ApiQuery<AuditQuery>,
) -> Result<Json<Vec<AuditRecord>>, ApiError>
where
  N: NotificationSink + 'static,
{
  Ok(Json(state.store.audit_history(&query).await?))
}
