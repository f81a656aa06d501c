//! Handler for `POST /permissions/check`.
//!
//! A well-formed request always answers 200 with a [`PermissionResult`];
//! failures inside the check come back as a denial, never as an error
//! status. Only a malformed body is rejected, with 400.

use axum::{Json, extract::State};
use hearth_core::{
  permission::{PermissionContext, PermissionResult},
  ports::NotificationSink,
};

use crate::{AppState, extract::ApiJson};

/// `POST /permissions/check`: body: [`PermissionContext`].
pub async fn check<N>(
  State(state): State<AppState<N>>,
  ApiJson(context): ApiJson<PermissionContext>,
) -> Json<PermissionResult>
where
  N: NotificationSink + 'static,
{
  Json(state.evaluator.check(context).await)
}
