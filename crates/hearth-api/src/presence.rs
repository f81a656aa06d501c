//! Handlers for presence queries.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/presence` | Optional `?max_age_secs`; everyone currently present |
//! | `GET`  | `/presence/summary` | Counts and people grouped by location |
//! | `GET`  | `/presence/locations/:location` | People currently at `location` |
//! | `GET`  | `/people/:id/presence` | `{"present":bool,"record":...}` |

use axum::{
  Json,
  extract::{Path, State},
};
use hearth_core::{
  ports::NotificationSink,
  presence::{PresenceRecord, PresenceSummary},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, extract::ApiQuery};

#[derive(Debug, Default, Deserialize)]
pub struct MaxAgeParams {
  /// Staleness cut-off; defaults to the engine's configured presence max age.
  pub max_age_secs: Option<u64>,
}

fn max_age<N>(state: &AppState<N>, params: &MaxAgeParams) -> chrono::Duration
where
  N: NotificationSink + 'static,
{
  match params.max_age_secs {
    Some(secs) => i64::try_from(secs)
      .ok()
      .and_then(chrono::Duration::try_seconds)
      .unwrap_or(chrono::Duration::MAX),
    None => state.evaluator.config().presence_max_age(),
  }
}

/// `GET /presence[?max_age_secs=<n>]`
pub async fn list<N>(
  State(state): State<AppState<N>>,
  ApiQuery(params): ApiQuery<MaxAgeParams>,
) -> Json<Vec<PresenceRecord>>
where
  N: NotificationSink + 'static,
{
  let max_age = max_age(&state, &params);
  Json(state.evaluator.presence().all_present(max_age))
}

/// `GET /presence/summary[?max_age_secs=<n>]`
pub async fn summary<N>(
  State(state): State<AppState<N>>,
  ApiQuery(params): ApiQuery<MaxAgeParams>,
) -> Json<PresenceSummary>
where
  N: NotificationSink + 'static,
{
  let max_age = max_age(&state, &params);
  Json(state.evaluator.presence().summary(max_age))
}

/// `GET /presence/locations/:location[?max_age_secs=<n>]`
pub async fn at_location<N>(
  State(state): State<AppState<N>>,
  Path(location): Path<String>,
  ApiQuery(params): ApiQuery<MaxAgeParams>,
) -> Json<Vec<PresenceRecord>>
where
  N: NotificationSink + 'static,
{
  let max_age = max_age(&state, &params);
  Json(state.evaluator.presence().people_at(&location, max_age))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PersonPresence {
  pub present: bool,
  /// Last sighting, even when stale.
  pub record:  Option<PresenceRecord>,
}

/// `GET /people/:id/presence[?max_age_secs=<n>]`
pub async fn person<N>(
  State(state): State<AppState<N>>,
  Path(id): Path<String>,
  ApiQuery(params): ApiQuery<MaxAgeParams>,
) -> Json<PersonPresence>
where
  N: NotificationSink + 'static,
{
  let max_age = max_age(&state, &params);
  let tracker = state.evaluator.presence();
  Json(PersonPresence {
    present: tracker.is_present(&id, max_age),
    record:  tracker.presence_of(&id),
  })
}
