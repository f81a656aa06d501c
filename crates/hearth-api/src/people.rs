//! Handlers for the people registry and face-detection ingestion.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/people` | Ordered by name |
//! | `POST`   | `/people` | Body: [`NewPerson`]; returns 201 |
//! | `GET`    | `/people/:id` | 404 if not found |
//! | `PUT`    | `/people/:id` | Body: [`PersonUpdate`]; partial |
//! | `DELETE` | `/people/:id` | `{"success":true}` |
//! | `POST`   | `/people/:id/detections` | Body: [`DetectionBody`]; updates presence |
//! | `GET`    | `/people/:id/detections` | Optional `?limit`, newest first |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use hearth_core::{
  person::{NewPerson, Person, PersonUpdate},
  ports::NotificationSink,
  presence::PresenceRecord,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
  AppState,
  error::ApiError,
  extract::{ApiJson, ApiQuery},
};

// ─── Registry ────────────────────────────────────────────────────────────────

/// `GET /people`
pub async fn list<N>(
  State(state): State<AppState<N>>,
) -> Result<Json<Vec<Person>>, ApiError>
where
  N: NotificationSink + 'static,
{
  Ok(Json(state.store.list_people().await?))
}

/// `POST /people`: body: `{"name":"Mia","role":"child","restrictions":{...}}`
pub async fn create<N>(
  State(state): State<AppState<N>>,
  ApiJson(body): ApiJson<NewPerson>,
) -> Result<impl IntoResponse, ApiError>
where
  N: NotificationSink + 'static,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("name is required".into()));
  }
  let person = state.store.create_person(body).await?;
  Ok((StatusCode::CREATED, Json(person)))
}

/// `GET /people/:id`
pub async fn get_one<N>(
  State(state): State<AppState<N>>,
  Path(id): Path<String>,
) -> Result<Json<Person>, ApiError>
where
  N: NotificationSink + 'static,
{
  let person = state
    .store
    .get_person(&id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(person))
}

/// `PUT /people/:id`
pub async fn update<N>(
  State(state): State<AppState<N>>,
  Path(id): Path<String>,
  ApiJson(body): ApiJson<PersonUpdate>,
) -> Result<Json<Person>, ApiError>
where
  N: NotificationSink + 'static,
{
  let person = state
    .store
    .update_person(&id, body)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(person))
}

/// `DELETE /people/:id`
pub async fn delete<N>(
  State(state): State<AppState<N>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  N: NotificationSink + 'static,
{
  if !state.store.delete_person(&id).await? {
    return Err(ApiError::NotFound(format!("person {id} not found")));
  }
  Ok(Json(json!({ "success": true })))
}

// ─── Detections ──────────────────────────────────────────────────────────────

/// A recognised face, as reported by the detection pipeline.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionBody {
  pub camera_id:  String,
  pub location:   Option<String>,
  pub confidence: f64,
  /// Defaults to the time of arrival.
  pub timestamp:  Option<DateTime<Utc>>,
}

/// `POST /people/:id/detections`: persists the sighting and makes it the
/// person's current presence. Returns 201 + the stored record.
pub async fn record_detection<N>(
  State(state): State<AppState<N>>,
  Path(id): Path<String>,
  ApiJson(body): ApiJson<DetectionBody>,
) -> Result<impl IntoResponse, ApiError>
where
  N: NotificationSink + 'static,
{
  let record = PresenceRecord::new(
    id,
    body.camera_id,
    body.location,
    body.confidence,
    body.timestamp.unwrap_or_else(Utc::now),
  )
  .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  state.store.record_detection(&record).await?;
  state.evaluator.presence().update(record.clone());
  Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub limit: Option<usize>,
}

/// `GET /people/:id/detections[?limit=<n>]`
pub async fn detections<N>(
  State(state): State<AppState<N>>,
  Path(id): Path<String>,
  ApiQuery(params): ApiQuery<HistoryParams>,
) -> Result<Json<Vec<PresenceRecord>>, ApiError>
where
  N: NotificationSink + 'static,
{
  Ok(Json(state.store.detections_for(&id, params.limit).await?))
}
