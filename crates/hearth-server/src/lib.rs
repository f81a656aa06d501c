//! Composition root for the Hearth server: configuration, notifier
//! selection, presence warm start and the top-level HTTP router.

pub mod notify;

use std::path::{Path, PathBuf};

use axum::Router;
use chrono::Utc;
use hearth_api::AppState;
use hearth_core::ports::NotificationSink;
use hearth_engine::{EngineConfig, PresenceTracker};
use hearth_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `HEARTH_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                     String,
  #[serde(default = "default_port")]
  pub port:                     u16,
  #[serde(default = "default_store_path")]
  pub store_path:               PathBuf,
  #[serde(default)]
  pub engine:                   EngineConfig,
  /// Sightings younger than this are replayed into the tracker at boot.
  #[serde(default = "default_warm_start_secs")]
  pub presence_warm_start_secs: u64,
  #[serde(default)]
  pub notify_webhook_url:       Option<String>,
  #[serde(default = "default_notify_timeout_secs")]
  pub notify_timeout_secs:      u64,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 3000 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/hearth/hearth.db") }

fn default_warm_start_secs() -> u64 { 600 }

fn default_notify_timeout_secs() -> u64 { 10 }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Warm start ───────────────────────────────────────────────────────────────

/// Replay recent sightings from the store into `tracker`. Returns how many
/// detections were applied.
pub async fn warm_start(
  store: &SqliteStore,
  tracker: &PresenceTracker,
  window_secs: u64,
) -> hearth_store_sqlite::Result<usize> {
  let window = i64::try_from(window_secs)
    .ok()
    .and_then(chrono::Duration::try_seconds)
    .unwrap_or(chrono::Duration::zero());
  let since = Utc::now() - window;

  let detections = store.detections_since(since).await?;
  let count = detections.len();
  for record in detections {
    tracker.update(record);
  }
  Ok(count)
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The JSON API mounted under `/api`, with request tracing.
pub fn router<N>(state: AppState<N>) -> Router
where
  N: NotificationSink + 'static,
{
  Router::new()
    .nest("/api", hearth_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}
