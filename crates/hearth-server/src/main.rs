//! hearth server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `HEARTH_*`
//! environment variables, opens the SQLite store, warms the presence
//! tracker from recent sightings and serves the JSON API under `/api`.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use clap::Parser;
use hearth_api::AppState;
use hearth_engine::{PermissionEvaluator, PresenceTracker};
use hearth_server::{ServerConfig, expand_tilde, notify::Notifier, router, warm_start};
use hearth_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Hearth access-control and presence server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("HEARTH")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );

  let tracker = PresenceTracker::new();
  let replayed = warm_start(&store, &tracker, server_cfg.presence_warm_start_secs)
    .await
    .context("failed to replay recent detections")?;
  tracing::info!(replayed, people = tracker.len(), "presence tracker warmed");

  let notifier = Notifier::from_url(
    server_cfg.notify_webhook_url.as_deref(),
    Duration::from_secs(server_cfg.notify_timeout_secs),
  )
  .context("failed to build notifier")?;
  match &notifier {
    Notifier::Webhook(hook) => tracing::info!(url = hook.url(), "blocked actions go to webhook"),
    Notifier::Tracing(_) => tracing::info!("blocked actions are logged only"),
  }

  let evaluator = PermissionEvaluator::new(
    store.clone(),
    store.clone(),
    notifier,
    tracker,
    server_cfg.engine.clone(),
  );
  let app = router(AppState {
    store,
    evaluator: Arc::new(evaluator),
  });

  let address = server_cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
