//! Blocked-action notifiers.
//!
//! [`TracingNotifier`] only logs; [`WebhookNotifier`] POSTs a JSON alert to
//! an HTTP endpoint. [`Notifier`] picks one at startup so the evaluator is
//! built over a single concrete type.

use std::time::Duration;

use hearth_core::{permission::BlockedAction, ports::NotificationSink};
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
  #[error("webhook request failed: {0}")]
  Webhook(#[from] reqwest::Error),
}

// ─── Tracing ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
  type Error = NotifyError;

  async fn notify(&self, alert: &BlockedAction) -> Result<(), NotifyError> {
    tracing::info!(
      person = %alert.person_name,
      device_id = %alert.device_id,
      action = %alert.action,
      reason = %alert.reason,
      "blocked action"
    );
    Ok(())
  }
}

// ─── Webhook ─────────────────────────────────────────────────────────────────

/// Body sent to the webhook.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload<'a> {
  pub title:    &'static str,
  pub message:  String,
  pub priority: &'static str,
  pub category: &'static str,
  pub metadata: &'a BlockedAction,
}

impl<'a> AlertPayload<'a> {
  pub fn blocked_action(alert: &'a BlockedAction) -> Self {
    Self {
      title:    "Blocked action",
      message:  format!(
        "{} tried to {} on {}. Reason: {}",
        alert.person_name, alert.action, alert.device_id, alert.reason
      ),
      priority: "medium",
      category: "security",
      metadata: alert,
    }
  }
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
  client: Client,
  url:    String,
}

impl WebhookNotifier {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      url: url.into(),
    })
  }

  pub fn url(&self) -> &str { &self.url }
}

impl NotificationSink for WebhookNotifier {
  type Error = NotifyError;

  async fn notify(&self, alert: &BlockedAction) -> Result<(), NotifyError> {
    self
      .client
      .post(&self.url)
      .json(&AlertPayload::blocked_action(alert))
      .send()
      .await?
      .error_for_status()?;
    Ok(())
  }
}

// ─── Selection ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Notifier {
  Tracing(TracingNotifier),
  Webhook(WebhookNotifier),
}

impl Notifier {
  /// A webhook notifier when `url` is set, the tracing one otherwise.
  pub fn from_url(url: Option<&str>, timeout: Duration) -> Result<Self, NotifyError> {
    match url {
      Some(url) if !url.trim().is_empty() => {
        Ok(Self::Webhook(WebhookNotifier::new(url.trim(), timeout)?))
      }
      _ => Ok(Self::Tracing(TracingNotifier)),
    }
  }
}

impl NotificationSink for Notifier {
  type Error = NotifyError;

  async fn notify(&self, alert: &BlockedAction) -> Result<(), NotifyError> {
    match self {
      Self::Tracing(n) => n.notify(alert).await,
      Self::Webhook(n) => n.notify(alert).await,
    }
  }
}
