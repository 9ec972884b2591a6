//! Notifier/Navigator: tells the visitor how a submission went and where
//! to go next.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 16;

/// Fallback shown when the intake endpoint gives no message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

/// A user-facing submission result.
///
/// On success the hosting page shows the message and, once acknowledged,
/// navigates to `redirect_url`. On failure it closes and returns to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub outcome: Outcome,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn success(message: impl Into<String>, redirect_url: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Success,
            title: "Success!".to_string(),
            message: message.into(),
            redirect_url: Some(redirect_url.into()),
            at: Utc::now(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failure,
            title: "Error".to_string(),
            message: message.into(),
            redirect_url: None,
            at: Utc::now(),
        }
    }
}

/// Receives submission notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Fans notices out to every subscriber (one per open event stream).
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notice>,
}

impl BroadcastNotifier {
    pub fn new() -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self { tx })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notice: &Notice) {
        tracing::info!(
            outcome = ?notice.outcome,
            redirect = notice.redirect_url.as_deref().unwrap_or(""),
            "{}",
            notice.message
        );
        // Ok if no page is listening
        let _ = self.tx.send(notice.clone());
    }
}
