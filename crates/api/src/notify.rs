//! Notification capability.
//!
//! Delivery is best effort: callers log a [`NotifyError`] and move on.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use veil_types::{NotificationEvent, TransportError};

use crate::transport::{HttpRequest, Transport};

const WEBHOOK_USERNAME: &str = "Veil";
const EMBED_COLOR: u32 = 5_814_783;

/// Error surfaced when an event could not be delivered.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error("notification rejected with HTTP status {0}")]
    Rejected(u16),

    #[error("notification payload could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Delivers notification events.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

/// Notifier used when no destination is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        debug!(title = %event.title, "no notification destination configured; dropping event");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    username: &'a str,
    embeds: Vec<Embed<'a>>,
}

#[derive(Debug, Serialize)]
struct Embed<'a> {
    title: &'a str,
    description: &'a str,
    color: u32,
    footer: Footer<'a>,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct Footer<'a> {
    text: &'a str,
}

/// Posts events to a chat webhook as a single embed.
pub struct WebhookNotifier {
    url: String,
    transport: Arc<dyn Transport>,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            url: url.into(),
            transport,
        }
    }

    fn payload(event: &NotificationEvent) -> Result<serde_json::Value, NotifyError> {
        let payload = WebhookPayload {
            username: WEBHOOK_USERNAME,
            embeds: vec![Embed {
                title: &event.title,
                description: &event.description,
                color: EMBED_COLOR,
                footer: Footer { text: WEBHOOK_USERNAME },
                timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            }],
        };
        Ok(serde_json::to_value(payload)?)
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let request = HttpRequest::post(&self.url).json(&Self::payload(event)?);
        let response = self.transport.send(request)?;
        if !response.is_success() {
            return Err(NotifyError::Rejected(response.status));
        }
        debug!(status = response.status, "notification delivered");
        Ok(())
    }
}
