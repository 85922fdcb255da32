//! Warning and alert delivery.
//!
//! The engine only needs two fire-and-forget calls; everything behind
//! them (webhook relays, SMS gateways, desktop notifications) is an
//! external collaborator. Delivery guarantees live with the receiver:
//! warning notices carry a stable key so repeated sends update rather
//! than stack, and every payload carries a unique event id so receivers
//! can deduplicate replays.

use chrono::Utc;
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::json;

use crate::error::DispatchError;

/// Stable identifier for the inactivity warning notice. The delivery
/// layer collapses repeats under the same key.
pub const WARNING_NOTICE_KEY: &str = "inactivity-warning";

/// The warning notice shown while the subject is inside the warning
/// window.
#[derive(Debug, Clone, Serialize)]
pub struct WarningNotice {
    pub key: String,
    pub title: String,
    pub body: String,
    pub elapsed_ms: i64,
}

impl WarningNotice {
    pub fn inactivity(elapsed_ms: i64) -> Self {
        let hours = elapsed_ms / (60 * 60 * 1000);
        Self {
            key: WARNING_NOTICE_KEY.to_string(),
            title: "Are you still there?".to_string(),
            body: format!(
                "No activity detected for {hours} hours. Check in to confirm you are okay."
            ),
            elapsed_ms,
        }
    }
}

/// Side-effecting delivery of warnings and alerts.
pub trait AlertDispatcher: Send + Sync {
    /// Deliver the warning notice. Repeats inside the warning window are
    /// expected; dedup is the receiver's job via the notice key.
    fn send_warning(&self, notice: &WarningNotice) -> Result<(), DispatchError>;

    /// Deliver the outbound alert to the trusted contact.
    fn send_alert(&self, address: &str, message: &str) -> Result<(), DispatchError>;
}

impl<T: AlertDispatcher + ?Sized> AlertDispatcher for Box<T> {
    fn send_warning(&self, notice: &WarningNotice) -> Result<(), DispatchError> {
        (**self).send_warning(notice)
    }

    fn send_alert(&self, address: &str, message: &str) -> Result<(), DispatchError> {
        (**self).send_alert(address, message)
    }
}

impl<T: AlertDispatcher + ?Sized> AlertDispatcher for std::sync::Arc<T> {
    fn send_warning(&self, notice: &WarningNotice) -> Result<(), DispatchError> {
        (**self).send_warning(notice)
    }

    fn send_alert(&self, address: &str, message: &str) -> Result<(), DispatchError> {
        (**self).send_alert(address, message)
    }
}

/// Posts warnings and alerts as JSON to a configured webhook.
pub struct WebhookDispatcher {
    webhook_url: String,
    client: Client,
}

impl WebhookDispatcher {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client: Client::new(),
        }
    }

    fn post(&self, body: serde_json::Value) -> Result<(), DispatchError> {
        if self.webhook_url.is_empty() {
            return Err(DispatchError::NotConfigured(
                "webhook URL is empty".to_string(),
            ));
        }

        let resp = self.client.post(&self.webhook_url).json(&body).send()?;
        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().unwrap_or_default();
            Err(DispatchError::Rejected { status, body })
        }
    }
}

impl AlertDispatcher for WebhookDispatcher {
    fn send_warning(&self, notice: &WarningNotice) -> Result<(), DispatchError> {
        self.post(json!({
            "version": "1.0",
            "kind": "warning",
            "event_id": uuid::Uuid::new_v4().to_string(),
            "notice_key": notice.key,
            "title": notice.title,
            "body": notice.body,
            "elapsed_ms": notice.elapsed_ms,
            "at": Utc::now(),
        }))
    }

    fn send_alert(&self, address: &str, message: &str) -> Result<(), DispatchError> {
        if address.is_empty() {
            return Err(DispatchError::NotConfigured(
                "contact address is empty".to_string(),
            ));
        }
        self.post(json!({
            "version": "1.0",
            "kind": "alert",
            "event_id": uuid::Uuid::new_v4().to_string(),
            "address": address,
            "message": message,
            "at": Utc::now(),
        }))
    }
}

/// Writes human-readable lines to stderr. The fallback when no webhook
/// is configured.
pub struct ConsoleDispatcher;

impl AlertDispatcher for ConsoleDispatcher {
    fn send_warning(&self, notice: &WarningNotice) -> Result<(), DispatchError> {
        eprintln!("[warning] {}: {}", notice.title, notice.body);
        Ok(())
    }

    fn send_alert(&self, address: &str, message: &str) -> Result<(), DispatchError> {
        if address.is_empty() {
            return Err(DispatchError::NotConfigured(
                "contact address is empty".to_string(),
            ));
        }
        eprintln!("[alert] to {address}: {message}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_notice_has_stable_key() {
        let a = WarningNotice::inactivity(23 * 60 * 60 * 1000);
        let b = WarningNotice::inactivity(24 * 60 * 60 * 1000 - 1);
        assert_eq!(a.key, b.key);
        assert!(a.body.contains("23 hours"));
    }

    #[test]
    fn webhook_delivers_alert() {
        let mut server = mockito::Server::new();
        let hook = server
            .mock("POST", "/hook")
            .match_header("content-type", "application/json")
            .with_status(204)
            .create();

        let dispatcher = WebhookDispatcher::new(format!("{}/hook", server.url()));
        dispatcher.send_alert("+15550100", "call me").unwrap();
        hook.assert();
    }

    #[test]
    fn webhook_surfaces_rejection() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/hook")
            .with_status(500)
            .with_body("boom")
            .create();

        let dispatcher = WebhookDispatcher::new(format!("{}/hook", server.url()));
        let err = dispatcher.send_alert("+15550100", "call me").unwrap_err();
        assert!(matches!(err, DispatchError::Rejected { status: 500, .. }));
    }

    #[test]
    fn blank_targets_are_not_configured() {
        let dispatcher = WebhookDispatcher::new("");
        assert!(matches!(
            dispatcher.send_warning(&WarningNotice::inactivity(0)),
            Err(DispatchError::NotConfigured(_))
        ));

        let dispatcher = WebhookDispatcher::new("https://example.com/hook");
        assert!(matches!(
            dispatcher.send_alert("", "msg"),
            Err(DispatchError::NotConfigured(_))
        ));
    }

    #[test]
    fn webhook_warning_carries_notice_key() {
        let mut server = mockito::Server::new();
        let hook = server
            .mock("POST", "/hook")
            .match_body(mockito::Matcher::PartialJsonString(
                format!("{{\"notice_key\": \"{WARNING_NOTICE_KEY}\"}}"),
            ))
            .with_status(200)
            .create();

        let dispatcher = WebhookDispatcher::new(format!("{}/hook", server.url()));
        dispatcher
            .send_warning(&WarningNotice::inactivity(1000))
            .unwrap();
        hook.assert();
    }
}
