pub mod check;
pub mod checkin;
pub mod config;
pub mod signal;
pub mod status;
pub mod watch;

use vigil_core::{AlertDispatcher, ConsoleDispatcher, WatchConfig, WebhookDispatcher};

/// Webhook when configured, console otherwise.
pub(crate) fn dispatcher_for(config: &WatchConfig) -> Box<dyn AlertDispatcher> {
    if config.webhook_url.is_empty() {
        Box::new(ConsoleDispatcher)
    } else {
        Box::new(WebhookDispatcher::new(config.webhook_url.clone()))
    }
}
