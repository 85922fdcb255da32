use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::SubjectState;
use crate::signal::ActivitySignal;

/// Every observable state change produces an Event.
/// The CLI prints them as JSON; embedders can subscribe to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// An activity signal was normalized into the ledger; a new episode
    /// began.
    ActivityRecorded {
        source: ActivitySignal,
        at: DateTime<Utc>,
    },
    /// The warning notice went out (repeats each tick inside the warning
    /// window; the delivery layer collapses duplicates by notice key).
    WarningIssued {
        elapsed_ms: i64,
        at: DateTime<Utc>,
    },
    /// The outbound alert was delivered to the dispatcher.
    AlertDispatched {
        address: String,
        at: DateTime<Utc>,
    },
    /// The alert stage fired but alerting is disabled by configuration.
    AlertSuppressed {
        at: DateTime<Utc>,
    },
    /// Dispatch failed; the episode is still marked as alerted.
    AlertDispatchFailed {
        reason: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SubjectState,
        elapsed_ms: i64,
        timeout_hours: i64,
        last_active_at: DateTime<Utc>,
        last_alert_sent_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
}
