//! The check runner: decision to side effects.
//!
//! One check is: read ledger, evaluate, dispatch whatever is due, mark
//! the alert attempt. The dispatch attempt happens-before the
//! `record_alert_sent` write, and the marker is written even when
//! dispatch fails -- at most one alert attempt per episode, by choice.
//! A failed send is not retried until the next episode.
//!
//! Storage failures abort the check before any side effect; the caller
//! simply waits for the next tick.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::escalation::{evaluate, EscalationDecision};
use crate::dispatch::{AlertDispatcher, WarningNotice};
use crate::error::CoreError;
use crate::events::Event;
use crate::ledger::ActivityLedger;

/// Result of a single check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub decision: EscalationDecision,
    pub events: Vec<Event>,
}

/// Runs escalation checks against a ledger and a dispatcher.
pub struct InactivityMonitor<L, D> {
    ledger: Arc<L>,
    dispatcher: D,
}

impl<L: ActivityLedger, D: AlertDispatcher> InactivityMonitor<L, D> {
    pub fn new(ledger: Arc<L>, dispatcher: D) -> Self {
        Self { ledger, dispatcher }
    }

    /// Run one escalation check at `now`.
    ///
    /// # Errors
    /// Returns an error when the ledger cannot be read (defer to the next
    /// invocation; no side effect was attempted) or when the alert marker
    /// cannot be written after a dispatch attempt.
    pub fn run_check(&self, now: DateTime<Utc>) -> Result<CheckOutcome, CoreError> {
        let ledger = self.ledger.read()?;
        let decision = evaluate(&ledger, now);
        tracing::debug!(?decision, "escalation check");

        let mut events = Vec::new();
        match decision {
            EscalationDecision::SendWarning => {
                let elapsed_ms = (now - ledger.episode.last_active_at).num_milliseconds();
                let notice = WarningNotice::inactivity(elapsed_ms);
                match self.dispatcher.send_warning(&notice) {
                    Ok(()) => events.push(Event::WarningIssued { elapsed_ms, at: now }),
                    // Warnings repeat on the next tick anyway.
                    Err(err) => tracing::warn!(error = %err, "warning dispatch failed"),
                }
            }
            EscalationDecision::SendAlert => {
                match self
                    .dispatcher
                    .send_alert(&ledger.config.contact_address, &ledger.config.alert_message)
                {
                    Ok(()) => events.push(Event::AlertDispatched {
                        address: ledger.config.contact_address.clone(),
                        at: now,
                    }),
                    Err(err) => {
                        tracing::warn!(error = %err, "alert dispatch failed");
                        events.push(Event::AlertDispatchFailed {
                            reason: err.to_string(),
                            at: now,
                        });
                    }
                }
                // Marker write follows the attempt, success or not.
                self.ledger.record_alert_sent(now)?;
            }
            EscalationDecision::AlertSuppressed => {
                events.push(Event::AlertSuppressed { at: now });
                self.ledger.record_alert_sent(now)?;
            }
            EscalationDecision::Disarmed
            | EscalationDecision::Active
            | EscalationDecision::AlreadyAlerted => {}
        }

        Ok(CheckOutcome { decision, events })
    }
}
