//! Activity signal normalization.
//!
//! Heterogeneous "the subject is alive" events all collapse into one
//! ledger update. The engine has no notion of signal provenance; the
//! source survives only in the emitted [`Event`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::events::Event;
use crate::ledger::ActivityLedger;

/// Where an activity signal came from. All sources are equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySignal {
    /// Explicit user check-in action.
    CheckIn,
    /// Device unlocked.
    DeviceUnlock,
    /// Screen turned on.
    ScreenOn,
    /// Device finished booting.
    BootCompleted,
}

impl std::fmt::Display for ActivitySignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivitySignal::CheckIn => write!(f, "check-in"),
            ActivitySignal::DeviceUnlock => write!(f, "device-unlock"),
            ActivitySignal::ScreenOn => write!(f, "screen-on"),
            ActivitySignal::BootCompleted => write!(f, "boot-completed"),
        }
    }
}

/// Normalizes signals into `record_activity` calls.
///
/// Safe under rapid repeated signals (screen toggling): recording
/// activity is idempotent, each call just restarts the episode clock.
pub struct SignalCollector<L> {
    ledger: Arc<L>,
}

impl<L> Clone for SignalCollector<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
        }
    }
}

impl<L: ActivityLedger> SignalCollector<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// Record one activity signal, starting a new episode.
    pub fn record(
        &self,
        source: ActivitySignal,
        now: DateTime<Utc>,
    ) -> Result<Event, StorageError> {
        self.ledger.record_activity(now)?;
        tracing::debug!(%source, "activity recorded");
        Ok(Event::ActivityRecorded { source, at: now })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerDb;
    use chrono::Duration;

    #[test]
    fn record_starts_new_episode() {
        let db = Arc::new(LedgerDb::open_memory().unwrap());
        let collector = SignalCollector::new(Arc::clone(&db));
        let now = Utc::now();

        db.record_alert_sent(now).unwrap();
        let event = collector.record(ActivitySignal::DeviceUnlock, now).unwrap();
        match event {
            Event::ActivityRecorded { source, at } => {
                assert_eq!(source, ActivitySignal::DeviceUnlock);
                assert_eq!(at, now);
            }
            other => panic!("expected ActivityRecorded, got {other:?}"),
        }

        let episode = db.read().unwrap().episode;
        assert!(episode.last_alert_sent_at.is_none());
    }

    #[test]
    fn rapid_repeated_signals_are_safe() {
        let db = Arc::new(LedgerDb::open_memory().unwrap());
        let collector = SignalCollector::new(Arc::clone(&db));
        let base = Utc::now();

        for i in 0..5i64 {
            collector
                .record(ActivitySignal::ScreenOn, base + Duration::milliseconds(i))
                .unwrap();
        }
        let episode = db.read().unwrap().episode;
        assert_eq!(
            episode.last_active_at.timestamp_millis(),
            (base + Duration::milliseconds(4)).timestamp_millis()
        );
        assert!(episode.last_alert_sent_at.is_none());
    }
}
