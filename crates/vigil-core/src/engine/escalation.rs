//! The escalation decision rule.
//!
//! A pure function of `(ledger, now)` -- no clock reads, no storage, no
//! side effects. The caller may evaluate it at arbitrary, possibly
//! irregular, intervals; correctness depends only on wall-clock
//! comparisons, never on tick spacing.
//!
//! ## Stages
//!
//! ```text
//! Active --(timeout - 1h)--> Warning --(timeout)--> Alert
//! ```
//!
//! The warning lead time is a fixed constant. A timeout window of one
//! hour or less leaves no warning stage at all; the subject moves
//! straight from Active to the alert rule at the timeout boundary.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::ledger::Ledger;

/// Fixed lead time of the warning stage before the alert threshold.
pub const WARNING_LEAD_HOURS: i64 = 1;

/// What the engine decided a single evaluation must do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationDecision {
    /// Monitoring is switched off; nothing fires regardless of elapsed
    /// time.
    Disarmed,
    /// Recent activity; nothing to do.
    Active,
    /// Inside the warning window; (re-)issue the warning notice.
    SendWarning,
    /// Timed out with no alert sent this episode; dispatch the alert.
    SendAlert,
    /// Timed out, but alerting is disabled by configuration. Still
    /// consumes this episode's single alert attempt.
    AlertSuppressed,
    /// Timed out and this episode's alert already went out.
    AlreadyAlerted,
}

/// Derived subject state for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectState {
    Disarmed,
    Active,
    Warning,
    AlertPending,
    AlertSent,
}

/// Decide what a single evaluation must do, first match wins:
///
/// 1. monitoring disabled: [`EscalationDecision::Disarmed`]
/// 2. elapsed at or past the timeout: alert stage, deduplicated per
///    episode by comparing `last_alert_sent_at` against `last_active_at`
/// 3. elapsed inside the warning window: [`EscalationDecision::SendWarning`]
/// 4. otherwise [`EscalationDecision::Active`]; negative elapsed (clock
///    regression) lands here
pub fn evaluate(ledger: &Ledger, now: DateTime<Utc>) -> EscalationDecision {
    if !ledger.config.monitoring_enabled {
        return EscalationDecision::Disarmed;
    }

    let elapsed = now - ledger.episode.last_active_at;
    let alert_after = ledger.config.timeout_window();
    let warn_after = alert_after - Duration::hours(WARNING_LEAD_HOURS);

    if elapsed >= alert_after {
        if ledger.episode.alert_sent_this_episode() {
            EscalationDecision::AlreadyAlerted
        } else if ledger.config.alerting_enabled {
            EscalationDecision::SendAlert
        } else {
            EscalationDecision::AlertSuppressed
        }
    } else if warn_after > Duration::zero() && elapsed >= warn_after {
        EscalationDecision::SendWarning
    } else {
        EscalationDecision::Active
    }
}

/// The subject state implied by the same inputs.
pub fn subject_state(ledger: &Ledger, now: DateTime<Utc>) -> SubjectState {
    match evaluate(ledger, now) {
        EscalationDecision::Disarmed => SubjectState::Disarmed,
        EscalationDecision::Active => SubjectState::Active,
        EscalationDecision::SendWarning => SubjectState::Warning,
        EscalationDecision::SendAlert | EscalationDecision::AlertSuppressed => {
            SubjectState::AlertPending
        }
        EscalationDecision::AlreadyAlerted => SubjectState::AlertSent,
    }
}

/// Build a full state snapshot event.
pub fn snapshot(ledger: &Ledger, now: DateTime<Utc>) -> Event {
    Event::StateSnapshot {
        state: subject_state(ledger, now),
        elapsed_ms: (now - ledger.episode.last_active_at).num_milliseconds(),
        timeout_hours: ledger.config.timeout_hours,
        last_active_at: ledger.episode.last_active_at,
        last_alert_sent_at: ledger.episode.last_alert_sent_at,
        at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{EpisodeState, WatchConfig};

    fn ledger(timeout_hours: i64, inactive: Duration, now: DateTime<Utc>) -> Ledger {
        Ledger {
            config: WatchConfig {
                timeout_hours,
                alerting_enabled: true,
                ..Default::default()
            },
            episode: EpisodeState {
                last_active_at: now - inactive,
                last_alert_sent_at: None,
            },
        }
    }

    #[test]
    fn recent_activity_is_active() {
        let now = Utc::now();
        let l = ledger(24, Duration::hours(5), now);
        assert_eq!(evaluate(&l, now), EscalationDecision::Active);
    }

    #[test]
    fn warning_fires_one_hour_before_timeout() {
        // 23h inactive on a 24h window sits exactly on the warning
        // threshold.
        let now = Utc::now();
        let l = ledger(24, Duration::hours(23), now);
        assert_eq!(evaluate(&l, now), EscalationDecision::SendWarning);

        let l = ledger(24, Duration::hours(23) + Duration::minutes(30), now);
        assert_eq!(evaluate(&l, now), EscalationDecision::SendWarning);
    }

    #[test]
    fn just_below_warning_threshold_is_active() {
        let now = Utc::now();
        let l = ledger(24, Duration::hours(23) - Duration::seconds(1), now);
        assert_eq!(evaluate(&l, now), EscalationDecision::Active);
    }

    #[test]
    fn alert_fires_at_timeout() {
        let now = Utc::now();
        let l = ledger(24, Duration::hours(25), now);
        assert_eq!(evaluate(&l, now), EscalationDecision::SendAlert);

        // Exactly at the boundary too.
        let l = ledger(24, Duration::hours(24), now);
        assert_eq!(evaluate(&l, now), EscalationDecision::SendAlert);
    }

    #[test]
    fn alert_suppressed_when_disabled() {
        let now = Utc::now();
        let mut l = ledger(24, Duration::hours(25), now);
        l.config.alerting_enabled = false;
        assert_eq!(evaluate(&l, now), EscalationDecision::AlertSuppressed);
    }

    #[test]
    fn alert_dedups_within_episode() {
        let now = Utc::now();
        let mut l = ledger(24, Duration::hours(25), now);
        l.episode.last_alert_sent_at = Some(now - Duration::minutes(30));
        assert_eq!(evaluate(&l, now), EscalationDecision::AlreadyAlerted);

        // A marker older than the episode start does not count.
        l.episode.last_alert_sent_at = Some(now - Duration::hours(26));
        assert_eq!(evaluate(&l, now), EscalationDecision::SendAlert);
    }

    #[test]
    fn disarmed_wins_over_everything() {
        let now = Utc::now();
        let mut l = ledger(24, Duration::hours(100), now);
        l.config.monitoring_enabled = false;
        assert_eq!(evaluate(&l, now), EscalationDecision::Disarmed);
    }

    #[test]
    fn one_hour_timeout_has_no_warning_stage() {
        let now = Utc::now();
        let l = ledger(1, Duration::minutes(30), now);
        assert_eq!(evaluate(&l, now), EscalationDecision::Active);

        let l = ledger(1, Duration::hours(1), now);
        assert_eq!(evaluate(&l, now), EscalationDecision::SendAlert);
    }

    #[test]
    fn clock_regression_is_active() {
        // last_active_at in the future: elapsed is negative.
        let now = Utc::now();
        let l = ledger(24, Duration::hours(-2), now);
        assert_eq!(evaluate(&l, now), EscalationDecision::Active);
    }

    #[test]
    fn subject_state_matches_decision() {
        let now = Utc::now();
        assert_eq!(
            subject_state(&ledger(24, Duration::hours(5), now), now),
            SubjectState::Active
        );
        assert_eq!(
            subject_state(&ledger(24, Duration::hours(23), now), now),
            SubjectState::Warning
        );
        assert_eq!(
            subject_state(&ledger(24, Duration::hours(25), now), now),
            SubjectState::AlertPending
        );

        let mut alerted = ledger(24, Duration::hours(25), now);
        alerted.episode.last_alert_sent_at = Some(now);
        assert_eq!(subject_state(&alerted, now), SubjectState::AlertSent);
    }

    #[test]
    fn snapshot_reports_elapsed() {
        let now = Utc::now();
        let l = ledger(24, Duration::hours(2), now);
        match snapshot(&l, now) {
            Event::StateSnapshot {
                state, elapsed_ms, ..
            } => {
                assert_eq!(state, SubjectState::Active);
                assert_eq!(elapsed_ms, 2 * 60 * 60 * 1000);
            }
            other => panic!("expected StateSnapshot, got {other:?}"),
        }
    }
}
