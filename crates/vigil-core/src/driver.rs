//! The invocation driver.
//!
//! Two pieces:
//!
//! - [`JobRegistry`]: named recurring jobs with keep-existing semantics,
//!   so re-registration never creates duplicate concurrent schedules
//! - [`CheckDriver`]: a single sequential loop consuming interval ticks
//!   and activity signals; each signal records activity and triggers an
//!   immediate re-evaluation
//!
//! The loop tolerates missed or delayed ticks (device sleep): checks are
//! pure functions of absolute timestamps, so spacing never matters.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::dispatch::AlertDispatcher;
use crate::engine::InactivityMonitor;
use crate::ledger::ActivityLedger;
use crate::signal::{ActivitySignal, SignalCollector};

/// Name of the recurring inactivity check job.
pub const CHECK_JOB: &str = "inactivity-check";

/// Default evaluation period.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Smallest practical evaluation period; shorter requests are clamped.
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// What to do when a job name is already registered and still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingJobPolicy {
    /// Keep the running job; the new one is discarded.
    Keep,
    /// Abort the running job and start the new one.
    Replace,
}

/// Named recurring jobs.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `job` under `name`. Returns false if a live job with this
    /// name already exists and the policy says to keep it.
    pub fn register<F>(&self, name: &str, policy: ExistingJobPolicy, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut jobs = self.lock();
        if let Some(existing) = jobs.get(name) {
            if !existing.is_finished() {
                match policy {
                    ExistingJobPolicy::Keep => return false,
                    ExistingJobPolicy::Replace => existing.abort(),
                }
            }
        }
        jobs.insert(name.to_string(), tokio::spawn(job));
        true
    }

    /// Abort a job by name. Returns true if it existed.
    pub fn cancel(&self, name: &str) -> bool {
        match self.lock().remove(name) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.lock().get(name).is_some_and(|h| !h.is_finished())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sequential evaluation loop over ticks and activity signals.
pub struct CheckDriver<L, D> {
    monitor: Arc<InactivityMonitor<L, D>>,
    collector: SignalCollector<L>,
    signals: mpsc::Receiver<ActivitySignal>,
    period: Duration,
}

impl<L, D> CheckDriver<L, D>
where
    L: ActivityLedger + 'static,
    D: AlertDispatcher + 'static,
{
    /// Build a driver and the sender half of its signal channel.
    ///
    /// The loop ends when every sender has been dropped.
    pub fn new(
        monitor: Arc<InactivityMonitor<L, D>>,
        collector: SignalCollector<L>,
        period: Duration,
    ) -> (Self, mpsc::Sender<ActivitySignal>) {
        let (tx, rx) = mpsc::channel(32);
        let driver = Self {
            monitor,
            collector,
            signals: rx,
            period: period.max(MIN_CHECK_INTERVAL),
        };
        (driver, tx)
    }

    /// Run until the signal channel closes. The first tick fires
    /// immediately, so startup always evaluates once.
    pub async fn run(self) {
        let CheckDriver {
            monitor,
            collector,
            mut signals,
            period,
        } = self;

        let mut ticks = tokio::time::interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    run_check_once(&monitor).await;
                }
                signal = signals.recv() => match signal {
                    Some(source) => {
                        let c = collector.clone();
                        let recorded = tokio::task::spawn_blocking(move || {
                            c.record(source, Utc::now())
                        })
                        .await;
                        match recorded {
                            Ok(Ok(_)) => {}
                            Ok(Err(err)) => {
                                tracing::warn!(error = %err, "failed to record activity")
                            }
                            Err(err) => tracing::warn!(error = %err, "signal task panicked"),
                        }
                        // The signal re-arms the engine; evaluate right away.
                        run_check_once(&monitor).await;
                    }
                    None => break,
                }
            }
        }
    }
}

async fn run_check_once<L, D>(monitor: &Arc<InactivityMonitor<L, D>>)
where
    L: ActivityLedger + 'static,
    D: AlertDispatcher + 'static,
{
    let monitor = Arc::clone(monitor);
    let outcome = tokio::task::spawn_blocking(move || monitor.run_check(Utc::now())).await;
    match outcome {
        Ok(Ok(outcome)) => tracing::debug!(decision = ?outcome.decision, "check complete"),
        Ok(Err(err)) => tracing::warn!(error = %err, "check deferred"),
        Err(err) => tracing::warn!(error = %err, "check task panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::WarningNotice;
    use crate::error::DispatchError;
    use crate::ledger::LedgerDb;
    use chrono::Duration as ChronoDuration;

    struct NullDispatcher;

    impl AlertDispatcher for NullDispatcher {
        fn send_warning(&self, _notice: &WarningNotice) -> Result<(), DispatchError> {
            Ok(())
        }
        fn send_alert(&self, _address: &str, _message: &str) -> Result<(), DispatchError> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn registry_keeps_existing_job() {
        let registry = JobRegistry::new();

        assert!(registry.register(CHECK_JOB, ExistingJobPolicy::Keep, async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }));
        assert!(registry.is_running(CHECK_JOB));

        // Re-registration with Keep is a no-op.
        assert!(!registry.register(CHECK_JOB, ExistingJobPolicy::Keep, async {}));
        assert!(registry.is_running(CHECK_JOB));

        // Replace aborts and respawns.
        assert!(registry.register(CHECK_JOB, ExistingJobPolicy::Replace, async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }));
        assert!(registry.cancel(CHECK_JOB));
        assert!(!registry.is_running(CHECK_JOB));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn signal_records_activity_and_loop_ends_on_close() {
        let db = Arc::new(LedgerDb::open_memory().unwrap());
        let stale = Utc::now() - ChronoDuration::hours(3);
        db.record_activity(stale).unwrap();

        let monitor = Arc::new(InactivityMonitor::new(Arc::clone(&db), NullDispatcher));
        let collector = SignalCollector::new(Arc::clone(&db));
        let (driver, tx) = CheckDriver::new(monitor, collector, MIN_CHECK_INTERVAL);
        let handle = tokio::spawn(driver.run());

        tx.send(ActivitySignal::CheckIn).await.unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("driver loop should end when the channel closes")
            .unwrap();

        let episode = db.read().unwrap().episode;
        assert!(episode.last_active_at > stale);
    }
}
