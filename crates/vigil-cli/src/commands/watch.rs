use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use vigil_core::driver::{CHECK_JOB, DEFAULT_CHECK_INTERVAL};
use vigil_core::{
    ActivityLedger, CheckDriver, ExistingJobPolicy, InactivityMonitor, JobRegistry, LedgerDb,
    SignalCollector,
};

/// Run the monitoring daemon until interrupted.
///
/// Registers the single named check job; a second registration while one
/// is live keeps the existing schedule.
pub fn run(interval_mins: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let period = interval_mins
        .map(|mins| Duration::from_secs(mins * 60))
        .unwrap_or(DEFAULT_CHECK_INTERVAL);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let db = Arc::new(LedgerDb::open()?);
        let dispatcher = super::dispatcher_for(&db.read()?.config);
        let monitor = Arc::new(InactivityMonitor::new(Arc::clone(&db), dispatcher));
        let collector = SignalCollector::new(Arc::clone(&db));

        let (driver, signal_tx) = CheckDriver::new(monitor, collector, period);

        let registry = JobRegistry::new();
        registry.register(CHECK_JOB, ExistingJobPolicy::Keep, driver.run());

        tokio::signal::ctrl_c().await?;
        // Dropping the sender closes the loop cleanly.
        drop(signal_tx);
        registry.cancel(CHECK_JOB);
        Ok(())
    })
}
