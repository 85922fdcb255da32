use std::sync::Arc;

use chrono::Utc;
use vigil_core::{ActivityLedger, InactivityMonitor, LedgerDb};

/// One evaluation with side effects -- what the periodic driver runs on
/// every tick, exposed for cron-style setups.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(LedgerDb::open()?);
    let dispatcher = super::dispatcher_for(&db.read()?.config);
    let monitor = InactivityMonitor::new(db, dispatcher);

    let outcome = monitor.run_check(Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
