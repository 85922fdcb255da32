use std::sync::Arc;

use chrono::Utc;
use vigil_core::quotes;
use vigil_core::{ActivitySignal, LedgerDb, SignalCollector};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(LedgerDb::open()?);
    let collector = SignalCollector::new(db);

    let event = collector.record(ActivitySignal::CheckIn, Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&event)?);
    eprintln!("{}", quotes::random_quote().text);
    Ok(())
}
