use std::sync::Arc;

use chrono::Utc;
use clap::ValueEnum;
use vigil_core::{ActivitySignal, LedgerDb, SignalCollector};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SignalSource {
    /// Device unlocked
    Unlock,
    /// Screen turned on
    ScreenOn,
    /// Device finished booting
    Boot,
}

impl From<SignalSource> for ActivitySignal {
    fn from(source: SignalSource) -> Self {
        match source {
            SignalSource::Unlock => ActivitySignal::DeviceUnlock,
            SignalSource::ScreenOn => ActivitySignal::ScreenOn,
            SignalSource::Boot => ActivitySignal::BootCompleted,
        }
    }
}

pub fn run(source: SignalSource) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(LedgerDb::open()?);
    let collector = SignalCollector::new(db);

    let event = collector.record(source.into(), Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}
