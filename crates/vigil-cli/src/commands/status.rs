use chrono::Utc;
use vigil_core::quotes;
use vigil_core::{snapshot, ActivityLedger, LedgerDb};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db = LedgerDb::open()?;
    let ledger = db.read()?;
    let now = Utc::now();

    println!("{}", serde_json::to_string_pretty(&snapshot(&ledger, now))?);
    eprintln!(
        "{} hours into the year. {}",
        quotes::hours_alive_this_year(now),
        quotes::random_quote().text
    );
    Ok(())
}
