use clap::Subcommand;
use vigil_core::{ActivityLedger, ConfigPatch, LedgerDb};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "timeout_hours", "contact_address")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = LedgerDb::open()?;

    match action {
        ConfigAction::Get { key } => {
            let config = db.read()?.config;
            let json = serde_json::to_value(&config)?;
            match json.get(key.as_str()) {
                Some(serde_json::Value::String(s)) => println!("{s}"),
                Some(other) => println!("{other}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let patch = ConfigPatch::from_key_value(&key, &value)?;
            db.update_config(patch)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = db.read()?.config;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
