//! SQLite-backed ledger record.
//!
//! The ledger is a small key-value table holding the configuration and the
//! current episode's timestamps. A single mutex-guarded connection
//! serializes all operations; multi-key writes run inside a transaction so
//! a concurrent read never observes a torn record.
//!
//! Timestamps are stored as epoch milliseconds; `0` means "never".

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{ActivityLedger, ConfigPatch, EpisodeState, Ledger, WatchConfig};
use crate::error::{CoreError, StorageError};

const K_LAST_ACTIVE: &str = "last_active_at";
const K_LAST_ALERT: &str = "last_alert_sent_at";
const K_TIMEOUT_HOURS: &str = "timeout_hours";
const K_CONTACT_NAME: &str = "contact_name";
const K_CONTACT_ADDRESS: &str = "contact_address";
const K_ALERT_MESSAGE: &str = "alert_message";
const K_ALERTING_ENABLED: &str = "alerting_enabled";
const K_MONITORING_ENABLED: &str = "monitoring_enabled";
const K_WEBHOOK_URL: &str = "webhook_url";

/// Returns the data directory, `~/.config/vigil/` by default.
///
/// Set VIGIL_DATA_DIR to relocate it (tests and dev runs).
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var("VIGIL_DATA_DIR") {
        Ok(custom) => PathBuf::from(custom),
        Err(_) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("vigil"),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// The persisted ledger record.
pub struct LedgerDb {
    conn: Mutex<Connection>,
}

impl LedgerDb {
    /// Open the ledger at `~/.config/vigil/vigil.db`, creating the record
    /// with defaults on first run (`last_active_at` seeded to now).
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()?.join("vigil.db");
        Self::open_at(&path)
    }

    /// Open the ledger at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        db.seed(Utc::now())?;
        Ok(db)
    }

    /// Open an in-memory ledger (tests and ephemeral runs).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        db.seed(Utc::now())?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.lock()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS ledger (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );",
            )
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))
    }

    /// First-run initialization: write the complete default record.
    fn seed(&self, now: DateTime<Utc>) -> Result<(), StorageError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        if kv_get(&tx, K_LAST_ACTIVE)?.is_none() {
            let defaults = WatchConfig::default();
            kv_set(&tx, K_LAST_ACTIVE, &now.timestamp_millis().to_string())?;
            kv_set(&tx, K_LAST_ALERT, "0")?;
            kv_set(&tx, K_TIMEOUT_HOURS, &defaults.timeout_hours.to_string())?;
            kv_set(&tx, K_CONTACT_NAME, &defaults.contact_name)?;
            kv_set(&tx, K_CONTACT_ADDRESS, &defaults.contact_address)?;
            kv_set(&tx, K_ALERT_MESSAGE, &defaults.alert_message)?;
            kv_set(&tx, K_ALERTING_ENABLED, &defaults.alerting_enabled.to_string())?;
            kv_set(
                &tx,
                K_MONITORING_ENABLED,
                &defaults.monitoring_enabled.to_string(),
            )?;
            kv_set(&tx, K_WEBHOOK_URL, &defaults.webhook_url)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ActivityLedger for LedgerDb {
    fn read(&self) -> Result<Ledger, StorageError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let last_active_at = match kv_get(&tx, K_LAST_ACTIVE)?.and_then(|v| v.parse::<i64>().ok())
        {
            Some(ms) => from_epoch_ms(ms),
            // Absent key defaults to "now", same as a fresh record.
            None => Utc::now(),
        };
        let last_alert_sent_at = kv_get(&tx, K_LAST_ALERT)?
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|ms| *ms > 0)
            .map(from_epoch_ms);

        let defaults = WatchConfig::default();
        let config = WatchConfig {
            timeout_hours: kv_get(&tx, K_TIMEOUT_HOURS)?
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_hours),
            contact_name: kv_get(&tx, K_CONTACT_NAME)?.unwrap_or(defaults.contact_name),
            contact_address: kv_get(&tx, K_CONTACT_ADDRESS)?.unwrap_or(defaults.contact_address),
            alert_message: kv_get(&tx, K_ALERT_MESSAGE)?.unwrap_or(defaults.alert_message),
            alerting_enabled: kv_get(&tx, K_ALERTING_ENABLED)?
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.alerting_enabled),
            monitoring_enabled: kv_get(&tx, K_MONITORING_ENABLED)?
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.monitoring_enabled),
            webhook_url: kv_get(&tx, K_WEBHOOK_URL)?.unwrap_or(defaults.webhook_url),
        };

        tx.commit()?;
        Ok(Ledger {
            config,
            episode: EpisodeState {
                last_active_at,
                last_alert_sent_at,
            },
        })
    }

    fn record_activity(&self, now: DateTime<Utc>) -> Result<(), StorageError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        // Both fields move together; a stale alert marker must not
        // survive into the new episode.
        kv_set(&tx, K_LAST_ACTIVE, &now.timestamp_millis().to_string())?;
        kv_set(&tx, K_LAST_ALERT, "0")?;
        tx.commit()?;
        Ok(())
    }

    fn record_alert_sent(&self, now: DateTime<Utc>) -> Result<(), StorageError> {
        let conn = self.lock();
        kv_set(&conn, K_LAST_ALERT, &now.timestamp_millis().to_string())?;
        Ok(())
    }

    fn update_config(&self, patch: ConfigPatch) -> Result<WatchConfig, CoreError> {
        patch.validate()?;

        let mut conn = self.lock();
        let tx = conn.transaction().map_err(StorageError::from)?;
        let set = |key: &str, value: &str| kv_set(&tx, key, value);

        if let Some(hours) = patch.timeout_hours {
            set(K_TIMEOUT_HOURS, &hours.to_string()).map_err(StorageError::from)?;
        }
        if let Some(ref name) = patch.contact_name {
            set(K_CONTACT_NAME, name).map_err(StorageError::from)?;
        }
        if let Some(ref address) = patch.contact_address {
            set(K_CONTACT_ADDRESS, address).map_err(StorageError::from)?;
        }
        if let Some(ref message) = patch.alert_message {
            set(K_ALERT_MESSAGE, message).map_err(StorageError::from)?;
        }
        if let Some(enabled) = patch.alerting_enabled {
            set(K_ALERTING_ENABLED, &enabled.to_string()).map_err(StorageError::from)?;
        }
        if let Some(enabled) = patch.monitoring_enabled {
            set(K_MONITORING_ENABLED, &enabled.to_string()).map_err(StorageError::from)?;
        }
        if let Some(ref url) = patch.webhook_url {
            set(K_WEBHOOK_URL, url).map_err(StorageError::from)?;
        }
        tx.commit().map_err(StorageError::from)?;
        drop(conn);

        Ok(self.read()?.config)
    }
}

fn kv_get(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT value FROM ledger WHERE key = ?1")?;
    let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
    match result {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

fn kv_set(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO ledger (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

fn from_epoch_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::MIN_UTC)
}
