//! The activity ledger -- the single source of truth.
//!
//! Configuration and episode state form one logical record. Every
//! component reads and writes it through the [`ActivityLedger`] contract,
//! never through private copies; the storage implementation serializes
//! concurrent operations internally.

mod store;

pub use store::{data_dir, LedgerDb};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, CoreError, StorageError};

/// User-facing configuration. Read-mostly; mutated only by settings
/// actions via [`ConfigPatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Inactivity window in hours. Values below 1 are rejected.
    #[serde(default = "default_timeout_hours")]
    pub timeout_hours: i64,
    /// Display name of the trusted contact.
    #[serde(default)]
    pub contact_name: String,
    /// Destination for the alert (opaque string, e.g. a phone number).
    #[serde(default)]
    pub contact_address: String,
    /// Text sent on alert.
    #[serde(default = "default_alert_message")]
    pub alert_message: String,
    /// Gate on the outbound alert dispatch step.
    #[serde(default)]
    pub alerting_enabled: bool,
    /// Gate on whether the engine runs at all.
    #[serde(default = "default_true")]
    pub monitoring_enabled: bool,
    /// Delivery endpoint for warnings and alerts. Empty means console.
    #[serde(default)]
    pub webhook_url: String,
}

fn default_timeout_hours() -> i64 {
    24
}

fn default_alert_message() -> String {
    "I haven't used my phone in a long while. Please give me a call when you can.".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            timeout_hours: default_timeout_hours(),
            contact_name: String::new(),
            contact_address: String::new(),
            alert_message: default_alert_message(),
            alerting_enabled: false,
            monitoring_enabled: true,
            webhook_url: String::new(),
        }
    }
}

impl WatchConfig {
    /// The full inactivity window as a duration.
    pub fn timeout_window(&self) -> Duration {
        Duration::hours(self.timeout_hours)
    }
}

/// Current episode state. Mutated only by the engine and the signal
/// collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeState {
    /// Most recent confirmed activity signal. Monotonically non-decreasing
    /// except on the explicit reset performed by `record_activity`.
    pub last_active_at: DateTime<Utc>,
    /// Most recent alert dispatch, or `None` for never. Compared only
    /// against `last_active_at` to decide whether this episode has already
    /// alerted.
    pub last_alert_sent_at: Option<DateTime<Utc>>,
}

impl EpisodeState {
    /// Whether an alert has been attempted since this episode began.
    pub fn alert_sent_this_episode(&self) -> bool {
        self.last_alert_sent_at
            .map_or(false, |sent| sent >= self.last_active_at)
    }
}

/// A consistent snapshot of the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub config: WatchConfig,
    pub episode: EpisodeState,
}

/// Partial configuration change. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigPatch {
    pub timeout_hours: Option<i64>,
    pub contact_name: Option<String>,
    pub contact_address: Option<String>,
    pub alert_message: Option<String>,
    pub alerting_enabled: Option<bool>,
    pub monitoring_enabled: Option<bool>,
    pub webhook_url: Option<String>,
}

impl ConfigPatch {
    /// Validate the patch against the configuration rules. Called before
    /// any write; an invalid patch leaves the stored record untouched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(hours) = self.timeout_hours {
            if hours < 1 {
                return Err(ConfigError::InvalidValue {
                    key: "timeout_hours".into(),
                    message: format!("must be at least 1 hour, got {hours}"),
                });
            }
        }
        if let Some(ref url) = self.webhook_url {
            if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    key: "webhook_url".into(),
                    message: "must start with http:// or https://".into(),
                });
            }
        }
        Ok(())
    }

    /// Build a single-field patch from a CLI-style key/value pair.
    pub fn from_key_value(key: &str, value: &str) -> Result<Self, ConfigError> {
        let mut patch = Self::default();
        match key {
            "timeout_hours" => {
                patch.timeout_hours = Some(value.parse().map_err(|_| {
                    ConfigError::ParseFailed(format!("'{value}' is not a whole number of hours"))
                })?);
            }
            "contact_name" => patch.contact_name = Some(value.to_string()),
            "contact_address" => patch.contact_address = Some(value.to_string()),
            "alert_message" => patch.alert_message = Some(value.to_string()),
            "alerting_enabled" => {
                patch.alerting_enabled = Some(parse_bool(value)?);
            }
            "monitoring_enabled" => {
                patch.monitoring_enabled = Some(parse_bool(value)?);
            }
            "webhook_url" => patch.webhook_url = Some(value.to_string()),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        patch.validate()?;
        Ok(patch)
    }

}

fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::ParseFailed(format!("'{value}' is not true/false")))
}

/// The ledger contract. Each operation is atomic with respect to
/// concurrent callers; no interleaving produces a torn
/// `(last_active_at, last_alert_sent_at)` pair.
pub trait ActivityLedger: Send + Sync {
    /// Consistent snapshot of configuration and episode state.
    fn read(&self) -> Result<Ledger, StorageError>;

    /// Start a new episode: `last_active_at = now`,
    /// `last_alert_sent_at = never`, in one indivisible write.
    fn record_activity(&self, now: DateTime<Utc>) -> Result<(), StorageError>;

    /// Mark the alert for the current episode as attempted. Does not
    /// touch `last_active_at`.
    fn record_alert_sent(&self, now: DateTime<Utc>) -> Result<(), StorageError>;

    /// Merge a validated partial configuration change. Does not touch
    /// episode state. Returns the merged configuration.
    fn update_config(&self, patch: ConfigPatch) -> Result<WatchConfig, CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = WatchConfig::default();
        assert_eq!(cfg.timeout_hours, 24);
        assert!(cfg.contact_address.is_empty());
        assert!(!cfg.alerting_enabled);
        assert!(cfg.monitoring_enabled);
        assert!(!cfg.alert_message.is_empty());
    }

    #[test]
    fn patch_rejects_sub_hour_timeout() {
        let patch = ConfigPatch {
            timeout_hours: Some(0),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = ConfigPatch {
            timeout_hours: Some(-3),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn patch_accepts_one_hour_timeout() {
        let patch = ConfigPatch {
            timeout_hours: Some(1),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn patch_rejects_non_http_webhook() {
        let patch = ConfigPatch::from_key_value("webhook_url", "ftp://example.com");
        assert!(patch.is_err());
        assert!(ConfigPatch::from_key_value("webhook_url", "https://example.com/hook").is_ok());
    }

    #[test]
    fn patch_from_key_value_parses_types() {
        let patch = ConfigPatch::from_key_value("timeout_hours", "48").unwrap();
        assert_eq!(patch.timeout_hours, Some(48));

        let patch = ConfigPatch::from_key_value("alerting_enabled", "true").unwrap();
        assert_eq!(patch.alerting_enabled, Some(true));

        assert!(ConfigPatch::from_key_value("timeout_hours", "soon").is_err());
        assert!(ConfigPatch::from_key_value("no_such_key", "1").is_err());
    }

    #[test]
    fn alert_sent_this_episode_compares_against_activity() {
        let active = Utc::now();
        let episode = EpisodeState {
            last_active_at: active,
            last_alert_sent_at: None,
        };
        assert!(!episode.alert_sent_this_episode());

        let episode = EpisodeState {
            last_active_at: active,
            last_alert_sent_at: Some(active - Duration::hours(1)),
        };
        assert!(!episode.alert_sent_this_episode());

        // Equal timestamps count as already alerted.
        let episode = EpisodeState {
            last_active_at: active,
            last_alert_sent_at: Some(active),
        };
        assert!(episode.alert_sent_this_episode());
    }
}
