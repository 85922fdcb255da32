//! # Vigil Core Library
//!
//! This library provides the core business logic for Vigil, a dead man's
//! switch: it tracks whether a person has shown any sign of activity within
//! a configurable window and, if not, escalates through a warning stage and
//! then a terminal alert that notifies a trusted contact. It implements a
//! CLI-first philosophy where all operations are available via a standalone
//! CLI binary; any GUI layer is a thin shell over the same core library.
//!
//! ## Architecture
//!
//! - **Escalation Engine**: a pure, idempotent function of absolute
//!   timestamps; the caller invokes it at arbitrary intervals and the
//!   decision never depends on tick spacing
//! - **Activity Ledger**: SQLite-backed single record holding configuration
//!   and the current episode's timestamps
//! - **Signal Collector**: normalizes heterogeneous activity signals
//!   (check-in, unlock, screen-on, boot) into one ledger update
//! - **Dispatch**: webhook or console delivery of warnings and alerts
//! - **Driver**: periodic evaluation loop with a named-job registry
//!
//! ## Key Components
//!
//! - [`evaluate`]: the escalation decision rule
//! - [`InactivityMonitor`]: one check = read ledger, decide, dispatch, mark
//! - [`LedgerDb`]: the persisted ledger record
//! - [`CheckDriver`]: the periodic/event-driven evaluation loop

pub mod ledger;
pub mod engine;
pub mod signal;
pub mod dispatch;
pub mod driver;
pub mod events;
pub mod quotes;
pub mod error;

pub use ledger::{ActivityLedger, ConfigPatch, EpisodeState, Ledger, LedgerDb, WatchConfig};
pub use engine::{
    evaluate, snapshot, subject_state, CheckOutcome, EscalationDecision, InactivityMonitor,
    SubjectState,
};
pub use signal::{ActivitySignal, SignalCollector};
pub use dispatch::{AlertDispatcher, ConsoleDispatcher, WarningNotice, WebhookDispatcher};
pub use driver::{CheckDriver, ExistingJobPolicy, JobRegistry};
pub use events::Event;
pub use error::{ConfigError, CoreError, DispatchError, StorageError};
