//! The inactivity escalation engine.
//!
//! [`evaluate`] is the decision rule: a pure function of the ledger and
//! the current time. [`InactivityMonitor`] is the runner that turns a
//! decision into side effects and ledger writes.

mod escalation;
mod monitor;

pub use escalation::{
    evaluate, snapshot, subject_state, EscalationDecision, SubjectState, WARNING_LEAD_HOURS,
};
pub use monitor::{CheckOutcome, InactivityMonitor};
