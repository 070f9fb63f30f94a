//! Signal monitoring for GvBot.
//!
//! Three related pieces: the CSV signal dashboard (fetch, parse, derive a
//! STABLE/DRIFT/RECOVERY status), the GV sentinel (a normalized constraint
//! strain score over named risk signals), and the runtime guard (a damped
//! accumulator over agent-loop telemetry with band thresholds).

pub mod error;
pub mod guard;
pub mod row;
pub mod sentinel;
pub mod source;
pub mod status;

pub use error::SignalError;
pub use guard::{GuardAction, GuardDecision, RuntimeGuard, RuntimeSignals};
pub use row::SignalRow;
pub use sentinel::{GvRecord, RiskBand, Sentinel};
pub use source::{SignalFetcher, SignalReport};
pub use status::{derive_status, SignalReading, Status};
