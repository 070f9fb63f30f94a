//! Signal-side error type.

use gvbot_core::GvBotError;

/// Failures while loading or interpreting signal data. All are recoverable:
/// the dashboard reports them instead of crashing.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// One candidate source could not be fetched or read.
    #[error("signal source {source_name} unavailable: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    /// A fetched document could not be parsed as CSV.
    #[error("signal data unparsable: {0}")]
    Parse(String),

    /// A parsed document carried a header but no data rows.
    #[error("signal source has no data rows")]
    NoRows,

    /// Every candidate in the ordered source list failed.
    #[error("all {0} signal sources failed")]
    AllSourcesFailed(usize),
}

impl From<SignalError> for GvBotError {
    fn from(err: SignalError) -> Self {
        GvBotError::Signal(err.to_string())
    }
}
