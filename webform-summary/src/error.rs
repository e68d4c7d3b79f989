//! Error types for mailing runs

use std::path::PathBuf;

use thiserror::Error;
use validator::ValidationErrors;

use crate::email::EmailError;
use crate::export::ExportError;
use crate::source::SourceError;

/// Result type for operations that can abort a mailing run
pub type SummaryResult<T> = Result<T, SummaryError>;

/// Errors that prevent a mailing run from starting or completing
///
/// Failures scoped to a single webform, recipient or file never surface here; they are
/// recorded as [`Outcome`](crate::mailer::Outcome)s on the run report instead.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Summary settings failed validation, nothing was exported or sent
    #[error("invalid summary settings: {0}")]
    InvalidSettings(#[from] ValidationErrors),

    /// Date range with its start after its end
    #[error("invalid date range: {start} is after {end}")]
    InvalidRange {
        /// Requested first day
        start: chrono::NaiveDate,
        /// Requested last day
        end: chrono::NaiveDate,
    },

    /// Export destination cannot be used
    #[error("temporary directory {path} is not usable: {source}")]
    TempDir {
        /// Configured destination
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Submission source failure
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Export failure
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Email failure
    #[error(transparent)]
    Email(#[from] EmailError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SummaryError {
    /// Create a configuration error from a string message
    #[must_use]
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }
}

impl From<figment::Error> for SummaryError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}
