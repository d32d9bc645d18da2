//! Error types for the Jobdeck core

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while interpreting job data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A cron expression did not split into exactly five fields
    #[error("Invalid cron expression '{expression}': expected 5 fields, found {found}")]
    InvalidCron {
        /// The rejected expression
        expression: String,
        /// Number of whitespace-separated fields found
        found: usize,
    },

    /// A value could not be converted to an absolute instant
    #[error("Invalid instant: {0}")]
    InvalidInstant(String),
}
