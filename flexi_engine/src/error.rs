//! Error types for the collaborators around the balance engine.
//!
//! The engine itself is total and never fails.  Everything that touches
//! untrusted input (week keys arriving as strings, payout amounts,
//! environment settings) or the filesystem reports through [`Error`].

use thiserror::Error;

/// Errors raised while parsing, sanitising or persisting engine inputs.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid week key {0:?}: expected YYYY-MM-DD")]
    InvalidWeekKey(String),

    #[error("week key {0} is not a Monday")]
    NotAMonday(String),

    #[error("payout minutes must be a non-negative whole number, got {0}")]
    InvalidPayout(i64),

    #[error("date range spans {weeks} weeks, more than the {max} allowed")]
    RangeTooLong { weeks: i64, max: i64 },

    #[error("invalid setting {name}: {reason}")]
    Setting { name: &'static str, reason: String },

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` when the error was caused by bad caller input
    /// rather than by the environment.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidWeekKey(_)
                | Error::NotAMonday(_)
                | Error::InvalidPayout(_)
                | Error::RangeTooLong { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
