//! Failure taxonomy for location and schedule resolution.
//!
//! None of these are fatal. The scheduler answers every one of them by keeping
//! its last known good value (cached schedule, default schedule, or previously
//! detected coordinates).

use thiserror::Error;

/// Coarse classification of a [`ResolveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NetworkFailure,
    ParseFailure,
    DataInvalid,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolveError {
    /// Timeout, connection error, or non-success HTTP status.
    #[error("network failure: {0}")]
    Network(String),

    /// Malformed JSON or an unparseable time string.
    #[error("parse failure: {0}")]
    Parse(String),

    /// Well-formed but unusable data: zero coordinates, a non-OK service
    /// status, an unknown time zone, or an out-of-order schedule.
    #[error("invalid data: {0}")]
    DataInvalid(String),
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::NetworkFailure,
            Self::Parse(_) => ErrorKind::ParseFailure,
            Self::DataInvalid(_) => ErrorKind::DataInvalid,
        }
    }
}

impl From<serde_json::Error> for ResolveError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error.to_string())
    }
}
