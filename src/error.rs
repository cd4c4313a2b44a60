//! Error types for the probe.
//!
//! Query errors form a closed set. `QueryError::Timeout` ends a round; every
//! other variant is counted as a transient failure and the poll loop moves on.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Why a single query attempt did not yield a usable body.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The attempt exceeded its own timeout. Terminal for the round.
    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    /// Connect, reset, or any other transport-level failure.
    #[error("query transport error: {0}")]
    Connection(#[source] reqwest::Error),

    /// Headers arrived but the body could not be read.
    #[error("failed to read query body: {0}")]
    Body(#[source] reqwest::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl QueryError {
    /// Only timeouts stop the poll loop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Connection(err)
        }
    }

    pub(crate) fn from_body(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Body(err)
        }
    }
}

/// A line of an `ascii` query response that does not match
/// `<series> <timestamp> <value> [tags...]\n`. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: expected series `{series}`")]
    UnexpectedSeries { line: usize, series: String },

    #[error("line {line}: missing line terminator")]
    Unterminated { line: usize },

    #[error("line {line}: missing timestamp field")]
    MissingTimestamp { line: usize },

    #[error("line {line}: invalid timestamp `{token}`")]
    InvalidTimestamp { line: usize, token: String },
}

/// Reasons a write is rejected. The writer collapses all of them to `false`.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("write timed out after {0:?}")]
    Timeout(Duration),

    #[error("write transport error: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("write rejected with HTTP {0}")]
    Rejected(u16),
}

impl WriteError {
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Connection(err)
        }
    }
}

/// Startup errors. Fatal: the binary prints them and exits.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("cannot build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
