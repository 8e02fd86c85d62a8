use std::time::Duration;
use thiserror::Error;

/// Why a single request could not be completed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("connection refused or host unreachable: {0}")]
    Connect(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection closed unexpectedly: {0}")]
    Closed(String),

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request worker panicked: {0}")]
    Panicked(String),
}

impl RequestError {
    /// Short stable label used as the key of the error breakdown.
    pub fn kind(&self) -> &'static str {
        match self {
            RequestError::Connect(_) => "CONNECT",
            RequestError::Timeout(_) => "TIMEOUT",
            RequestError::Closed(_) => "CLOSED",
            RequestError::InvalidUrl(_) => "INVALID_URL",
            RequestError::Transport(_) => "REQUEST_ERROR",
            RequestError::Panicked(_) => "PANICKED",
        }
    }
}

/// Result of one logical request unit. Created once by a worker, consumed once
/// by the report builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Response { status: u16, duration: Duration },
    Failed { error: RequestError, duration: Duration },
}

impl Outcome {
    pub fn response(status: u16, duration: Duration) -> Self {
        Outcome::Response { status, duration }
    }

    pub fn failed(error: RequestError, duration: Duration) -> Self {
        Outcome::Failed { error, duration }
    }

    /// HTTP status code, absent for failed requests.
    pub fn status(&self) -> Option<u16> {
        match self {
            Outcome::Response { status, .. } => Some(*status),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Outcome::Response { duration, .. } | Outcome::Failed { duration, .. } => *duration,
        }
    }

    pub fn error(&self) -> Option<&RequestError> {
        match self {
            Outcome::Failed { error, .. } => Some(error),
            Outcome::Response { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}
