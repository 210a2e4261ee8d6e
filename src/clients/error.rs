//! Error types for the remote service clients.

use thiserror::Error;

/// Errors returned by the captioning and generation clients.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RemoteError {
    /// The service could not be reached (DNS, connect, reset).
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    /// The service answered with an error or an unusable result.
    #[error("Service error: {0}")]
    Service(String),

    /// No answer within the configured timeout.
    #[error("Service timed out: {0}")]
    Timeout(String),

    /// The local artifact to send could not be read.
    #[error("Artifact unreadable: {0}")]
    Artifact(String),
}

impl RemoteError {
    /// Maps a transport error onto the remote error kinds.
    pub fn classify(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            RemoteError::Timeout(error.to_string())
        } else if error.is_decode() || error.is_status() {
            RemoteError::Service(error.to_string())
        } else {
            RemoteError::Unreachable(error.to_string())
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Unreachable(_) | RemoteError::Timeout(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        RemoteError::classify(error)
    }
}
