//! Failure reporting for capture sessions.

use crate::capture::CaptureError;
use crate::clients::RemoteError;
use crate::model::SessionState;
use std::fmt::Display;
use thiserror::Error;

/// Why a session ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The camera could not be opened or produced no frame.
    CameraUnavailable,
    /// The photo could not be persisted or read back.
    WriteFailed,
    /// A remote service could not be reached.
    ServiceUnreachable,
    /// A remote service rejected the request or returned nothing usable.
    ServiceError,
    /// A remote service did not answer in time.
    Timeout,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::CameraUnavailable => "camera_unavailable",
            FailureKind::WriteFailed => "write_failed",
            FailureKind::ServiceUnreachable => "service_unreachable",
            FailureKind::ServiceError => "service_error",
            FailureKind::Timeout => "timeout",
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&CaptureError> for FailureKind {
    fn from(error: &CaptureError) -> Self {
        match error {
            CaptureError::CameraUnavailable(_) => FailureKind::CameraUnavailable,
            CaptureError::WriteFailed(_) => FailureKind::WriteFailed,
        }
    }
}

impl From<&RemoteError> for FailureKind {
    fn from(error: &RemoteError) -> Self {
        match error {
            RemoteError::Unreachable(_) => FailureKind::ServiceUnreachable,
            RemoteError::Service(_) => FailureKind::ServiceError,
            RemoteError::Timeout(_) => FailureKind::Timeout,
            RemoteError::Artifact(_) => FailureKind::WriteFailed,
        }
    }
}

/// A step failure, recorded on the session and in the logs.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind} while {step}: {message}")]
pub struct SessionFailure {
    pub kind: FailureKind,
    pub step: SessionState,
    pub message: String,
}

impl SessionFailure {
    pub fn new(kind: FailureKind, step: SessionState, message: impl Into<String>) -> Self {
        Self {
            kind,
            step,
            message: message.into(),
        }
    }

    pub fn remote(step: SessionState, error: &RemoteError) -> Self {
        Self::new(error.into(), step, error.to_string())
    }
}

impl From<CaptureError> for SessionFailure {
    fn from(error: CaptureError) -> Self {
        Self::new((&error).into(), SessionState::Capturing, error.to_string())
    }
}
