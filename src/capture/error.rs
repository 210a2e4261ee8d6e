//! Error types for the capture step.

use thiserror::Error;

/// Errors that can occur while taking and persisting a photo.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CaptureError {
    /// The camera could not be opened or produced no frame.
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    /// The frame could not be written to the photo path.
    #[error("Photo write failed: {0}")]
    WriteFailed(String),
}
