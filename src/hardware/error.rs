//! Error types for the hardware adapters.

use thiserror::Error;

/// Errors reported by device adapters.
#[derive(Debug, Error)]
pub enum HardwareError {
    /// The device could not be opened or is not present.
    #[error("Device unavailable: {0}")]
    Unavailable(String),

    /// An external helper command failed.
    #[error("Command `{command}` failed: {message}")]
    Command { command: String, message: String },

    /// Reading or writing the device node failed.
    #[error("Device I/O error: {0}")]
    Io(#[from] std::io::Error),
}
