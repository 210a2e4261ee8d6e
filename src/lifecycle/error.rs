//! Error types for bringing the appliance up.

use crate::clients::RemoteError;
use crate::config::ConfigError;
use crate::hardware::HardwareError;
use thiserror::Error;

/// Errors that can occur while building the appliance from configuration.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The configuration could not be loaded or is incomplete.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A device could not be opened.
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    /// A service client could not be constructed.
    #[error("Service client error: {0}")]
    Remote(#[from] RemoteError),
}
