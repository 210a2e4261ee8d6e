//! # Configuration
//!
//! One TOML file, every section optional. Missing keys fall back to the
//! defaults below, which match the stock hardware build. Secrets usually
//! come from the environment rather than the file; see [`loader`].
//!
//! ```toml
//! [gpio]
//! base = 512
//!
//! [session]
//! busy_led = "solid"
//! remote_attempts = 2
//! ```

pub mod loader;

pub use loader::*;

use crate::clients::{BLIP2_VERSION, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::receipt::{
    DEFAULT_ARCHIVE_LABEL, DEFAULT_ARCHIVE_URL, DEFAULT_ATTRIBUTION, DEFAULT_WRAP_WIDTH,
};
use crate::session::{LedPattern, RetryPolicy};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or checking configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A value is out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A required secret is not set in the file or the environment.
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub camera: CameraConfig,
    pub printer: PrinterConfig,
    pub gpio: GpioConfig,
    pub captioning: CaptioningConfig,
    pub generation: GenerationConfig,
    pub session: SessionConfig,
    pub receipt: ReceiptConfig,
    pub power: PowerConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub device_index: u32,
    /// The single photo file, overwritten on every capture.
    pub photo_path: PathBuf,
    /// Capture command; `{index}` is replaced with `device_index`.
    pub command: Vec<String>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            photo_path: PathBuf::from("/home/pi/poetry-camera/image.jpg"),
            command: [
                "rpicam-still",
                "--camera",
                "{index}",
                "--nopreview",
                "--immediate",
                "-o",
                "-",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrinterConfig {
    pub device: PathBuf,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/serial0"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GpioConfig {
    /// Added to every pin number (the chip base on newer kernels).
    pub base: u32,
    pub shutter_pin: u32,
    pub power_pin: u32,
    pub led_pin: u32,
    pub hold_secs: u64,
    pub poll_ms: u64,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            base: 0,
            shutter_pin: 16,
            power_pin: 26,
            led_pin: 20,
            hold_secs: 2,
            poll_ms: 20,
        }
    }
}

impl GpioConfig {
    pub fn hold_time(&self) -> Duration {
        Duration::from_secs(self.hold_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptioningConfig {
    pub base_url: String,
    pub model_version: String,
    pub timeout_secs: u64,
    pub api_token: Option<String>,
}

impl Default for CaptioningConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.replicate.com".to_string(),
            model_version: BLIP2_VERSION.to_string(),
            timeout_secs: 60,
            api_token: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub api_key: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: 60,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub busy_led: LedPattern,
    /// 1 disables retrying.
    pub remote_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            busy_led: LedPattern::Blink,
            remote_attempts: 1,
            retry_backoff_ms: 500,
        }
    }
}

impl SessionConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.remote_attempts,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReceiptConfig {
    pub wrap_width: usize,
    pub attribution: String,
    pub archive_label: String,
    pub archive_url: String,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            wrap_width: DEFAULT_WRAP_WIDTH,
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            archive_label: DEFAULT_ARCHIVE_LABEL.to_string(),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PowerConfig {
    pub command: Vec<String>,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            command: ["sudo", "shutdown", "-h", "now"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Checks ranges and required commands.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.receipt.wrap_width < 8 {
            return Err(ConfigError::Invalid(format!(
                "receipt.wrap_width must be at least 8, got {}",
                self.receipt.wrap_width
            )));
        }
        if self.session.remote_attempts < 1 {
            return Err(ConfigError::Invalid(
                "session.remote_attempts must be at least 1".to_string(),
            ));
        }
        if self.camera.command.is_empty() {
            return Err(ConfigError::Invalid("camera.command is empty".to_string()));
        }
        if self.power.command.is_empty() {
            return Err(ConfigError::Invalid("power.command is empty".to_string()));
        }
        if self.gpio.poll_ms == 0 {
            return Err(ConfigError::Invalid("gpio.poll_ms must be positive".to_string()));
        }
        if self.gpio.hold_secs == 0 {
            return Err(ConfigError::Invalid("gpio.hold_secs must be positive".to_string()));
        }
        if self.captioning.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "captioning.timeout_secs must be positive".to_string(),
            ));
        }
        if self.generation.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "generation.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Fails unless both service credentials are present.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        if is_blank(&self.captioning.api_token) {
            return Err(ConfigError::MissingCredential("REPLICATE_API_TOKEN"));
        }
        if is_blank(&self.generation.api_key) {
            return Err(ConfigError::MissingCredential("OPENAI_API_KEY"));
        }
        Ok(())
    }
}

fn is_blank(secret: &Option<String>) -> bool {
    secret.as_deref().map_or(true, |s| s.trim().is_empty())
}
