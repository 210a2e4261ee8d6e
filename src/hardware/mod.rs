//! # Hardware Adapters
//!
//! Thin I/O wrappers around the devices on the board. Nothing in here makes a
//! policy decision: the session orchestrator decides *when* the LED blinks or
//! the camera opens, these types only know *how*.
//!
//! Each device sits behind a trait so the orchestrator can be driven by the
//! doubles in [`crate::mock`] in tests:
//!
//! - [`Camera`] - open / read one frame / close ([`CommandCamera`])
//! - [`Printer`] - alignment, line height, line output ([`ThermalPrinter`])
//! - [`Indicator`] - the status LED ([`SysfsLed`])
//! - [`PowerControl`] - machine power-off ([`SystemPower`])
//!
//! Button input lives in [`gpio::ButtonWatcher`], which turns pin edges into
//! [`DeviceEvent`](crate::dispatch::DeviceEvent)s.

pub mod camera;
pub mod error;
pub mod gpio;
pub mod power;
pub mod printer;

pub use camera::*;
pub use error::*;
pub use gpio::{ButtonWatcher, SysfsLed};
pub use power::*;
pub use printer::*;

use async_trait::async_trait;

/// Opaque handle to an opened camera device.
#[derive(Debug, PartialEq, Eq)]
pub struct CameraHandle {
    pub device_index: u32,
}

/// One encoded image as delivered by the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub bytes: Vec<u8>,
}

/// Frame acquisition primitives.
///
/// Calls block; the capture service runs them on the blocking pool.
pub trait Camera: Send + Sync {
    fn open(&self, device_index: u32) -> Result<CameraHandle, HardwareError>;

    /// Returns `None` when the device produced no frame.
    fn read_frame(&self, handle: &CameraHandle) -> Option<Frame>;

    fn close(&self, handle: CameraHandle);
}

/// Horizontal justification supported by the receipt printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
}

/// Receipt printer primitives.
pub trait Printer: Send {
    fn set_alignment(&mut self, alignment: Alignment) -> Result<(), HardwareError>;

    fn write_line(&mut self, text: &str) -> Result<(), HardwareError>;

    /// `None` restores the printer's default line height.
    fn set_line_height(&mut self, px: Option<u8>) -> Result<(), HardwareError>;
}

/// The single status LED.
pub trait Indicator: Send {
    fn on(&mut self) -> Result<(), HardwareError>;

    fn off(&mut self) -> Result<(), HardwareError>;

    fn blink(&mut self) -> Result<(), HardwareError>;
}

/// Machine power control.
#[async_trait]
pub trait PowerControl: Send + Sync {
    async fn power_off(&self) -> Result<(), HardwareError>;
}
