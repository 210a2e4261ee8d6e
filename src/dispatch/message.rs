use std::time::Duration;

/// Inbound events from the buttons and the process signal handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The shutter button went down.
    ShutterPressed,
    /// The power button has been held for `held`.
    HoldConfirmed { held: Duration },
    /// The process was asked to stop (Ctrl+C).
    Interrupt,
}
