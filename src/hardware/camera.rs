use crate::hardware::{Camera, CameraHandle, Frame, HardwareError};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Camera backed by an external still-capture program.
///
/// The program must write one encoded image to stdout. `{index}` in any
/// argument is replaced with the device index passed to [`Camera::open`].
/// With the default `rpicam-still` command the camera stack itself enforces
/// exclusive access while a capture runs.
#[derive(Debug, Clone)]
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
}

impl CommandCamera {
    /// Builds the camera from a command line, program first.
    pub fn new(command: &[String]) -> Result<Self, HardwareError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| HardwareError::Unavailable("empty camera command".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn args_for(&self, device_index: u32) -> Vec<String> {
        let index = device_index.to_string();
        self.args
            .iter()
            .map(|arg| arg.replace("{index}", &index))
            .collect()
    }
}

impl Camera for CommandCamera {
    fn open(&self, device_index: u32) -> Result<CameraHandle, HardwareError> {
        debug!(program = %self.program, device_index, "Camera opened");
        Ok(CameraHandle { device_index })
    }

    fn read_frame(&self, handle: &CameraHandle) -> Option<Frame> {
        let output = Command::new(&self.program)
            .args(self.args_for(handle.device_index))
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        match output {
            Ok(output) if output.status.success() && !output.stdout.is_empty() => {
                debug!(bytes = output.stdout.len(), "Frame read");
                Some(Frame {
                    bytes: output.stdout,
                })
            }
            Ok(output) => {
                warn!(
                    status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "Camera produced no frame"
                );
                None
            }
            Err(e) => {
                warn!(program = %self.program, error = %e, "Camera command could not run");
                None
            }
        }
    }

    fn close(&self, handle: CameraHandle) {
        debug!(device_index = handle.device_index, "Camera released");
    }
}
