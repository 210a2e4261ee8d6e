use crate::hardware::{HardwareError, PowerControl};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, instrument};

/// Powers the machine off by running a system command.
#[derive(Debug, Clone)]
pub struct SystemPower {
    command: Vec<String>,
}

impl SystemPower {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl PowerControl for SystemPower {
    #[instrument(skip(self))]
    async fn power_off(&self) -> Result<(), HardwareError> {
        let rendered = self.command.join(" ");
        let (program, args) = self.command.split_first().ok_or_else(|| HardwareError::Command {
            command: rendered.clone(),
            message: "empty power-off command".to_string(),
        })?;

        info!(command = %rendered, "Powering off");
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| HardwareError::Command {
                command: rendered.clone(),
                message: e.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(HardwareError::Command {
                command: rendered,
                message: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            })
        }
    }
}
