//! # Poetry Camera
//!
//! Device entry point. Loads configuration, brings up the hardware, and runs
//! until the power button is held or the process is interrupted.
//!
//! There are no command-line flags; see [`poetry_camera::config`] for the
//! config file locations and environment variables.

use poetry_camera::config::Config;
use poetry_camera::lifecycle::tracing::setup_tracing;
use poetry_camera::lifecycle::{Appliance, ShutdownReason};
use tracing::{info, info_span, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let (config, _sources) = Config::load().map_err(|e| e.to_string())?;
    config.require_credentials().map_err(|e| e.to_string())?;

    let span = info_span!("startup");
    let appliance = async {
        info!("Starting poetry camera");
        Appliance::from_config(&config).map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;

    let interrupts = appliance.client.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for Ctrl+C");
            return;
        }
        let _ = interrupts.interrupt().await;
    });

    let reason = appliance.wait().await?;
    info!(?reason, "Stopped");

    if reason == ShutdownReason::Interrupted {
        std::process::exit(reason.exit_code());
    }
    Ok(())
}
