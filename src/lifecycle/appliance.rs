use crate::capture::CaptureService;
use crate::clients::{OpenAiComposer, ReplicateDescriber};
use crate::config::Config;
use crate::dispatch::{EventClient, SessionActor};
use crate::hardware::gpio::{ButtonRole, Direction, SysfsPin, SYSFS_GPIO_ROOT};
use crate::hardware::{ButtonWatcher, CommandCamera, SysfsLed, SystemPower, ThermalPrinter};
use crate::lifecycle::{LifecycleController, ShutdownReason, StartupError};
use crate::model::SessionState;
use crate::receipt::PrintRenderer;
use crate::session::SessionOrchestrator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

const EVENT_BUFFER: usize = 16;

/// The running device: the session actor plus its event sources.
///
/// Wires the orchestrator and lifecycle controller, spawns the worker and
/// keeps the task handles for shutdown.
///
/// ```ignore
/// let appliance = Appliance::from_config(&config)?;
/// let reason = appliance.wait().await?;
/// ```
pub struct Appliance {
    /// Client for delivering device events.
    pub client: EventClient,
    state: watch::Receiver<SessionState>,
    actor: JoinHandle<ShutdownReason>,
    watchers: Vec<JoinHandle<()>>,
}

impl Appliance {
    /// Spawns the session actor around already-built parts.
    pub fn start(orchestrator: SessionOrchestrator, lifecycle: LifecycleController) -> Self {
        let (actor, client) = SessionActor::new(EVENT_BUFFER);
        let state = orchestrator.subscribe();
        let actor = tokio::spawn(actor.run(orchestrator, lifecycle));

        Self {
            client,
            state,
            actor,
            watchers: Vec::new(),
        }
    }

    /// Builds the real hardware and service clients and starts watching the
    /// buttons.
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let gpio = &config.gpio;
        let pin = |number: u32, direction| {
            SysfsPin::export(SYSFS_GPIO_ROOT, gpio.base + number, direction)
        };
        let shutter_pin = pin(gpio.shutter_pin, Direction::In)?;
        let power_pin = pin(gpio.power_pin, Direction::In)?;
        let led = SysfsLed::new(pin(gpio.led_pin, Direction::Out)?);

        let camera = CommandCamera::new(&config.camera.command)?;
        let capture = CaptureService::new(
            Arc::new(camera),
            config.camera.device_index,
            &config.camera.photo_path,
        );

        let captioning = &config.captioning;
        let describer = ReplicateDescriber::new(
            &captioning.base_url,
            captioning.api_token.clone().unwrap_or_default(),
            captioning.model_version.clone(),
            Duration::from_secs(captioning.timeout_secs),
        )?;

        let generation = &config.generation;
        let composer = OpenAiComposer::new(
            &generation.base_url,
            generation.api_key.clone().unwrap_or_default(),
            generation.model.clone(),
            Duration::from_secs(generation.timeout_secs),
        )?
        .with_sampling(generation.temperature, generation.max_tokens);

        let receipt = &config.receipt;
        let renderer = PrintRenderer::new(receipt.wrap_width).with_footer(
            receipt.attribution.clone(),
            receipt.archive_label.clone(),
            receipt.archive_url.clone(),
        );
        let printer = ThermalPrinter::open(&config.printer.device)?;

        let orchestrator = SessionOrchestrator::new(
            capture,
            Arc::new(describer),
            Arc::new(composer),
            renderer,
            Box::new(printer),
            Box::new(led),
        )
        .with_busy_pattern(config.session.busy_led)
        .with_retry(config.session.retry_policy());

        let power = SystemPower::new(config.power.command.clone());
        let lifecycle = LifecycleController::new(Arc::new(power), gpio.hold_time());

        let mut appliance = Self::start(orchestrator, lifecycle);
        let poll = gpio.poll_interval();
        appliance.watchers.push(
            ButtonWatcher::new(shutter_pin, ButtonRole::Shutter, poll).spawn(appliance.client.clone()),
        );
        appliance.watchers.push(
            ButtonWatcher::new(
                power_pin,
                ButtonRole::Power {
                    hold_time: gpio.hold_time(),
                },
                poll,
            )
            .spawn(appliance.client.clone()),
        );

        info!(
            shutter = gpio.base + gpio.shutter_pin,
            power = gpio.base + gpio.power_pin,
            led = gpio.base + gpio.led_pin,
            "Appliance ready"
        );
        Ok(appliance)
    }

    /// Watches session state changes.
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Waits for the actor to stop on its own (power-off or interrupt).
    pub async fn wait(self) -> Result<ShutdownReason, String> {
        let Appliance {
            client,
            actor,
            watchers,
            ..
        } = self;

        let reason = actor.await;
        for watcher in watchers {
            watcher.abort();
        }
        drop(client);

        reason.map_err(|e| {
            error!("Session actor failed: {:?}", e);
            format!("Session actor failed: {:?}", e)
        })
    }

    /// Stops the button watchers, closes the event channel and waits for the
    /// actor to finish any session in progress.
    pub async fn shutdown(self) -> Result<ShutdownReason, String> {
        info!("Shutting down appliance...");
        let Appliance {
            client,
            actor,
            watchers,
            ..
        } = self;

        for watcher in watchers {
            watcher.abort();
        }
        drop(client);

        match actor.await {
            Ok(reason) => {
                info!(?reason, "Appliance shutdown complete.");
                Ok(reason)
            }
            Err(e) => {
                error!("Session actor failed: {:?}", e);
                Err(format!("Session actor failed: {:?}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{LedState, MockRig};

    #[tokio::test]
    async fn shutdown_closes_channel() {
        let rig = MockRig::new();
        let dir = tempfile::tempdir().unwrap();
        let appliance = Appliance::start(
            rig.orchestrator(dir.path().join("image.jpg")),
            rig.lifecycle(Duration::from_secs(2)),
        );

        let reason = appliance.shutdown().await.unwrap();
        assert_eq!(reason, ShutdownReason::ChannelClosed);
        assert_eq!(rig.led.current(), Some(LedState::Off));
    }

    #[tokio::test]
    async fn wait_returns_after_interrupt() {
        let rig = MockRig::new();
        let dir = tempfile::tempdir().unwrap();
        let appliance = Appliance::start(
            rig.orchestrator(dir.path().join("image.jpg")),
            rig.lifecycle(Duration::from_secs(2)),
        );

        appliance.client.interrupt().await.unwrap();
        assert_eq!(appliance.wait().await.unwrap(), ShutdownReason::Interrupted);
    }
}
