use crate::dispatch::{DeviceEvent, EventClient};
use crate::lifecycle::{LifecycleController, ShutdownReason};
use crate::session::SessionOrchestrator;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// The single worker that owns the orchestrator and the lifecycle controller.
///
/// Events are handled one at a time. While a session runs, the loop keeps
/// reading the channel: further shutter presses are dropped, and a confirmed
/// hold or an interrupt abandons the session and ends the loop.
pub struct SessionActor {
    receiver: mpsc::Receiver<DeviceEvent>,
}

impl SessionActor {
    pub fn new(buffer_size: usize) -> (Self, EventClient) {
        let (client, receiver) = EventClient::channel(buffer_size);
        (Self { receiver }, client)
    }

    /// Runs until power-off, interrupt, or every client is dropped.
    pub async fn run(
        self,
        mut orchestrator: SessionOrchestrator,
        mut lifecycle: LifecycleController,
    ) -> ShutdownReason {
        let SessionActor { mut receiver } = self;
        info!("Session actor started");

        let reason = loop {
            let Some(event) = receiver.recv().await else {
                orchestrator.abandon();
                break ShutdownReason::ChannelClosed;
            };

            let event = match event {
                DeviceEvent::ShutterPressed => {
                    match run_session(&mut orchestrator, &lifecycle, &mut receiver).await {
                        Some(event) => event,
                        None => continue,
                    }
                }
                other => other,
            };

            let stop = match event {
                DeviceEvent::HoldConfirmed { held } => {
                    lifecycle.on_hold_button(held, &mut orchestrator).await
                }
                DeviceEvent::Interrupt => Some(lifecycle.on_interrupt(&mut orchestrator)),
                DeviceEvent::ShutterPressed => None,
            };
            if let Some(reason) = stop {
                break reason;
            }
        };

        info!(?reason, "Session actor stopped");
        reason
    }
}

/// Drives one session while watching the channel.
///
/// Returns the lifecycle event that cut the session short, if any.
async fn run_session(
    orchestrator: &mut SessionOrchestrator,
    lifecycle: &LifecycleController,
    receiver: &mut mpsc::Receiver<DeviceEvent>,
) -> Option<DeviceEvent> {
    let session = orchestrator.on_shutter_pressed();
    tokio::pin!(session);

    loop {
        // Queued events are drained before the session is polled, so a press
        // made while the session was running is never taken as a new one.
        tokio::select! {
            biased;

            next = receiver.recv() => match next {
                Some(DeviceEvent::ShutterPressed) => {
                    debug!("Shutter ignored, session active");
                }
                Some(DeviceEvent::HoldConfirmed { held }) if !lifecycle.is_long_enough(held) => {
                    debug!(held_ms = held.as_millis() as u64, "Short hold ignored");
                }
                Some(event) => return Some(event),
                None => {
                    (&mut session).await;
                    return None;
                }
            },
            report = &mut session => {
                if let Some(report) = report {
                    debug!(id = %report.id, completed = report.is_completed(), "Session finished");
                }
                return None;
            }
        }
    }
}
