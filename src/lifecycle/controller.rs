use crate::hardware::PowerControl;
use crate::session::SessionOrchestrator;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Why the session actor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The power button was held and power-off was requested.
    PowerOff,
    /// Ctrl+C or an equivalent interrupt.
    Interrupted,
    /// Every event client was dropped.
    ChannelClosed,
}

impl ShutdownReason {
    /// Process exit status for this reason.
    pub fn exit_code(self) -> i32 {
        match self {
            ShutdownReason::Interrupted => 130,
            ShutdownReason::PowerOff | ShutdownReason::ChannelClosed => 0,
        }
    }
}

/// Handles the two process-level exits: power-off hold and interrupt.
pub struct LifecycleController {
    power: Arc<dyn PowerControl>,
    hold_time: Duration,
    powered_off: bool,
}

impl LifecycleController {
    pub fn new(power: Arc<dyn PowerControl>, hold_time: Duration) -> Self {
        Self {
            power,
            hold_time,
            powered_off: false,
        }
    }

    pub fn is_long_enough(&self, held: Duration) -> bool {
        held >= self.hold_time
    }

    /// Powers off after a long enough hold; shorter holds are ignored.
    ///
    /// Power-off is requested at most once. A failed request is logged and
    /// still ends the dispatch loop.
    pub async fn on_hold_button(
        &mut self,
        held: Duration,
        orchestrator: &mut SessionOrchestrator,
    ) -> Option<ShutdownReason> {
        if !self.is_long_enough(held) {
            debug!(held_ms = held.as_millis() as u64, "Short hold ignored");
            return None;
        }
        if self.powered_off {
            return Some(ShutdownReason::PowerOff);
        }

        orchestrator.abandon();
        self.powered_off = true;
        info!(held_ms = held.as_millis() as u64, "Power button held, shutting down");
        if let Err(e) = self.power.power_off().await {
            error!(error = %e, "Power-off request failed");
        }
        Some(ShutdownReason::PowerOff)
    }

    pub fn on_interrupt(&mut self, orchestrator: &mut SessionOrchestrator) -> ShutdownReason {
        orchestrator.abandon();
        info!("Interrupted, LED off");
        ShutdownReason::Interrupted
    }
}
