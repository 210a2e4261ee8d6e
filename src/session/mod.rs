//! # Session Orchestrator
//!
//! Owns one capture-to-print cycle at a time and is the only writer of
//! session state. A session walks
//! `Capturing → Describing → Composing → Printing → Completed`, awaiting
//! exactly one downstream call per step; any step failure ends it in
//! `Failed`. Either way the LED goes off and the orchestrator is idle again.
//!
//! Presses that arrive while a session is active are dropped, not queued.
//! State changes are published on a [`watch`] channel for observers.

pub mod error;

pub use error::*;

use crate::capture::CaptureService;
use crate::clients::{Composer, Describer, RemoteError};
use crate::hardware::{Indicator, Printer};
use crate::model::{CaptureSession, Poem, SessionOutcome, SessionReport, SessionState};
use crate::receipt::PrintRenderer;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// LED behaviour while a session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedPattern {
    #[default]
    Blink,
    Solid,
}

/// Bounded retry for the remote steps.
///
/// One attempt means no retry. Only transport failures (unreachable,
/// timeout) are retried; a service error is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub async fn run<T, F, Fut>(&self, step: SessionState, mut call: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(%step, attempt, error = %e, "Remote call failed, retrying");
                    tokio::time::sleep(self.backoff * attempt).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

pub struct SessionOrchestrator {
    capture: CaptureService,
    describer: Arc<dyn Describer>,
    composer: Arc<dyn Composer>,
    renderer: PrintRenderer,
    printer: Box<dyn Printer>,
    led: Box<dyn Indicator>,
    busy: LedPattern,
    retry: RetryPolicy,
    active: bool,
    state: watch::Sender<SessionState>,
}

impl SessionOrchestrator {
    pub fn new(
        capture: CaptureService,
        describer: Arc<dyn Describer>,
        composer: Arc<dyn Composer>,
        renderer: PrintRenderer,
        printer: Box<dyn Printer>,
        led: Box<dyn Indicator>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            capture,
            describer,
            composer,
            renderer,
            printer,
            led,
            busy: LedPattern::default(),
            retry: RetryPolicy::default(),
            active: false,
            state,
        }
    }

    pub fn with_busy_pattern(mut self, busy: LedPattern) -> Self {
        self.busy = busy;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Runs one full session, or does nothing if one is already active.
    pub async fn on_shutter_pressed(&mut self) -> Option<SessionReport> {
        if self.active {
            debug!(state = %self.state(), "Shutter ignored, session active");
            return None;
        }
        self.active = true;

        let session = CaptureSession::start();
        let span = info_span!("session", id = %session.id);
        Some(self.run_session(session).instrument(span).await)
    }

    /// Forces the LED off and clears the active flag.
    ///
    /// Used when a session future is dropped mid-flight. Artifacts already
    /// written (the photo) are left as they are.
    pub fn abandon(&mut self) {
        if let Err(e) = self.led.off() {
            warn!(error = %e, "LED off failed");
        }
        if self.active {
            info!(state = %self.state(), "Session abandoned");
        }
        self.active = false;
        self.publish(SessionState::Idle);
    }

    async fn run_session(&mut self, mut session: CaptureSession) -> SessionReport {
        info!("Session started");
        self.publish(session.state());
        self.show_busy();

        let outcome = match self.drive(&mut session).await {
            Ok(poem) => {
                session.complete();
                info!(poem = %poem, "Session completed");
                SessionOutcome::Completed(poem)
            }
            Err(failure) => {
                session.fail(failure.clone());
                error!(
                    step = %failure.step,
                    kind = %failure.kind,
                    error = %failure.message,
                    "Session failed"
                );
                SessionOutcome::Failed(failure)
            }
        };
        self.publish(session.state());

        if let Err(e) = self.led.off() {
            warn!(error = %e, "LED off failed");
        }
        self.active = false;
        self.publish(SessionState::Idle);

        SessionReport {
            id: session.id,
            history: session.history().to_vec(),
            outcome,
        }
    }

    async fn drive(&mut self, session: &mut CaptureSession) -> Result<Poem, SessionFailure> {
        let photo = self.capture.capture().await?;
        let photo = session.describing(photo).clone();
        self.publish(session.state());
        debug!(photo = %photo, bytes = photo.len(), "Describing");

        let describer = self.describer.clone();
        let caption = self
            .retry
            .run(SessionState::Describing, || describer.describe(&photo))
            .await
            .map_err(|e| SessionFailure::remote(SessionState::Describing, &e))?;
        let caption = session.composing(caption).clone();
        self.publish(session.state());
        debug!(caption = %caption, "Composing");

        let composer = self.composer.clone();
        let poem = self
            .retry
            .run(SessionState::Composing, || composer.compose(&caption))
            .await
            .map_err(|e| SessionFailure::remote(SessionState::Composing, &e))?;
        let poem = session.printing(poem).clone();
        self.publish(session.state());
        debug!(lines = poem.lines().count(), "Printing");

        let receipt = self.renderer.render(&poem);
        if let Err(e) = self.renderer.print(&receipt, self.printer.as_mut()) {
            error!(error = %e, "Printer error, receipt may be incomplete");
        }
        Ok(poem)
    }

    fn show_busy(&mut self) {
        let result = match self.busy {
            LedPattern::Blink => self.led.blink(),
            LedPattern::Solid => self.led.on(),
        };
        if let Err(e) = result {
            warn!(error = %e, "LED busy pattern failed");
        }
    }

    fn publish(&self, state: SessionState) {
        self.state.send_replace(state);
        debug!(%state, "State");
    }
}
