//! # Test Doubles
//!
//! Recording stand-ins for every device and service the orchestrator talks
//! to. Each double is cheap to clone and clones share state, so a test keeps
//! one handle for assertions and gives another to the code under test.
//!
//! Remote doubles follow an expectation queue: every call pops the next
//! expectation, and a call with nothing queued panics.
//!
//! ```ignore
//! let describer = MockDescriber::new();
//! describer.expect_describe().return_ok("a dog on a beach");
//! describer.expect_describe().return_err(RemoteError::Timeout("60s".into()));
//!
//! // hand `describer.clone()` to the orchestrator ...
//!
//! describer.verify(); // every expectation was used
//! ```
//!
//! [`RemoteExpectationBuilder::hold_until`] parks a call on a
//! [`Notify`] so a test can act while a session is mid-flight.

use crate::capture::CaptureService;
use crate::clients::{Composer, Describer, RemoteError};
use crate::hardware::{
    Alignment, Camera, CameraHandle, Frame, HardwareError, Indicator, PowerControl, Printer,
};
use crate::lifecycle::LifecycleController;
use crate::model::{Caption, PhotoRef, Poem};
use crate::receipt::{PrintOp, PrintRenderer};
use crate::session::SessionOrchestrator;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// CAMERA
// =============================================================================

enum ReadExpectation {
    Frame(Vec<u8>),
    NoFrame,
}

#[derive(Default)]
struct CameraState {
    reads: VecDeque<ReadExpectation>,
    open_error: Option<String>,
    opens: usize,
    closes: usize,
}

/// Camera double with queued frame reads.
#[derive(Clone, Default)]
pub struct MockCamera {
    state: Arc<Mutex<CameraState>>,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects one `read_frame` call.
    pub fn expect_read(&self) -> ReadExpectationBuilder {
        ReadExpectationBuilder {
            state: self.state.clone(),
        }
    }

    /// Makes every `open` fail.
    pub fn fail_open(&self, message: impl Into<String>) {
        lock(&self.state).open_error = Some(message.into());
    }

    pub fn open_count(&self) -> usize {
        lock(&self.state).opens
    }

    pub fn close_count(&self) -> usize {
        lock(&self.state).closes
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = lock(&self.state).reads.len();
        if remaining > 0 {
            panic!("Not all camera reads happened. {} remaining", remaining);
        }
    }
}

/// Builder for `read_frame` expectations.
pub struct ReadExpectationBuilder {
    state: Arc<Mutex<CameraState>>,
}

impl ReadExpectationBuilder {
    pub fn return_frame(self, bytes: Vec<u8>) {
        lock(&self.state).reads.push_back(ReadExpectation::Frame(bytes));
    }

    pub fn return_none(self) {
        lock(&self.state).reads.push_back(ReadExpectation::NoFrame);
    }
}

impl Camera for MockCamera {
    fn open(&self, device_index: u32) -> Result<CameraHandle, HardwareError> {
        let mut state = lock(&self.state);
        state.opens += 1;
        match &state.open_error {
            Some(message) => Err(HardwareError::Unavailable(message.clone())),
            None => Ok(CameraHandle { device_index }),
        }
    }

    fn read_frame(&self, _handle: &CameraHandle) -> Option<Frame> {
        let next = lock(&self.state).reads.pop_front();
        match next {
            Some(ReadExpectation::Frame(bytes)) => Some(Frame { bytes }),
            Some(ReadExpectation::NoFrame) => None,
            None => panic!("Unexpected camera read"),
        }
    }

    fn close(&self, _handle: CameraHandle) {
        lock(&self.state).closes += 1;
    }
}

// =============================================================================
// REMOTE SERVICES
// =============================================================================

struct RemoteExpectation {
    response: Result<String, RemoteError>,
    gate: Option<Arc<Notify>>,
}

type ExpectationQueue = Arc<Mutex<VecDeque<RemoteExpectation>>>;

/// Builder for describe and compose expectations.
pub struct RemoteExpectationBuilder {
    queue: ExpectationQueue,
    gate: Option<Arc<Notify>>,
}

impl RemoteExpectationBuilder {
    /// Parks the call until `gate` is notified.
    pub fn hold_until(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn return_ok(self, text: impl Into<String>) {
        self.push(Ok(text.into()));
    }

    pub fn return_err(self, error: RemoteError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<String, RemoteError>) {
        lock(&self.queue).push_back(RemoteExpectation {
            response,
            gate: self.gate,
        });
    }
}

async fn next_response(queue: &ExpectationQueue, service: &str) -> Result<String, RemoteError> {
    let next = lock(queue).pop_front();
    let Some(expectation) = next else {
        panic!("Unexpected {} call", service);
    };
    if let Some(gate) = expectation.gate {
        gate.notified().await;
    }
    expectation.response
}

fn verify_queue(queue: &ExpectationQueue, service: &str) {
    let remaining = lock(queue).len();
    if remaining > 0 {
        panic!("Not all {} expectations were met. {} remaining", service, remaining);
    }
}

/// Captioning double.
#[derive(Clone, Default)]
pub struct MockDescriber {
    expectations: ExpectationQueue,
    calls: Arc<Mutex<Vec<(PhotoRef, bool)>>>,
}

impl MockDescriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_describe(&self) -> RemoteExpectationBuilder {
        RemoteExpectationBuilder {
            queue: self.expectations.clone(),
            gate: None,
        }
    }

    pub fn calls(&self) -> Vec<PhotoRef> {
        lock(&self.calls).iter().map(|(photo, _)| photo.clone()).collect()
    }

    /// For each call, whether the photo file existed when it was made.
    pub fn photo_existed(&self) -> Vec<bool> {
        lock(&self.calls).iter().map(|(_, existed)| *existed).collect()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn verify(&self) {
        verify_queue(&self.expectations, "describe");
    }
}

#[async_trait]
impl Describer for MockDescriber {
    async fn describe(&self, photo: &PhotoRef) -> Result<Caption, RemoteError> {
        lock(&self.calls).push((photo.clone(), photo.path().exists()));
        next_response(&self.expectations, "describe")
            .await
            .map(Caption::new)
    }
}

/// Generation double.
#[derive(Clone, Default)]
pub struct MockComposer {
    expectations: ExpectationQueue,
    calls: Arc<Mutex<Vec<Caption>>>,
}

impl MockComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_compose(&self) -> RemoteExpectationBuilder {
        RemoteExpectationBuilder {
            queue: self.expectations.clone(),
            gate: None,
        }
    }

    pub fn calls(&self) -> Vec<Caption> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn verify(&self) {
        verify_queue(&self.expectations, "compose");
    }
}

#[async_trait]
impl Composer for MockComposer {
    async fn compose(&self, caption: &Caption) -> Result<Poem, RemoteError> {
        lock(&self.calls).push(caption.clone());
        next_response(&self.expectations, "compose")
            .await
            .map(Poem::new)
    }
}

// =============================================================================
// PRINTER, LED, POWER
// =============================================================================

#[derive(Default)]
struct PrinterState {
    ops: Vec<PrintOp>,
    fail_after: Option<usize>,
}

/// Printer double that records every operation.
#[derive(Clone, Default)]
pub struct MockPrinter {
    state: Arc<Mutex<PrinterState>>,
}

impl MockPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `ops` operations, then fails every later one.
    pub fn fail_after(&self, ops: usize) {
        lock(&self.state).fail_after = Some(ops);
    }

    pub fn ops(&self) -> Vec<PrintOp> {
        lock(&self.state).ops.clone()
    }

    /// Printed text lines, in order.
    pub fn lines(&self) -> Vec<String> {
        lock(&self.state)
            .ops
            .iter()
            .filter_map(|op| match op {
                PrintOp::Line(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: PrintOp) -> Result<(), HardwareError> {
        let mut state = lock(&self.state);
        if state.fail_after.is_some_and(|limit| state.ops.len() >= limit) {
            return Err(HardwareError::Unavailable("mock printer offline".to_string()));
        }
        state.ops.push(op);
        Ok(())
    }
}

impl Printer for MockPrinter {
    fn set_alignment(&mut self, alignment: Alignment) -> Result<(), HardwareError> {
        self.record(PrintOp::Align(alignment))
    }

    fn write_line(&mut self, text: &str) -> Result<(), HardwareError> {
        self.record(PrintOp::Line(text.to_string()))
    }

    fn set_line_height(&mut self, px: Option<u8>) -> Result<(), HardwareError> {
        self.record(PrintOp::LineHeight(px))
    }
}

/// What the LED was last told to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    On,
    Off,
    Blink,
}

#[derive(Clone, Default)]
pub struct MockLed {
    states: Arc<Mutex<Vec<LedState>>>,
}

impl MockLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self) -> Vec<LedState> {
        lock(&self.states).clone()
    }

    pub fn current(&self) -> Option<LedState> {
        lock(&self.states).last().copied()
    }
}

impl Indicator for MockLed {
    fn on(&mut self) -> Result<(), HardwareError> {
        lock(&self.states).push(LedState::On);
        Ok(())
    }

    fn off(&mut self) -> Result<(), HardwareError> {
        lock(&self.states).push(LedState::Off);
        Ok(())
    }

    fn blink(&mut self) -> Result<(), HardwareError> {
        lock(&self.states).push(LedState::Blink);
        Ok(())
    }
}

#[derive(Default)]
struct PowerState {
    calls: usize,
    error: Option<String>,
}

#[derive(Clone, Default)]
pub struct MockPower {
    state: Arc<Mutex<PowerState>>,
}

impl MockPower {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `power_off` report a command failure.
    pub fn fail_with(&self, message: impl Into<String>) {
        lock(&self.state).error = Some(message.into());
    }

    pub fn power_off_count(&self) -> usize {
        lock(&self.state).calls
    }
}

#[async_trait]
impl PowerControl for MockPower {
    async fn power_off(&self) -> Result<(), HardwareError> {
        let mut state = lock(&self.state);
        state.calls += 1;
        match &state.error {
            Some(message) => Err(HardwareError::Command {
                command: "mock power-off".to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

// =============================================================================
// WIRING
// =============================================================================

/// One of every double, plus builders for the parts that use them.
#[derive(Clone, Default)]
pub struct MockRig {
    pub camera: MockCamera,
    pub describer: MockDescriber,
    pub composer: MockComposer,
    pub printer: MockPrinter,
    pub led: MockLed,
    pub power: MockPower,
}

impl MockRig {
    pub fn new() -> Self {
        Self::default()
    }

    /// An orchestrator on the mock devices, writing photos to `photo_path`.
    pub fn orchestrator(&self, photo_path: impl Into<PathBuf>) -> SessionOrchestrator {
        SessionOrchestrator::new(
            CaptureService::new(Arc::new(self.camera.clone()), 0, photo_path),
            Arc::new(self.describer.clone()),
            Arc::new(self.composer.clone()),
            PrintRenderer::default(),
            Box::new(self.printer.clone()),
            Box::new(self.led.clone()),
        )
    }

    pub fn lifecycle(&self, hold_time: Duration) -> LifecycleController {
        LifecycleController::new(Arc::new(self.power.clone()), hold_time)
    }
}
