//! # Poetry Camera
//!
//! > **Press the shutter, get a poem.**
//!
//! Firmware for a small single-board appliance. A button press takes a
//! photo, a remote vision model captions it, a remote language model turns
//! the caption into a short poem, and a thermal receipt printer prints it.
//! Holding the power button shuts the board down.
//!
//! ## 🏗️ Architecture
//!
//! ### One worker, one session
//! Device events (shutter press, power hold, Ctrl+C) travel over a bounded
//! channel to a single [`SessionActor`](dispatch::SessionActor). It owns the
//! [`SessionOrchestrator`](session::SessionOrchestrator), so session state
//! has exactly one writer and needs no locks. Presses during a session are
//! dropped, not queued.
//!
//! ### The pipeline
//! A session is a forward-only walk through
//! `Capturing → Describing → Composing → Printing → Completed`. Each
//! transition takes the artifact produced by the previous step, so the
//! caption request cannot start before the photo is on disk and the poem
//! request cannot start before a caption exists. Any failure lands in
//! `Failed`; the LED goes off and the device waits for the next press.
//!
//! ### Error handling
//! Each layer has its own `thiserror` enum ([`CaptureError`](capture::CaptureError),
//! [`RemoteError`](clients::RemoteError), [`HardwareError`](hardware::HardwareError),
//! [`ConfigError`](config::ConfigError)). The orchestrator folds step errors
//! into a [`SessionFailure`](session::SessionFailure) with a
//! [`FailureKind`](session::FailureKind) and the step that failed.
//!
//! ### Observability
//! `tracing` throughout, with a `session` span around every cycle. See
//! [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! - [`hardware`]: camera, printer, LED, buttons and power, behind traits
//! - [`capture`]: one photo per call, camera released on every path
//! - [`clients`]: captioning and poem services
//! - [`receipt`]: receipt layout and word wrap
//! - [`session`]: the orchestrator state machine
//! - [`dispatch`]: device events and the worker loop
//! - [`lifecycle`]: power-off, interrupt, wiring and logging
//! - [`config`]: TOML configuration with environment overlay
//! - [`mock`]: test doubles for all of the above
//!
//! ## 🚀 Running
//!
//! ```bash
//! export REPLICATE_API_TOKEN=r8_...
//! export OPENAI_API_KEY=sk-...
//! RUST_LOG=info poetry-camera
//! ```

pub mod capture;
pub mod clients;
pub mod config;
pub mod dispatch;
pub mod hardware;
pub mod lifecycle;
pub mod mock;
pub mod model;
pub mod receipt;
pub mod session;
