//! # Event Dispatch
//!
//! Button watchers and the signal handler never touch the orchestrator
//! directly. They hold an [`EventClient`] and send [`DeviceEvent`]s into a
//! bounded channel; the [`SessionActor`] owns the receiver and everything
//! the events act on, so no state is shared across tasks.
//!
//! ```text
//! ButtonWatcher ─┐
//! ButtonWatcher ─┼─ EventClient ──► mpsc ──► SessionActor ─► SessionOrchestrator
//! ctrl_c ────────┘                                        └► LifecycleController
//! ```

pub mod actor;
pub mod client;
pub mod error;
pub mod message;

pub use actor::*;
pub use client::*;
pub use error::*;
pub use message::*;
