//! Error types for event dispatch.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    /// The session actor has stopped and no longer accepts events.
    #[error("Session actor closed")]
    ActorClosed,
}
