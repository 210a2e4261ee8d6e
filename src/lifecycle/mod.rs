//! # Lifecycle
//!
//! Everything between the process and the session pipeline:
//!
//! - [`LifecycleController`]: power-off hold and interrupt handling
//! - [`Appliance`]: builds the parts from [`Config`](crate::config::Config),
//!   spawns the session actor and the button watchers, and shuts them down
//! - [`tracing`]: log setup for the binary

pub mod appliance;
pub mod controller;
pub mod error;
pub mod tracing;

pub use appliance::*;
pub use controller::*;
pub use error::*;
