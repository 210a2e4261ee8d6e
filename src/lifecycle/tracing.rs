//! # Logging
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter.
//! The filter comes from `RUST_LOG` and defaults to `info`.
//!
//! Every session runs inside a `session` span carrying its id, so all lines
//! of one capture-to-print cycle can be grepped together:
//!
//! ```text
//! INFO session{id=session_5c1f...}: Session started
//! INFO session{id=session_5c1f...}: Photo saved path="/home/pi/poetry-camera/image.jpg" bytes=48213
//! INFO session{id=session_5c1f...}:describe{photo=/home/pi/poetry-camera/image.jpg}: Caption received caption=a dog running on a beach at sunset
//! INFO session{id=session_5c1f...}:compose{model=gpt-4-turbo-preview}: Poem received lines=8
//! INFO session{id=session_5c1f...}: Session completed poem=...
//! ```
//!
//! ```bash
//! # State transitions, prompts and ignored presses
//! RUST_LOG=debug poetry-camera
//! ```

use tracing_subscriber::EnvFilter;

pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
