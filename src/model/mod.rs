//! Pure data structures carried through a capture session.

pub mod artifact;
pub mod session;

pub use artifact::*;
pub use session::*;
