//! Host collaborators reached through the reserved ports.

/// Console trait and the stream-backed implementation.
pub mod console;

pub use console::{Console, StdConsole};
