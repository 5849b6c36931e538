//! Architectural CPU state model primitives.

/// Register file and program counter storage.
pub mod registers;
/// Host-observable execution state machine.
pub mod run_state;

pub use registers::{ArchitecturalState, Register, GENERAL_REGISTER_COUNT};
pub use run_state::RunState;
