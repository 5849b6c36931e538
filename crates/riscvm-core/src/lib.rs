//! Core emulator crate for the riscvm RV32 subset.

/// Guest memory, bounds policy and the reserved-port map.
pub mod memory;
pub use memory::{
    decode_port, validate_access, validate_fetch, AccessKind, Memory, Port, Width,
    ADDRESSABLE_BYTES, CONSOLE_READ_CHAR, CONSOLE_READ_SIGNED_INT, CONSOLE_WRITE_CHAR,
    CONSOLE_WRITE_SIGNED_INT, CONSOLE_WRITE_UNSIGNED_INT, DUMP_PC, HALT, HEAP_ALLOCATE, HEAP_FREE,
    INSTRUCTION_BYTES, IO_WINDOW_BYTES, MEMORY_CAPACITY, PORT_TABLE,
};

/// Bank-granular heap allocator behind the heap ports.
pub mod heap;
pub use heap::{Bank, BankTable, ALLOCATION_FAILED, BANK_COUNT, BANK_SIZE, HEAP_BASE, HEAP_END};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    CoreState, Host, RunOutcome, StepOutcome, TraceEvent, TraceSink, VmConfig,
};

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{ArchitecturalState, Register, RunState, GENERAL_REGISTER_COUNT};

/// Opcode table and instruction word assemblers.
pub mod encoding;
pub use encoding::{
    assemble_b, assemble_i, assemble_j, assemble_r, assemble_s, assemble_u, opcode_field, Format,
    Opcode, OPCODE_TABLE,
};

/// Instruction decode with field and immediate extraction.
pub mod decoder;
pub use decoder::{DecodedInstruction, Decoder};

/// Human-readable instruction rendering.
pub mod disasm;
pub use disasm::{disassemble, disassemble_image, DisassemblyRow};

/// Fault taxonomy and per-subsystem error types.
pub mod fault;
pub use fault::{
    ConsoleError, DecodeError, ExecuteError, Fault, FaultClass, HeapError, ImageLoadError,
    IoErrorKind,
};

/// Host collaborators reached through the reserved ports.
pub mod peripherals;
pub use peripherals::{Console, StdConsole};

/// Program image loading.
pub mod image;
pub use image::{load_image, Image};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{
    commit_execution, execute_instruction, run, step_one, ExecuteOutcome, ExecuteState,
    MemoryWrite,
};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
