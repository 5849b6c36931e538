//! Bounds policy for instruction fetch and data accesses.

use crate::memory::map::{ADDRESSABLE_BYTES, MEMORY_CAPACITY};
use crate::Fault;

/// Size in bytes of one instruction word.
pub const INSTRUCTION_BYTES: u32 = 4;

/// Data access width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Width {
    /// One byte.
    Byte,
    /// Two bytes.
    Half,
    /// Four bytes.
    Word,
}

impl Width {
    /// Number of bytes moved by an access of this width.
    #[must_use]
    pub const fn bytes(self) -> u8 {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
        }
    }

    /// Mask selecting the bytes moved by an access of this width.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Byte => 0xFF,
            Self::Half => 0xFFFF,
            Self::Word => u32::MAX,
        }
    }
}

/// Validates a data access against the combined memory and I/O window.
///
/// Reserved ports must be resolved before calling this; it only knows about
/// ordinary bytes.
///
/// # Errors
///
/// Returns [`Fault::MemoryBounds`] when any byte of the access lies at or
/// above [`ADDRESSABLE_BYTES`].
pub const fn validate_access(addr: u32, width: Width) -> Result<usize, Fault> {
    let end = addr as u64 + width.bytes() as u64;
    if end > ADDRESSABLE_BYTES as u64 {
        Err(Fault::MemoryBounds {
            addr,
            width: width.bytes(),
        })
    } else {
        Ok(addr as usize)
    }
}

/// Validates an instruction fetch against the program memory.
///
/// # Errors
///
/// Returns [`Fault::FetchOutOfBounds`] when the word at `pc` does not lie
/// entirely inside the first [`MEMORY_CAPACITY`] bytes.
pub const fn validate_fetch(pc: u32) -> Result<usize, Fault> {
    let end = pc as u64 + INSTRUCTION_BYTES as u64;
    if end > MEMORY_CAPACITY as u64 {
        Err(Fault::FetchOutOfBounds { pc })
    } else {
        Ok(pc as usize)
    }
}
