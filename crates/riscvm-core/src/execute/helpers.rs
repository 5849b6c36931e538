//! Operand helpers shared by the execute handlers.

use crate::decoder::{sign_extend, DecodedInstruction};
use crate::memory::Width;
use crate::state::ArchitecturalState;

/// Base register plus immediate, wrapping at 32 bits.
#[must_use]
pub const fn effective_address(instr: &DecodedInstruction, arch: &ArchitecturalState) -> u32 {
    arch.gpr(instr.rs1).wrapping_add(instr.imm_u32())
}

/// Load forms selected by `func3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// Sign-extending load.
    Signed(Width),
    /// Zero-extending load.
    Unsigned(Width),
}

impl LoadKind {
    /// Maps a load `func3` to its form.
    #[must_use]
    pub const fn from_func3(func3: u8) -> Option<Self> {
        match func3 {
            0 => Some(Self::Signed(Width::Byte)),
            1 => Some(Self::Signed(Width::Half)),
            2 => Some(Self::Unsigned(Width::Word)),
            4 => Some(Self::Unsigned(Width::Byte)),
            _ => None,
        }
    }

    /// Access width.
    #[must_use]
    pub const fn width(self) -> Width {
        match self {
            Self::Signed(width) | Self::Unsigned(width) => width,
        }
    }

    /// Extends a zero-extended raw value read from memory.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn extend(self, raw: u32) -> u32 {
        match self {
            Self::Signed(width) => sign_extend(raw, width.bytes() as u32 * 8) as u32,
            Self::Unsigned(_) => raw,
        }
    }
}

/// Maps a store `func3` to its width.
#[must_use]
pub const fn store_width(func3: u8) -> Option<Width> {
    match func3 {
        0 => Some(Width::Byte),
        1 => Some(Width::Half),
        2 => Some(Width::Word),
        _ => None,
    }
}
