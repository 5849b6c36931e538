//! Instruction disassembly.
//!
//! Renders decoded instructions in conventional assembly syntax for traces and
//! image listings. Words that do not decode, or whose function selectors name
//! no operation, are shown as `.word 0xXXXXXXXX`.

use std::fmt;

use crate::decoder::{DecodedInstruction, Decoder, FUNC7_ALT, FUNC7_BASE};
use crate::encoding::Opcode;
use crate::memory::{INSTRUCTION_BYTES, MEMORY_CAPACITY};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address of the instruction word.
    pub addr: u32,
    /// Raw little-endian instruction word.
    pub raw_word: u32,
    /// Rendered instruction text.
    pub text: String,
    /// Whether the word is outside the supported subset.
    pub is_illegal: bool,
}

/// Returns the mnemonic for a decoded instruction.
///
/// `None` means the function selectors name no supported operation.
#[must_use]
pub const fn mnemonic(instr: &DecodedInstruction) -> Option<&'static str> {
    let name = match (instr.opcode, instr.func3, instr.func7) {
        (Opcode::Op, 0, FUNC7_BASE) => "add",
        (Opcode::Op, 0, FUNC7_ALT) => "sub",
        (Opcode::Op, 1, FUNC7_BASE) => "sll",
        (Opcode::Op, 4, FUNC7_BASE) => "xor",
        (Opcode::Op, 5, FUNC7_BASE) => "srl",
        (Opcode::Op, 5, FUNC7_ALT) => "sra",
        (Opcode::Op, 6, FUNC7_BASE) => "or",
        (Opcode::Op, 7, FUNC7_BASE) => "and",
        (Opcode::OpImm, 0, _) => "addi",
        (Opcode::OpImm, 2, _) => "slti",
        (Opcode::OpImm, 3, _) => "sltiu",
        (Opcode::OpImm, 4, _) => "xori",
        (Opcode::OpImm, 6, _) => "ori",
        (Opcode::OpImm, 7, _) => "andi",
        (Opcode::Load, 0, _) => "lb",
        (Opcode::Load, 1, _) => "lh",
        (Opcode::Load, 2, _) => "lw",
        (Opcode::Load, 4, _) => "lbu",
        (Opcode::Store, 0, _) => "sb",
        (Opcode::Store, 1, _) => "sh",
        (Opcode::Store, 2, _) => "sw",
        (Opcode::Branch, 0, _) => "beq",
        (Opcode::Branch, 1, _) => "bne",
        (Opcode::Branch, 4, _) => "blt",
        (Opcode::Branch, 5, _) => "bge",
        (Opcode::Branch, 6, _) => "bltu",
        (Opcode::Branch, 7, _) => "bgeu",
        (Opcode::Jalr, 0, _) => "jalr",
        (Opcode::Jal, _, _) => "jal",
        (Opcode::Lui, _, _) => "lui",
        _ => return None,
    };
    Some(name)
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(name) = mnemonic(self) else {
            return write!(f, ".word {:#010x}", self.encode());
        };
        let Self {
            rd, rs1, rs2, imm, ..
        } = *self;
        match self.opcode {
            Opcode::Op => write!(f, "{name} {rd}, {rs1}, {rs2}"),
            Opcode::OpImm => write!(f, "{name} {rd}, {rs1}, {imm}"),
            Opcode::Load | Opcode::Jalr => write!(f, "{name} {rd}, {imm}({rs1})"),
            Opcode::Store => write!(f, "{name} {rs2}, {imm}({rs1})"),
            Opcode::Branch => write!(f, "{name} {rs1}, {rs2}, {imm}"),
            Opcode::Jal => write!(f, "{name} {rd}, {imm}"),
            Opcode::Lui => write!(f, "{name} {rd}, {:#x}", self.imm_u32() >> 12),
        }
    }
}

/// Disassembles one raw instruction word.
#[must_use]
pub fn disassemble(raw_word: u32) -> String {
    Decoder::decode(raw_word).map_or_else(
        |_| format!(".word {raw_word:#010x}"),
        |instr| instr.to_string(),
    )
}

/// Disassembles every instruction word of a program image.
///
/// `memory` is read from address zero up to [`MEMORY_CAPACITY`] or its end,
/// whichever comes first; a trailing partial word is ignored.
#[must_use]
pub fn disassemble_image(memory: &[u8]) -> Vec<DisassemblyRow> {
    let limit = memory.len().min(MEMORY_CAPACITY);
    memory[..limit]
        .chunks_exact(INSTRUCTION_BYTES as usize)
        .zip((0_u32..).step_by(INSTRUCTION_BYTES as usize))
        .map(|(bytes, addr)| {
            let raw_word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            let decoded = Decoder::decode(raw_word).ok();
            let is_illegal = decoded.as_ref().and_then(mnemonic).is_none();
            DisassemblyRow {
                addr,
                raw_word,
                text: disassemble(raw_word),
                is_illegal,
            }
        })
        .collect()
}
