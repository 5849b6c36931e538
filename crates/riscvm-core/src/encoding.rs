/// Supported primary opcodes (bits 6..0 of the instruction word).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Opcode {
    /// Register-register arithmetic and logic.
    Op = 0x33,
    /// Register-immediate arithmetic and logic.
    OpImm = 0x13,
    /// Stores, including port writes.
    Store = 0x23,
    /// Loads, including port reads.
    Load = 0x03,
    /// Conditional branches.
    Branch = 0x63,
    /// Indirect jump and link.
    Jalr = 0x67,
    /// Direct jump and link.
    Jal = 0x6F,
    /// Load upper immediate.
    Lui = 0x37,
}

/// Instruction formats, which fix where the immediate bits live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Format {
    R,
    I,
    S,
    B,
    U,
    J,
}

/// Single source-of-truth opcode table.
///
/// Any 7-bit opcode not present here is unsupported by definition.
pub const OPCODE_TABLE: &[(u8, Opcode, Format)] = &[
    (0x03, Opcode::Load, Format::I),
    (0x13, Opcode::OpImm, Format::I),
    (0x23, Opcode::Store, Format::S),
    (0x33, Opcode::Op, Format::R),
    (0x37, Opcode::Lui, Format::U),
    (0x63, Opcode::Branch, Format::B),
    (0x67, Opcode::Jalr, Format::I),
    (0x6F, Opcode::Jal, Format::J),
];

impl Opcode {
    /// Converts a 7-bit opcode field into a supported opcode.
    #[must_use]
    pub const fn from_u7(bits: u8) -> Option<Self> {
        match bits {
            0x33 => Some(Self::Op),
            0x13 => Some(Self::OpImm),
            0x23 => Some(Self::Store),
            0x03 => Some(Self::Load),
            0x63 => Some(Self::Branch),
            0x67 => Some(Self::Jalr),
            0x6F => Some(Self::Jal),
            0x37 => Some(Self::Lui),
            _ => None,
        }
    }

    /// Raw 7-bit field value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Immediate layout used by this opcode.
    #[must_use]
    pub const fn format(self) -> Format {
        match self {
            Self::Op => Format::R,
            Self::OpImm | Self::Load | Self::Jalr => Format::I,
            Self::Store => Format::S,
            Self::Branch => Format::B,
            Self::Lui => Format::U,
            Self::Jal => Format::J,
        }
    }
}

/// Extracts the 7-bit opcode field.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn opcode_field(word: u32) -> u8 {
    (word & 0x7F) as u8
}

const fn base(opcode: Opcode, rd: u8, func3: u8, rs1: u8) -> u32 {
    ((rs1 as u32 & 0x1F) << 15)
        | ((func3 as u32 & 0x7) << 12)
        | ((rd as u32 & 0x1F) << 7)
        | opcode as u32
}

/// Assembles an R-format word.
#[must_use]
pub const fn assemble_r(opcode: Opcode, rd: u8, func3: u8, rs1: u8, rs2: u8, func7: u8) -> u32 {
    ((func7 as u32 & 0x7F) << 25) | ((rs2 as u32 & 0x1F) << 20) | base(opcode, rd, func3, rs1)
}

/// Assembles an I-format word from the low 12 bits of `imm`.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn assemble_i(opcode: Opcode, rd: u8, func3: u8, rs1: u8, imm: i32) -> u32 {
    (((imm as u32) & 0xFFF) << 20) | base(opcode, rd, func3, rs1)
}

/// Assembles an S-format word from the low 12 bits of `imm`.
#[must_use]
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub const fn assemble_s(opcode: Opcode, func3: u8, rs1: u8, rs2: u8, imm: i32) -> u32 {
    let imm = imm as u32;
    (((imm >> 5) & 0x7F) << 25)
        | ((rs2 as u32 & 0x1F) << 20)
        | base(opcode, (imm & 0x1F) as u8, func3, rs1)
}

/// Assembles a B-format word; `imm` is a byte offset with bit 0 dropped.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn assemble_b(opcode: Opcode, func3: u8, rs1: u8, rs2: u8, imm: i32) -> u32 {
    let imm = imm as u32;
    (((imm >> 12) & 1) << 31)
        | (((imm >> 5) & 0x3F) << 25)
        | ((rs2 as u32 & 0x1F) << 20)
        | (((imm >> 1) & 0xF) << 8)
        | (((imm >> 11) & 1) << 7)
        | base(opcode, 0, func3, rs1)
}

/// Assembles a U-format word from the upper 20 bits of `imm`.
#[must_use]
pub const fn assemble_u(opcode: Opcode, rd: u8, imm: u32) -> u32 {
    (imm & 0xFFFF_F000) | base(opcode, rd, 0, 0)
}

/// Assembles a J-format word; `imm` is a byte offset with bit 0 dropped.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn assemble_j(opcode: Opcode, rd: u8, imm: i32) -> u32 {
    let imm = imm as u32;
    (((imm >> 20) & 1) << 31)
        | (((imm >> 1) & 0x3FF) << 21)
        | (((imm >> 11) & 1) << 20)
        | (((imm >> 12) & 0xFF) << 12)
        | base(opcode, rd, 0, 0)
}
