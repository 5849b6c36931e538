//! Instruction decoder for the RV32 subset.
//!
//! Every field is extracted from its fixed bit position regardless of format,
//! so a decoded instruction always re-encodes to the word it came from. The
//! immediate is assembled according to the opcode's [`Format`].

use crate::encoding::{opcode_field, Format, Opcode};
use crate::fault::DecodeError;
use crate::state::Register;

/// `func7` selector for the base register-register operations.
pub const FUNC7_BASE: u8 = 0x00;
/// `func7` selector for subtract and arithmetic shift right.
pub const FUNC7_ALT: u8 = 0x20;

/// Decoded instruction with all extracted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecodedInstruction {
    /// Supported opcode.
    pub opcode: Opcode,
    /// Destination register field (bits 11..7).
    pub rd: Register,
    /// First source register field (bits 19..15).
    pub rs1: Register,
    /// Second source register field (bits 24..20).
    pub rs2: Register,
    /// Function selector (bits 14..12).
    pub func3: u8,
    /// Function selector (bits 31..25).
    pub func7: u8,
    /// Sign-extended immediate for the opcode's format; zero for R-format.
    pub imm: i32,
}

impl DecodedInstruction {
    /// Re-encodes the raw fields into a 32-bit word.
    #[must_use]
    pub const fn encode(self) -> u32 {
        ((self.func7 as u32) << 25)
            | ((self.rs2.number() as u32) << 20)
            | ((self.rs1.number() as u32) << 15)
            | ((self.func3 as u32) << 12)
            | ((self.rd.number() as u32) << 7)
            | self.opcode.as_u8() as u32
    }

    /// Immediate reinterpreted as an unsigned 32-bit value.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn imm_u32(self) -> u32 {
        self.imm as u32
    }
}

/// Sign-extends the low `bits` bits of `value`.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

/// I-format immediate: bits 31..20, sign-extended from bit 11.
#[must_use]
pub const fn i_immediate(word: u32) -> i32 {
    sign_extend(word >> 20, 12)
}

/// S-format immediate: bits 31..25 and 11..7, sign-extended from bit 11.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn s_immediate(word: u32) -> i32 {
    (((word & 0xFE00_0000) as i32) >> 20) | ((word >> 7) & 0x1F) as i32
}

/// B-format immediate: a byte offset with an implicit zero LSB, sign-extended
/// from bit 12.
#[must_use]
pub const fn b_immediate(word: u32) -> i32 {
    let assembled = ((word >> 7) & 0x1E)
        | ((word >> 20) & 0x7E0)
        | ((word << 4) & 0x800)
        | ((word >> 19) & 0x1000);
    sign_extend(assembled, 13)
}

/// U-format immediate: the upper 20 bits in place, low 12 bits zero.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn u_immediate(word: u32) -> i32 {
    (word & 0xFFFF_F000) as i32
}

/// J-format immediate: a byte offset with an implicit zero LSB, sign-extended
/// from bit 20.
#[must_use]
pub const fn j_immediate(word: u32) -> i32 {
    let assembled = ((word >> 20) & 0x7FE)
        | ((word >> 9) & 0x800)
        | (word & 0x000F_F000)
        | ((word >> 11) & 0x0010_0000);
    sign_extend(assembled, 21)
}

/// Instruction decoder for the RV32 subset.
pub struct Decoder;

impl Decoder {
    /// Decodes a 32-bit instruction word.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnsupportedOpcode`] for opcodes outside the
    /// subset and [`DecodeError::UnsupportedFormat`] for register-register
    /// words whose `func7` is neither [`FUNC7_BASE`] nor [`FUNC7_ALT`].
    #[allow(clippy::cast_possible_truncation)]
    pub const fn decode(word: u32) -> Result<DecodedInstruction, DecodeError> {
        let raw_opcode = opcode_field(word);
        let Some(opcode) = Opcode::from_u7(raw_opcode) else {
            return Err(DecodeError::UnsupportedOpcode { opcode: raw_opcode });
        };

        let func3 = ((word >> 12) & 0x7) as u8;
        let func7 = ((word >> 25) & 0x7F) as u8;

        let imm = match opcode.format() {
            Format::R => {
                if func7 != FUNC7_BASE && func7 != FUNC7_ALT {
                    return Err(DecodeError::UnsupportedFormat {
                        opcode: raw_opcode,
                        func7,
                    });
                }
                0
            }
            Format::I => i_immediate(word),
            Format::S => s_immediate(word),
            Format::B => b_immediate(word),
            Format::U => u_immediate(word),
            Format::J => j_immediate(word),
        };

        Ok(DecodedInstruction {
            opcode,
            rd: Register::from_u5(word >> 7),
            rs1: Register::from_u5(word >> 15),
            rs2: Register::from_u5(word >> 20),
            func3,
            func7,
            imm,
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{sign_extend, Decoder, FUNC7_ALT};
    use crate::encoding::{
        assemble_b, assemble_i, assemble_j, assemble_r, assemble_s, assemble_u, Opcode,
        OPCODE_TABLE,
    };
    use crate::fault::DecodeError;
    use crate::state::Register;

    #[test]
    fn decode_addi_extracts_fields() {
        let instruction = Decoder::decode(0x00A0_0293).expect("should decode");
        assert_eq!(instruction.opcode, Opcode::OpImm);
        assert_eq!(instruction.rd, Register::new(5).expect("valid"));
        assert_eq!(instruction.rs1, Register::ZERO);
        assert_eq!(instruction.func3, 0);
        assert_eq!(instruction.imm, 10);
    }

    #[test]
    fn decode_sub_keeps_func7_and_zero_immediate() {
        let word = assemble_r(Opcode::Op, 3, 0, 1, 2, FUNC7_ALT);
        let instruction = Decoder::decode(word).expect("should decode");
        assert_eq!(instruction.func7, FUNC7_ALT);
        assert_eq!(instruction.rs2, Register::new(2).expect("valid"));
        assert_eq!(instruction.imm, 0);
    }

    #[rstest]
    #[case(0x0000_0000)]
    #[case(0x0000_007F)]
    #[case(0x0000_0017)]
    #[case(0x0000_0073)]
    fn unsupported_opcodes_fault(#[case] word: u32) {
        let opcode = u8::try_from(word & 0x7F).expect("seven bits");
        assert_eq!(
            Decoder::decode(word),
            Err(DecodeError::UnsupportedOpcode { opcode })
        );
    }

    #[test]
    fn register_register_rejects_unknown_func7() {
        let word = assemble_r(Opcode::Op, 1, 0, 2, 3, 0x01);
        assert_eq!(
            Decoder::decode(word),
            Err(DecodeError::UnsupportedFormat {
                opcode: 0x33,
                func7: 0x01
            })
        );
    }

    #[rstest]
    #[case(0x7FF, 2047)]
    #[case(0x800, -2048)]
    #[case(0xFFF, -1)]
    #[case(0x000, 0)]
    fn i_immediates_sign_extend_from_bit_eleven(#[case] field: i32, #[case] expected: i32) {
        let word = assemble_i(Opcode::OpImm, 1, 0, 1, field);
        assert_eq!(Decoder::decode(word).expect("decodes").imm, expected);
    }

    #[rstest]
    #[case(-2048)]
    #[case(-2044)]
    #[case(-1)]
    #[case(0)]
    #[case(31)]
    #[case(2047)]
    fn s_immediates_roundtrip_through_split_fields(#[case] imm: i32) {
        let word = assemble_s(Opcode::Store, 2, 1, 2, imm);
        assert_eq!(Decoder::decode(word).expect("decodes").imm, imm);
    }

    #[rstest]
    #[case(-4096)]
    #[case(-8)]
    #[case(2048)]
    #[case(4094)]
    #[case(12)]
    fn b_immediates_cover_the_full_thirteen_bit_range(#[case] imm: i32) {
        let word = assemble_b(Opcode::Branch, 0, 1, 2, imm);
        assert_eq!(Decoder::decode(word).expect("decodes").imm, imm);
    }

    #[rstest]
    #[case(-1_048_576)]
    #[case(-4)]
    #[case(2048)]
    #[case(4096)]
    #[case(1_048_574)]
    fn j_immediates_cover_the_full_twenty_one_bit_range(#[case] imm: i32) {
        let word = assemble_j(Opcode::Jal, 1, imm);
        assert_eq!(Decoder::decode(word).expect("decodes").imm, imm);
    }

    #[test]
    fn u_immediate_keeps_upper_bits_in_place() {
        let word = assemble_u(Opcode::Lui, 7, 0xFFFF_F000);
        assert_eq!(Decoder::decode(word).expect("decodes").imm, -4096);
        let word = assemble_u(Opcode::Lui, 7, 0x0000_1000);
        assert_eq!(Decoder::decode(word).expect("decodes").imm, 0x1000);
    }

    #[test]
    fn sign_extend_handles_boundary_widths() {
        assert_eq!(sign_extend(0x800, 12), -2048);
        assert_eq!(sign_extend(0x7FF, 12), 2047);
        assert_eq!(sign_extend(0xFFFF_FFFF, 32), -1);
        assert_eq!(sign_extend(0x1, 1), -1);
    }

    proptest! {
        #[test]
        fn i_immediate_matches_or_mask_rule(field in 0_u32..0x1000) {
            let word = (field << 20) | 0x13;
            let imm = Decoder::decode(word).expect("decodes").imm_u32();
            let expected = if field & 0x800 == 0 { field } else { field | 0xFFFF_F000 };
            prop_assert_eq!(imm, expected);
        }

        #[test]
        fn supported_words_reencode_exactly(upper in any::<u32>(), index in 0_usize..OPCODE_TABLE.len()) {
            let (bits, opcode, _) = OPCODE_TABLE[index];
            let mut word = (upper & !0x7F) | u32::from(bits);
            if opcode == Opcode::Op {
                word &= 0x41FF_FFFF;
            }
            let instruction = Decoder::decode(word).expect("supported word decodes");
            prop_assert_eq!(instruction.encode(), word);
        }
    }
}
