//! Instruction-level conformance: decode/encode agreement and single-step
//! semantics for every supported operation.

#![allow(clippy::pedantic, clippy::nursery, clippy::cast_sign_loss)]

use proptest::prelude::*;
use riscvm_core::{
    assemble_b, assemble_i, assemble_r, assemble_s, assemble_u, disassemble, step_one, CoreState,
    DecodeError, Decoder, Host, Image, Opcode, Register, StdConsole, StepOutcome, VmConfig,
};
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

fn reg(index: u8) -> Register {
    Register::new(index).expect("valid register")
}

/// Loads `words` at address zero, seeds registers and executes `steps`
/// instructions.
fn execute(words: &[u32], seeds: &[(u8, u32)], steps: usize) -> CoreState {
    let image = Image::from_program(words).expect("program fits");
    let mut state = CoreState::new(&image);
    for (index, value) in seeds {
        state.arch.set_gpr(reg(*index), *value);
    }
    let mut console = StdConsole::new(&b""[..], Vec::new());
    let mut host = Host::new(&mut console);
    let config = VmConfig::default();
    for _ in 0..steps {
        let outcome = step_one(&mut state, &mut host, &config);
        assert!(
            matches!(outcome, StepOutcome::Retired { .. }),
            "unexpected outcome {outcome:?}"
        );
    }
    state
}

#[rstest]
#[case::add(0, 0x00, 5, 7, 12)]
#[case::add_wraps(0, 0x00, u32::MAX, 1, 0)]
#[case::sub(0, 0x20, 5, 7, 0xFFFF_FFFE)]
#[case::sll(1, 0x00, 1, 31, 0x8000_0000)]
#[case::sll_masks_amount(1, 0x00, 1, 33, 2)]
#[case::xor(4, 0x00, 0xF0F0, 0x0FF0, 0xFF00)]
#[case::srl(5, 0x00, 0x8000_0000, 31, 1)]
#[case::sra(5, 0x20, 0x8000_0000, 31, 0xFFFF_FFFF)]
#[case::or(6, 0x00, 0xF0, 0x0F, 0xFF)]
#[case::and(7, 0x00, 0xF0, 0x3C, 0x30)]
fn register_register_operations(
    #[case] func3: u8,
    #[case] func7: u8,
    #[case] lhs: u32,
    #[case] rhs: u32,
    #[case] expected: u32,
) {
    let word = assemble_r(Opcode::Op, 3, func3, 1, 2, func7);
    let state = execute(&[word], &[(1, lhs), (2, rhs)], 1);
    assert_eq!(state.arch.gpr(reg(3)), expected);
    assert_eq!(state.arch.pc(), 4);
}

#[rstest]
#[case::addi(0, 5, -6, 0xFFFF_FFFF)]
#[case::slti_negative(2, 0xFFFF_FFFF, 0, 1)]
#[case::slti_equal(2, 5, 5, 0)]
#[case::sltiu_against_all_ones(3, 5, -1, 1)]
#[case::xori_inverts(4, 0xFF, -1, 0xFFFF_FF00)]
#[case::ori(6, 0x100, 0x0F, 0x10F)]
#[case::andi(7, 0xFFFF, 0x7F0, 0x7F0)]
fn register_immediate_operations(
    #[case] func3: u8,
    #[case] lhs: u32,
    #[case] imm: i32,
    #[case] expected: u32,
) {
    let word = assemble_i(Opcode::OpImm, 3, func3, 1, imm);
    let state = execute(&[word], &[(1, lhs)], 1);
    assert_eq!(state.arch.gpr(reg(3)), expected);
}

#[rstest]
#[case::beq_equal(0, 7, 7, true)]
#[case::beq_unequal(0, 7, 8, false)]
#[case::bne_equal(1, 7, 7, false)]
#[case::bne_unequal(1, 7, 8, true)]
#[case::blt_signed(4, 0xFFFF_FFFF, 1, true)]
#[case::bge_signed(5, 0xFFFF_FFFF, 1, false)]
#[case::bltu_unsigned(6, 0xFFFF_FFFF, 1, false)]
#[case::bgeu_unsigned(7, 0xFFFF_FFFF, 1, true)]
fn branches_redirect_to_pc_plus_offset_when_taken(
    #[case] func3: u8,
    #[case] lhs: u32,
    #[case] rhs: u32,
    #[case] taken: bool,
) {
    let word = assemble_b(Opcode::Branch, func3, 1, 2, 16);
    let state = execute(&[word], &[(1, lhs), (2, rhs)], 1);
    assert_eq!(state.arch.pc(), if taken { 16 } else { 4 });
}

#[test]
fn lui_writes_upper_immediate_verbatim() {
    let word = assemble_u(Opcode::Lui, 9, 0x8765_4000);
    let state = execute(&[word], &[(9, 0x123)], 1);
    assert_eq!(state.arch.gpr(reg(9)), 0x8765_4000);
}

proptest! {
    #[test]
    fn decoded_fields_re_encode_to_the_original_word(word in any::<u32>()) {
        match Decoder::decode(word) {
            Ok(instr) => prop_assert_eq!(instr.encode(), word),
            Err(DecodeError::UnsupportedOpcode { opcode }) => {
                prop_assert_eq!(u32::from(opcode), word & 0x7F);
                prop_assert!(Opcode::from_u7(opcode).is_none());
            }
            Err(DecodeError::UnsupportedFormat { opcode, func7 }) => {
                prop_assert_eq!(opcode, Opcode::Op.as_u8());
                prop_assert!(func7 != 0x00 && func7 != 0x20);
            }
        }
    }

    #[test]
    fn disassembly_is_total(word in any::<u32>()) {
        let text = disassemble(word);
        prop_assert!(!text.is_empty());
        if Decoder::decode(word).is_err() {
            prop_assert!(text.starts_with(".word 0x"));
        }
    }

    #[test]
    fn writes_to_x0_are_discarded(
        func3 in prop::sample::select(vec![0_u8, 2, 3, 4, 6, 7]),
        imm in -2048_i32..2048,
        lhs in any::<u32>(),
    ) {
        let word = assemble_i(Opcode::OpImm, 0, func3, 1, imm);
        let state = execute(&[word], &[(1, lhs)], 1);
        prop_assert_eq!(state.arch.gpr(Register::ZERO), 0);
    }

    #[test]
    fn stored_word_reads_back_at_every_width(addr in 32_u32..=2044, value in any::<u32>()) {
        let program = [
            assemble_s(Opcode::Store, 2, 1, 2, 0),
            assemble_i(Opcode::Load, 3, 2, 1, 0),
            assemble_i(Opcode::Load, 4, 1, 1, 0),
            assemble_i(Opcode::Load, 5, 0, 1, 0),
            assemble_i(Opcode::Load, 7, 4, 1, 0),
        ];
        let state = execute(&program, &[(1, addr), (2, value)], program.len());

        prop_assert_eq!(state.arch.gpr(reg(3)), value);
        prop_assert_eq!(state.arch.gpr(reg(4)), i32::from(value as u16 as i16) as u32);
        prop_assert_eq!(state.arch.gpr(reg(5)), i32::from(value as u8 as i8) as u32);
        prop_assert_eq!(state.arch.gpr(reg(7)), value & 0xFF);
    }
}
