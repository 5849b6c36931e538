//! Instruction execution pipeline.
//!
//! Every step runs the same commit sequence:
//! 1. Fetch and decode the word at `PC`
//! 2. Read source operands
//! 3. Compute the result, effective address or jump target
//! 4. Service a reserved port, or read memory
//! 5. Write memory
//! 6. Write the destination register
//! 7. Advance `PC`
//!
//! Faults are precise: a faulting instruction commits no register, memory or
//! `PC` change. Console and heap side effects of a port happen during
//! execute and are not rolled back.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

mod helpers;

pub use helpers::{effective_address, store_width, LoadKind};

use crate::decoder::{DecodedInstruction, FUNC7_ALT, FUNC7_BASE};
use crate::encoding::Opcode;
use crate::fault::ExecuteError;
use crate::heap::BankTable;
use crate::memory::{
    decode_port, validate_access, AccessKind, Memory, Port, Width, INSTRUCTION_BYTES,
};
use crate::{
    ArchitecturalState, CoreState, Decoder, Fault, Host, Register, RunOutcome, RunState,
    StepOutcome, TraceEvent, VmConfig,
};

/// Outcome of executing a single instruction, before commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// Instruction completed; commit its effects.
    Retired,
    /// Instruction completed and requested a halt; commit, then stop.
    Halted,
    /// Instruction faulted; commit nothing.
    Fault {
        /// Raised fault.
        cause: Fault,
    },
}

/// A memory store waiting for commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryWrite {
    /// Effective address, already validated.
    pub addr: u32,
    /// Access width.
    pub width: Width,
    /// Value masked to `width`.
    pub value: u32,
}

/// Side effects accumulated while executing one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteState {
    /// Register write to apply.
    pub dest: Option<(Register, u32)>,
    /// Memory write to apply.
    pub memory_write: Option<MemoryWrite>,
    /// `PC` after commit.
    pub next_pc: u32,
    /// Set by a store to the halt port.
    pub halt_requested: bool,
}

impl ExecuteState {
    /// Execute state that only advances `PC` to `next_pc`.
    #[must_use]
    pub const fn new(next_pc: u32) -> Self {
        Self {
            dest: None,
            memory_write: None,
            next_pc,
            halt_requested: false,
        }
    }
}

/// Result of servicing a reserved port.
enum PortEffect {
    /// Value delivered to the load's destination register.
    Load(u32),
    /// Allocation address delivered to [`Register::ALLOC_RESULT`].
    AllocResult(u32),
    /// Halt requested.
    Halt,
    /// Side effect complete; nothing to commit.
    Done,
}

/// Executes one decoded instruction against `state`.
///
/// Register, memory and `PC` effects are returned in [`ExecuteState`] for
/// [`commit_execution`]; heap and console effects happen here.
pub fn execute_instruction(
    instr: &DecodedInstruction,
    state: &mut CoreState,
    host: &mut Host<'_>,
) -> (ExecuteOutcome, ExecuteState) {
    let pc = state.arch.pc();
    let mut exec = ExecuteState::new(pc.wrapping_add(INSTRUCTION_BYTES));

    let result = match instr.opcode {
        Opcode::Op => execute_op(instr, &state.arch, &mut exec),
        Opcode::OpImm => execute_op_imm(instr, &state.arch, &mut exec),
        Opcode::Load => execute_load(instr, state, host, &mut exec),
        Opcode::Store => execute_store(instr, state, host, &mut exec),
        Opcode::Branch => execute_branch(instr, &state.arch, &mut exec),
        Opcode::Jalr => execute_jalr(instr, &state.arch, &mut exec),
        Opcode::Jal => {
            exec.dest = Some((instr.rd, pc));
            exec.next_pc = pc.wrapping_add(instr.imm_u32());
            Ok(())
        }
        Opcode::Lui => {
            exec.dest = Some((instr.rd, instr.imm_u32()));
            Ok(())
        }
    };

    let outcome = match result {
        Err(cause) => ExecuteOutcome::Fault { cause },
        Ok(()) if exec.halt_requested => ExecuteOutcome::Halted,
        Ok(()) => ExecuteOutcome::Retired,
    };
    (outcome, exec)
}

/// Applies the side effects recorded by [`execute_instruction`].
///
/// # Errors
///
/// Returns [`Fault::MemoryBounds`] if the pending write is out of bounds; in
/// that case nothing is applied.
pub fn commit_execution(state: &mut CoreState, exec: &ExecuteState) -> Result<(), Fault> {
    if let Some(write) = exec.memory_write {
        state.memory.write(write.addr, write.width, write.value)?;
    }
    if let Some((reg, value)) = exec.dest {
        state.arch.set_gpr(reg, value);
    }
    state.arch.set_pc(exec.next_pc);
    Ok(())
}

/// Fetches, decodes, executes and commits one instruction.
///
/// A latched fault or halt returns immediately without touching state.
pub fn step_one(state: &mut CoreState, host: &mut Host<'_>, config: &VmConfig) -> StepOutcome {
    match state.run_state {
        RunState::FaultLatched(cause) => return StepOutcome::Fault { cause },
        RunState::Halted => return StepOutcome::Halted,
        RunState::Running => {}
    }

    let pc = state.arch.pc();
    if let Some(limit) = config.step_limit {
        if state.retired >= limit {
            return latch_fault(state, host, Fault::StepLimitExceeded { limit }, pc);
        }
    }

    let instruction = match fetch_and_decode(pc, &state.memory, host) {
        Ok(instr) => instr,
        Err(cause) => return latch_fault(state, host, cause, pc),
    };

    let (outcome, exec) = execute_instruction(&instruction, state, host);
    if let ExecuteOutcome::Fault { cause } = outcome {
        return latch_fault(state, host, cause, pc);
    }
    if let Err(cause) = commit_execution(state, &exec) {
        return latch_fault(state, host, cause, pc);
    }

    state.retired = state.retired.wrapping_add(1);
    host.emit(TraceEvent::InstructionRetired {
        pc,
        next_pc: exec.next_pc,
    });

    if outcome == ExecuteOutcome::Halted {
        state.run_state = RunState::Halted;
        host.emit(TraceEvent::Halted { pc });
        return StepOutcome::Halted;
    }
    StepOutcome::Retired { pc }
}

/// Steps until the machine halts or faults.
pub fn run(state: &mut CoreState, host: &mut Host<'_>, config: &VmConfig) -> RunOutcome {
    let start = state.retired;
    loop {
        let step = step_one(state, host, config);
        if !matches!(step, StepOutcome::Retired { .. }) {
            return RunOutcome {
                steps: state.retired.wrapping_sub(start),
                final_step: step,
            };
        }
    }
}

fn fetch_and_decode(
    pc: u32,
    memory: &Memory,
    host: &mut Host<'_>,
) -> Result<DecodedInstruction, Fault> {
    let raw_word = memory.fetch(pc)?;
    host.emit(TraceEvent::InstructionStart { pc, raw_word });
    Ok(Decoder::decode(raw_word)?)
}

fn latch_fault(state: &mut CoreState, host: &mut Host<'_>, cause: Fault, pc: u32) -> StepOutcome {
    state.run_state = RunState::FaultLatched(cause);
    host.emit(TraceEvent::FaultRaised { cause, pc });
    StepOutcome::Fault { cause }
}

const fn unsupported(instr: &DecodedInstruction) -> Fault {
    Fault::Execute(ExecuteError::UnsupportedFunction {
        opcode: instr.opcode.as_u8(),
        func3: instr.func3,
        func7: instr.func7,
    })
}

const fn execute_op(
    instr: &DecodedInstruction,
    arch: &ArchitecturalState,
    exec: &mut ExecuteState,
) -> Result<(), Fault> {
    let lhs = arch.gpr(instr.rs1);
    let rhs = arch.gpr(instr.rs2);
    let shamt = rhs & 0x1F;

    let value = match (instr.func3, instr.func7) {
        (0, FUNC7_BASE) => lhs.wrapping_add(rhs),
        (0, FUNC7_ALT) => lhs.wrapping_sub(rhs),
        (1, FUNC7_BASE) => lhs << shamt,
        (4, FUNC7_BASE) => lhs ^ rhs,
        (5, FUNC7_BASE) => lhs >> shamt,
        (5, FUNC7_ALT) => ((lhs as i32) >> shamt) as u32,
        (6, FUNC7_BASE) => lhs | rhs,
        (7, FUNC7_BASE) => lhs & rhs,
        _ => return Err(unsupported(instr)),
    };
    exec.dest = Some((instr.rd, value));
    Ok(())
}

fn execute_op_imm(
    instr: &DecodedInstruction,
    arch: &ArchitecturalState,
    exec: &mut ExecuteState,
) -> Result<(), Fault> {
    let lhs = arch.gpr(instr.rs1);
    let imm = instr.imm_u32();

    let value = match instr.func3 {
        0 => lhs.wrapping_add(imm),
        2 => u32::from((lhs as i32) < instr.imm),
        3 => u32::from(lhs < imm),
        4 => lhs ^ imm,
        6 => lhs | imm,
        7 => lhs & imm,
        _ => return Err(unsupported(instr)),
    };
    exec.dest = Some((instr.rd, value));
    Ok(())
}

const fn execute_branch(
    instr: &DecodedInstruction,
    arch: &ArchitecturalState,
    exec: &mut ExecuteState,
) -> Result<(), Fault> {
    let lhs = arch.gpr(instr.rs1);
    let rhs = arch.gpr(instr.rs2);

    let taken = match instr.func3 {
        0 => lhs == rhs,
        1 => lhs != rhs,
        4 => (lhs as i32) < (rhs as i32),
        5 => (lhs as i32) >= (rhs as i32),
        6 => lhs < rhs,
        7 => lhs >= rhs,
        _ => return Err(unsupported(instr)),
    };
    if taken {
        exec.next_pc = arch.pc().wrapping_add(instr.imm_u32());
    }
    Ok(())
}

const fn execute_jalr(
    instr: &DecodedInstruction,
    arch: &ArchitecturalState,
    exec: &mut ExecuteState,
) -> Result<(), Fault> {
    if instr.func3 != 0 {
        return Err(unsupported(instr));
    }
    // The link is the jump's own address; returning through it resumes one
    // instruction later.
    let target = effective_address(instr, arch) & !1;
    exec.dest = Some((instr.rd, arch.pc()));
    exec.next_pc = target.wrapping_add(INSTRUCTION_BYTES);
    Ok(())
}

fn execute_load(
    instr: &DecodedInstruction,
    state: &mut CoreState,
    host: &mut Host<'_>,
    exec: &mut ExecuteState,
) -> Result<(), Fault> {
    let addr = effective_address(instr, &state.arch);

    if let Some(port) = decode_port(addr, AccessKind::Load) {
        let pc = state.arch.pc();
        if let PortEffect::Load(value) = service_port(port, 0, pc, &mut state.heap, host)? {
            host.emit(TraceEvent::PortAccess { port, value });
            exec.dest = Some((instr.rd, value));
        }
        return Ok(());
    }

    let kind = LoadKind::from_func3(instr.func3).ok_or_else(|| unsupported(instr))?;
    let raw = state.memory.read(addr, kind.width())?;
    host.emit(TraceEvent::MemoryAccess {
        addr,
        width: kind.width().bytes(),
        value: raw,
        is_write: false,
    });
    exec.dest = Some((instr.rd, kind.extend(raw)));
    Ok(())
}

fn execute_store(
    instr: &DecodedInstruction,
    state: &mut CoreState,
    host: &mut Host<'_>,
    exec: &mut ExecuteState,
) -> Result<(), Fault> {
    let addr = effective_address(instr, &state.arch);
    let operand = state.arch.gpr(instr.rs2);

    if let Some(port) = decode_port(addr, AccessKind::Store) {
        let pc = state.arch.pc();
        let effect = service_port(port, operand, pc, &mut state.heap, host)?;
        host.emit(TraceEvent::PortAccess {
            port,
            value: operand,
        });
        match effect {
            PortEffect::AllocResult(result) => exec.dest = Some((Register::ALLOC_RESULT, result)),
            PortEffect::Halt => exec.halt_requested = true,
            PortEffect::Load(_) | PortEffect::Done => {}
        }
        return Ok(());
    }

    let width = store_width(instr.func3).ok_or_else(|| unsupported(instr))?;
    validate_access(addr, width)?;
    let value = operand & width.mask();
    host.emit(TraceEvent::MemoryAccess {
        addr,
        width: width.bytes(),
        value,
        is_write: true,
    });
    exec.memory_write = Some(MemoryWrite { addr, width, value });
    Ok(())
}

/// Performs the side effect behind `port`.
///
/// `operand` is the stored register value; it is ignored by read ports.
fn service_port(
    port: Port,
    operand: u32,
    pc: u32,
    heap: &mut BankTable,
    host: &mut Host<'_>,
) -> Result<PortEffect, Fault> {
    let effect = match port {
        Port::ConsoleWriteChar => {
            host.console().write_char(operand.to_le_bytes()[0])?;
            PortEffect::Done
        }
        Port::ConsoleWriteSignedInt => {
            host.console().write_signed(operand as i32)?;
            PortEffect::Done
        }
        Port::ConsoleWriteUnsignedInt => {
            host.console().write_unsigned_hex(operand)?;
            PortEffect::Done
        }
        Port::DumpPc => {
            host.console().dump_pc(pc)?;
            PortEffect::Done
        }
        Port::Halt => PortEffect::Halt,
        Port::ConsoleReadChar => {
            let byte = host.console().read_char()?;
            PortEffect::Load(byte.map_or(u32::MAX, u32::from))
        }
        Port::ConsoleReadSignedInt => {
            let value = host.console().read_signed()?;
            PortEffect::Load(value as u32)
        }
        Port::HeapAllocate => {
            let addr = heap.allocate(operand);
            host.emit(TraceEvent::HeapAllocated {
                size: operand,
                addr,
            });
            PortEffect::AllocResult(addr)
        }
        Port::HeapFree => {
            let banks = heap.free(operand)?;
            host.emit(TraceEvent::HeapFreed {
                addr: operand,
                banks,
            });
            PortEffect::Done
        }
    };
    Ok(effect)
}
