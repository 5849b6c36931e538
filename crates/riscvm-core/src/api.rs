//! Public host-facing API contracts for embedding the emulator core.

use crate::heap::BankTable;
use crate::image::Image;
use crate::memory::{Memory, Port};
use crate::peripherals::Console;
use crate::{ArchitecturalState, Fault, RunState};

/// Top-level configuration for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct VmConfig {
    /// Maximum number of retired instructions before the engine latches
    /// [`Fault::StepLimitExceeded`]. `None` runs until halt or fault.
    pub step_limit: Option<u64>,
}

/// Complete machine state: the explicit context every step operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreState {
    /// Register file and program counter.
    pub arch: ArchitecturalState,
    /// Program memory plus the I/O window.
    pub memory: Memory,
    /// Heap bank table.
    pub heap: BankTable,
    /// Current execution state.
    pub run_state: RunState,
    /// Instructions retired since creation or the last reset.
    pub retired: u64,
}

impl Default for CoreState {
    fn default() -> Self {
        Self {
            arch: ArchitecturalState::default(),
            memory: Memory::new(),
            heap: BankTable::new(),
            run_state: RunState::Running,
            retired: 0,
        }
    }
}

impl CoreState {
    /// Creates a machine with `image` loaded at address zero, ready to run.
    #[must_use]
    pub fn new(image: &Image) -> Self {
        Self {
            memory: Memory::with_image(image.as_bytes()),
            ..Self::default()
        }
    }

    /// Restores registers, PC, heap and run state to their boot values.
    ///
    /// Memory is preserved, including any bytes the program has written.
    pub fn reset(&mut self) {
        self.arch = ArchitecturalState::default();
        self.heap = BankTable::new();
        self.run_state = RunState::Running;
        self.retired = 0;
    }
}

/// Output status from one instruction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StepOutcome {
    /// Instruction retired normally.
    Retired {
        /// Program counter of the retired instruction.
        pc: u32,
    },
    /// A halt was requested; the machine is stopped.
    Halted,
    /// A fault is latched.
    Fault {
        /// Latched fault.
        cause: Fault,
    },
}

/// Aggregated outcome from running until halt or fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunOutcome {
    /// Instructions retired during this call, including a halting store.
    pub steps: u64,
    /// Last step-level status observed before returning.
    pub final_step: StepOutcome,
}

/// Deterministic trace events emitted in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TraceEvent {
    /// Instruction word fetched, before decode.
    InstructionStart {
        /// Program counter used for this fetch.
        pc: u32,
        /// Raw little-endian instruction word.
        raw_word: u32,
    },
    /// Instruction retired and its effects committed.
    InstructionRetired {
        /// Program counter of the retired instruction.
        pc: u32,
        /// Program counter of the next instruction.
        next_pc: u32,
    },
    /// Ordinary memory access.
    MemoryAccess {
        /// Effective address.
        addr: u32,
        /// Access width in bytes.
        width: u8,
        /// Value read (zero-extended, before sign extension) or written.
        value: u32,
        /// True for stores.
        is_write: bool,
    },
    /// Reserved port serviced.
    PortAccess {
        /// Port that intercepted the access.
        port: Port,
        /// Value stored to the port, or value delivered by a read port.
        value: u32,
    },
    /// Heap allocation request completed.
    HeapAllocated {
        /// Requested size in bytes.
        size: u32,
        /// Returned address, zero on failure.
        addr: u32,
    },
    /// Heap allocation released.
    HeapFreed {
        /// Address passed to free.
        addr: u32,
        /// Banks returned to the table.
        banks: u32,
    },
    /// Fault latched.
    FaultRaised {
        /// Latched fault.
        cause: Fault,
        /// Program counter of the faulting instruction.
        pc: u32,
    },
    /// Halt requested.
    Halted {
        /// Program counter of the halting store.
        pc: u32,
    },
}

/// Sink trait for deterministic trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// External collaborators available to one run.
pub struct Host<'a> {
    console: &'a mut dyn Console,
    trace: Option<&'a mut dyn TraceSink>,
}

impl<'a> Host<'a> {
    /// Host with a console and no tracing.
    #[must_use]
    pub fn new(console: &'a mut dyn Console) -> Self {
        Self {
            console,
            trace: None,
        }
    }

    /// Host with a console and a trace sink receiving every event.
    #[must_use]
    pub fn traced(console: &'a mut dyn Console, trace: &'a mut dyn TraceSink) -> Self {
        Self {
            console,
            trace: Some(trace),
        }
    }

    /// Console collaborator.
    pub fn console(&mut self) -> &mut (dyn Console + 'a) {
        &mut *self.console
    }

    /// Forwards `event` to the trace sink, if any.
    pub fn emit(&mut self, event: TraceEvent) {
        if let Some(trace) = self.trace.as_deref_mut() {
            trace.on_event(event);
        }
    }
}
