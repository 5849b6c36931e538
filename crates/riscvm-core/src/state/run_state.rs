use crate::Fault;

/// Execution-state machine observed by hosts between steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to execute the next instruction.
    #[default]
    Running,
    /// A halt was requested; no further instructions execute.
    Halted,
    /// A fault is latched and no further progress is possible without reset.
    FaultLatched(Fault),
}

impl RunState {
    /// Returns the currently latched fault, if this state is fault-latched.
    #[must_use]
    pub const fn latched_fault(self) -> Option<Fault> {
        match self {
            Self::FaultLatched(cause) => Some(cause),
            Self::Running | Self::Halted => None,
        }
    }

    /// Returns true once no further step can make progress.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}
