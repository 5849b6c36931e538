/// Number of architecturally visible general-purpose registers (`x0..x31`).
pub const GENERAL_REGISTER_COUNT: usize = 32;

/// General-purpose register identifier, always in `0..32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Register(u8);

impl Register {
    /// Hard-wired zero register.
    pub const ZERO: Self = Self(0);
    /// Conventional return-address register.
    pub const RA: Self = Self(1);
    /// Receives the result of a heap-allocate port write.
    pub const ALLOC_RESULT: Self = Self(28);

    /// Creates a register identifier, rejecting indices above 31.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < GENERAL_REGISTER_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Decodes a 5-bit register field, ignoring any higher bits.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_u5(bits: u32) -> Self {
        Self((bits & 0x1F) as u8)
    }

    /// Returns the array index for this register (`0..=31`).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw register number.
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Register file and program counter.
///
/// `x0` reads as zero; writes to it are discarded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    gpr: [u32; GENERAL_REGISTER_COUNT],
    pc: u32,
}

impl ArchitecturalState {
    /// Reads a general-purpose register.
    #[must_use]
    pub const fn gpr(&self, reg: Register) -> u32 {
        self.gpr[reg.index()]
    }

    /// Writes a general-purpose register.
    pub const fn set_gpr(&mut self, reg: Register, value: u32) {
        if reg.index() != 0 {
            self.gpr[reg.index()] = value;
        }
    }

    /// Reads the program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Writes the program counter.
    pub const fn set_pc(&mut self, value: u32) {
        self.pc = value;
    }

    /// Returns every register value in index order.
    #[must_use]
    pub const fn registers(&self) -> &[u32; GENERAL_REGISTER_COUNT] {
        &self.gpr
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{ArchitecturalState, Register, GENERAL_REGISTER_COUNT};

    #[test]
    fn default_state_is_all_zero() {
        let state = ArchitecturalState::default();
        assert_eq!(state.pc(), 0);
        assert!(state.registers().iter().all(|value| *value == 0));
    }

    #[test]
    fn register_zero_discards_writes() {
        let mut state = ArchitecturalState::default();
        state.set_gpr(Register::ZERO, 0xDEAD_BEEF);
        assert_eq!(state.gpr(Register::ZERO), 0);
    }

    #[test]
    fn register_constructor_rejects_out_of_range_indices() {
        assert_eq!(Register::new(31).map(Register::index), Some(31));
        assert_eq!(Register::new(32), None);
        assert_eq!(Register::from_u5(0xFF).number(), 31);
        assert_eq!(Register::ALLOC_RESULT.to_string(), "x28");
    }

    proptest! {
        #[test]
        fn nonzero_registers_hold_written_values(index in 1_u8..32, value in any::<u32>()) {
            let reg = Register::new(index).expect("index is in range");
            let mut state = ArchitecturalState::default();
            state.set_gpr(reg, value);
            prop_assert_eq!(state.gpr(reg), value);
            let others = (0..GENERAL_REGISTER_COUNT)
                .filter(|other| *other != reg.index())
                .all(|other| state.registers()[other] == 0);
            prop_assert!(others);
        }
    }
}
