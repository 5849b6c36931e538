//! Bank-granular guest heap.
//!
//! Addresses handed out here are opaque handles: they live in a virtual range
//! above the I/O window and are not backed by guest memory.

use crate::fault::HeapError;

/// First address of the virtual heap range.
pub const HEAP_BASE: u32 = 0xB700;
/// Allocation granule in bytes.
pub const BANK_SIZE: u32 = 64;
/// Number of banks in the table.
pub const BANK_COUNT: usize = 128;
/// Exclusive end of the virtual heap range.
#[allow(clippy::cast_possible_truncation)]
pub const HEAP_END: u32 = HEAP_BASE + BANK_SIZE * BANK_COUNT as u32;
/// Value returned to the guest when an allocation cannot be satisfied.
pub const ALLOCATION_FAILED: u32 = 0;

/// Ownership of one bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Bank {
    /// Not part of any allocation.
    #[default]
    Free,
    /// First bank of an allocation spanning `len` banks.
    Head {
        /// Banks owned by the allocation, including this one.
        len: u32,
    },
    /// Non-first bank of an allocation.
    Tail,
}

/// Fixed table of heap banks with first-fit allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BankTable {
    banks: Box<[Bank]>,
}

impl Default for BankTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BankTable {
    /// Creates a table with every bank free.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banks: vec![Bank::Free; BANK_COUNT].into_boxed_slice(),
        }
    }

    /// Reserves the lowest run of free banks large enough for `size` bytes.
    ///
    /// Returns the run's heap address, or [`ALLOCATION_FAILED`] when `size`
    /// is zero or no run fits.
    pub fn allocate(&mut self, size: u32) -> u32 {
        let required = size.div_ceil(BANK_SIZE) as usize;
        if required == 0 || required > BANK_COUNT {
            return ALLOCATION_FAILED;
        }

        let mut run_start = 0;
        let mut run_len = 0;
        for index in 0..BANK_COUNT {
            if self.banks[index] == Bank::Free {
                if run_len == 0 {
                    run_start = index;
                }
                run_len += 1;
                if run_len == required {
                    self.claim(run_start, required);
                    return bank_address(run_start);
                }
            } else {
                run_len = 0;
            }
        }
        ALLOCATION_FAILED
    }

    /// Releases the allocation that starts at `addr`.
    ///
    /// Returns the number of banks released.
    ///
    /// # Errors
    ///
    /// Fails when `addr` is outside the heap range, names a free bank, or does
    /// not point at the first byte of an allocation.
    pub fn free(&mut self, addr: u32) -> Result<u32, HeapError> {
        if !(HEAP_BASE..HEAP_END).contains(&addr) {
            return Err(HeapError::OutOfRange { addr });
        }
        let offset = addr - HEAP_BASE;
        let index = (offset / BANK_SIZE) as usize;
        match self.banks[index] {
            Bank::Free => Err(HeapError::NotAllocated { addr }),
            Bank::Tail => Err(HeapError::NotAllocationStart { addr }),
            Bank::Head { .. } if offset % BANK_SIZE != 0 => {
                Err(HeapError::NotAllocationStart { addr })
            }
            Bank::Head { len } => {
                self.banks[index..index + len as usize].fill(Bank::Free);
                Ok(len)
            }
        }
    }

    /// Returns the state of bank `index`, if it exists.
    #[must_use]
    pub fn bank(&self, index: usize) -> Option<Bank> {
        self.banks.get(index).copied()
    }

    /// Counts banks not owned by any allocation.
    #[must_use]
    pub fn free_banks(&self) -> usize {
        self.banks.iter().filter(|bank| **bank == Bank::Free).count()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn claim(&mut self, start: usize, len: usize) {
        self.banks[start] = Bank::Head {
            len: len as u32,
        };
        self.banks[start + 1..start + len].fill(Bank::Tail);
    }
}

/// Heap address of the first byte of bank `index`.
#[allow(clippy::cast_possible_truncation)]
const fn bank_address(index: usize) -> u32 {
    HEAP_BASE + index as u32 * BANK_SIZE
}
