//! Byte-addressed guest memory and the fixed address map around it.

/// Fetch and data-access bounds policy.
pub mod access;
/// Fixed address map and reserved-port decoder.
pub mod map;

pub use access::{validate_access, validate_fetch, Width, INSTRUCTION_BYTES};
pub use map::{
    decode_port, AccessKind, Port, ADDRESSABLE_BYTES, CONSOLE_READ_CHAR, CONSOLE_READ_SIGNED_INT,
    CONSOLE_WRITE_CHAR, CONSOLE_WRITE_SIGNED_INT, CONSOLE_WRITE_UNSIGNED_INT, DUMP_PC, HALT,
    HEAP_ALLOCATE, HEAP_FREE, IO_WINDOW_BYTES, MEMORY_CAPACITY, PORT_TABLE,
};

use crate::Fault;

/// Little-endian guest memory covering program memory plus the I/O window.
///
/// Bytes in the I/O window that are not claimed by a port behave as ordinary
/// storage.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Memory {
    bytes: Box<[u8]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    /// Allocates zeroed memory of [`ADDRESSABLE_BYTES`] bytes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: vec![0; ADDRESSABLE_BYTES].into_boxed_slice(),
        }
    }

    /// Allocates memory whose first [`MEMORY_CAPACITY`] bytes are `image`.
    #[must_use]
    pub fn with_image(image: &[u8; MEMORY_CAPACITY]) -> Self {
        let mut memory = Self::new();
        memory.bytes[..MEMORY_CAPACITY].copy_from_slice(image);
        memory
    }

    /// Fetches the little-endian instruction word at `pc`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::FetchOutOfBounds`] when the word leaves program memory.
    pub fn fetch(&self, pc: u32) -> Result<u32, Fault> {
        let start = validate_fetch(pc)?;
        let mut word = [0; 4];
        word.copy_from_slice(&self.bytes[start..start + 4]);
        Ok(u32::from_le_bytes(word))
    }

    /// Reads a zero-extended little-endian value of `width` at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MemoryBounds`] when the access leaves the window.
    pub fn read(&self, addr: u32, width: Width) -> Result<u32, Fault> {
        let start = validate_access(addr, width)?;
        let value = self.bytes[start..start + usize::from(width.bytes())]
            .iter()
            .rev()
            .fold(0_u32, |acc, byte| (acc << 8) | u32::from(*byte));
        Ok(value)
    }

    /// Writes the low `width` bytes of `value` little-endian at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MemoryBounds`] when the access leaves the window.
    pub fn write(&mut self, addr: u32, width: Width, value: u32) -> Result<(), Fault> {
        let start = validate_access(addr, width)?;
        let len = usize::from(width.bytes());
        self.bytes[start..start + len].copy_from_slice(&value.to_le_bytes()[..len]);
        Ok(())
    }

    /// Returns the full backing store.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
