//! Fixed address map: program memory, I/O window and the reserved port table.

/// Capacity in bytes of the program/data memory filled from the image.
pub const MEMORY_CAPACITY: usize = 2048;
/// Width in bytes of the I/O window directly above program memory.
pub const IO_WINDOW_BYTES: usize = 256;
/// Exclusive upper bound for any load/store byte.
pub const ADDRESSABLE_BYTES: usize = MEMORY_CAPACITY + IO_WINDOW_BYTES;

/// Store: write the low byte as a character.
pub const CONSOLE_WRITE_CHAR: u32 = 0x0800;
/// Store: write the value as a signed decimal integer.
pub const CONSOLE_WRITE_SIGNED_INT: u32 = 0x0804;
/// Store: write the value as unsigned lowercase hexadecimal.
pub const CONSOLE_WRITE_UNSIGNED_INT: u32 = 0x0808;
/// Store: halt the machine.
pub const HALT: u32 = 0x080C;
/// Load: read one character.
pub const CONSOLE_READ_CHAR: u32 = 0x0812;
/// Load: read one signed decimal integer.
pub const CONSOLE_READ_SIGNED_INT: u32 = 0x0816;
/// Store: print the current PC.
pub const DUMP_PC: u32 = 0x0820;
/// Store: allocate heap banks, size taken from the stored value.
pub const HEAP_ALLOCATE: u32 = 0x0830;
/// Store: free a heap allocation, address taken from the stored value.
pub const HEAP_FREE: u32 = 0x0834;

/// Direction of a data access, which selects the port table that applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessKind {
    /// Load instruction.
    Load,
    /// Store instruction.
    Store,
}

/// Memory-mapped ports intercepted ahead of ordinary memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Port {
    /// `CONSOLE_WRITE_CHAR`.
    ConsoleWriteChar,
    /// `CONSOLE_WRITE_SIGNED_INT`.
    ConsoleWriteSignedInt,
    /// `CONSOLE_WRITE_UNSIGNED_INT`.
    ConsoleWriteUnsignedInt,
    /// `HALT`.
    Halt,
    /// `CONSOLE_READ_CHAR`.
    ConsoleReadChar,
    /// `CONSOLE_READ_SIGNED_INT`.
    ConsoleReadSignedInt,
    /// `DUMP_PC`.
    DumpPc,
    /// `HEAP_ALLOCATE`.
    HeapAllocate,
    /// `HEAP_FREE`.
    HeapFree,
}

impl Port {
    /// Returns the fixed address of this port.
    #[must_use]
    pub const fn address(self) -> u32 {
        match self {
            Self::ConsoleWriteChar => CONSOLE_WRITE_CHAR,
            Self::ConsoleWriteSignedInt => CONSOLE_WRITE_SIGNED_INT,
            Self::ConsoleWriteUnsignedInt => CONSOLE_WRITE_UNSIGNED_INT,
            Self::Halt => HALT,
            Self::ConsoleReadChar => CONSOLE_READ_CHAR,
            Self::ConsoleReadSignedInt => CONSOLE_READ_SIGNED_INT,
            Self::DumpPc => DUMP_PC,
            Self::HeapAllocate => HEAP_ALLOCATE,
            Self::HeapFree => HEAP_FREE,
        }
    }

    /// Returns the access direction that triggers this port.
    #[must_use]
    pub const fn kind(self) -> AccessKind {
        match self {
            Self::ConsoleReadChar | Self::ConsoleReadSignedInt => AccessKind::Load,
            Self::ConsoleWriteChar
            | Self::ConsoleWriteSignedInt
            | Self::ConsoleWriteUnsignedInt
            | Self::Halt
            | Self::DumpPc
            | Self::HeapAllocate
            | Self::HeapFree => AccessKind::Store,
        }
    }
}

/// Canonical reserved-port table in ascending address order.
pub const PORT_TABLE: [Port; 9] = [
    Port::ConsoleWriteChar,
    Port::ConsoleWriteSignedInt,
    Port::ConsoleWriteUnsignedInt,
    Port::Halt,
    Port::ConsoleReadChar,
    Port::ConsoleReadSignedInt,
    Port::DumpPc,
    Port::HeapAllocate,
    Port::HeapFree,
];

const _: () = assert_port_layout();

const fn assert_port_layout() {
    let mut index = 0;
    while index < PORT_TABLE.len() {
        let addr = PORT_TABLE[index].address() as usize;
        assert!(
            addr >= MEMORY_CAPACITY && addr < ADDRESSABLE_BYTES,
            "ports must sit inside the I/O window"
        );
        if index > 0 {
            assert!(
                PORT_TABLE[index - 1].address() < PORT_TABLE[index].address(),
                "port table must be strictly ascending"
            );
        }
        index += 1;
    }
}

/// Returns the port that intercepts an access, if any.
///
/// Only ports whose direction matches `kind` intercept: a load from a write
/// port, or a store to a read port, is ordinary memory.
#[must_use]
pub const fn decode_port(addr: u32, kind: AccessKind) -> Option<Port> {
    let port = match addr {
        CONSOLE_WRITE_CHAR => Port::ConsoleWriteChar,
        CONSOLE_WRITE_SIGNED_INT => Port::ConsoleWriteSignedInt,
        CONSOLE_WRITE_UNSIGNED_INT => Port::ConsoleWriteUnsignedInt,
        HALT => Port::Halt,
        CONSOLE_READ_CHAR => Port::ConsoleReadChar,
        CONSOLE_READ_SIGNED_INT => Port::ConsoleReadSignedInt,
        DUMP_PC => Port::DumpPc,
        HEAP_ALLOCATE => Port::HeapAllocate,
        HEAP_FREE => Port::HeapFree,
        _ => return None,
    };
    if matches!(
        (port.kind(), kind),
        (AccessKind::Load, AccessKind::Load) | (AccessKind::Store, AccessKind::Store)
    ) {
        Some(port)
    } else {
        None
    }
}
