use thiserror::Error;

/// Fault classes used for diagnostics aggregation and operator reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// The program image could not be loaded.
    Load,
    /// The program counter left the program memory.
    Fetch,
    /// The decoder rejected an instruction word.
    Decode,
    /// The engine rejected a function-selector combination.
    Execute,
    /// A load or store addressed bytes beyond the combined capacity.
    Memory,
    /// The heap rejected a free request.
    Heap,
    /// The host console failed or produced unusable input.
    Console,
    /// The configured step limit was reached.
    Budget,
}

/// Host I/O failure categories carried by faults.
///
/// Mirrors the subset of [`std::io::ErrorKind`] an operator can act on while
/// staying `Copy` and serializable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum IoErrorKind {
    /// The file or stream does not exist.
    NotFound,
    /// The host denied access.
    PermissionDenied,
    /// A read or write was interrupted.
    Interrupted,
    /// The stream ended in the middle of an operation.
    UnexpectedEof,
    /// The other end of a pipe went away.
    BrokenPipe,
    /// Any other host I/O failure.
    Other,
}

impl From<std::io::ErrorKind> for IoErrorKind {
    fn from(kind: std::io::ErrorKind) -> Self {
        match kind {
            std::io::ErrorKind::NotFound => Self::NotFound,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            std::io::ErrorKind::Interrupted => Self::Interrupted,
            std::io::ErrorKind::UnexpectedEof => Self::UnexpectedEof,
            std::io::ErrorKind::BrokenPipe => Self::BrokenPipe,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for IoErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NotFound => "not found",
            Self::PermissionDenied => "permission denied",
            Self::Interrupted => "interrupted",
            Self::UnexpectedEof => "unexpected end of file",
            Self::BrokenPipe => "broken pipe",
            Self::Other => "i/o error",
        };
        f.write_str(text)
    }
}

/// Image loader failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ImageLoadError {
    /// The image file could not be opened or read.
    #[error("cannot open image: {kind}")]
    Open {
        /// Host failure category.
        kind: IoErrorKind,
    },
    /// The image size differs from the memory capacity.
    #[error("image is {actual} bytes, expected exactly {expected}")]
    SizeMismatch {
        /// Required image size in bytes.
        expected: usize,
        /// Size that was supplied.
        actual: usize,
    },
}

/// Decoder failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DecodeError {
    /// The low seven bits name no supported opcode.
    #[error("unsupported opcode {opcode:#04x}")]
    UnsupportedOpcode {
        /// Raw 7-bit opcode field.
        opcode: u8,
    },
    /// A register-register word carries a func7 selector outside `0x00`/`0x20`.
    #[error("unsupported format selector func7={func7:#04x} for opcode {opcode:#04x}")]
    UnsupportedFormat {
        /// Raw 7-bit opcode field.
        opcode: u8,
        /// Raw 7-bit func7 field.
        func7: u8,
    },
}

/// Execution failures for selector combinations outside the implemented subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ExecuteError {
    /// No handler exists for this opcode/func3/func7 combination.
    #[error("unsupported function func3={func3:#x} func7={func7:#04x} for opcode {opcode:#04x}")]
    UnsupportedFunction {
        /// Raw 7-bit opcode field.
        opcode: u8,
        /// Raw 3-bit func3 field.
        func3: u8,
        /// Raw 7-bit func7 field.
        func7: u8,
    },
}

/// Heap free failures. Allocation exhaustion is not a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum HeapError {
    /// The address lies outside the bank table.
    #[error("invalid address for free operation: {addr:#x}")]
    OutOfRange {
        /// Address passed to free.
        addr: u32,
    },
    /// The bank at this address is not allocated.
    #[error("trying to free unallocated memory at {addr:#x}")]
    NotAllocated {
        /// Address passed to free.
        addr: u32,
    },
    /// The address is inside an allocation but not its first byte.
    #[error("address {addr:#x} is not the start of an allocation")]
    NotAllocationStart {
        /// Address passed to free.
        addr: u32,
    },
}

/// Host console failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ConsoleError {
    /// The underlying stream failed.
    #[error("console i/o failed: {kind}")]
    Io {
        /// Host failure category.
        kind: IoErrorKind,
    },
    /// Integer input did not start with an optionally signed decimal number.
    #[error("console input is not a valid signed integer")]
    InvalidInteger,
    /// Integer input was requested after the input stream ended.
    #[error("console input ended while reading an integer")]
    EndOfInput,
}

impl From<std::io::Error> for ConsoleError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            kind: error.kind().into(),
        }
    }
}

/// Every unrecoverable condition the emulator can raise.
///
/// None of these are guest-visible: a fault latches the engine and the host
/// reports it and exits with [`Fault::exit_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// Missing image file or size mismatch.
    #[error(transparent)]
    ImageLoad(#[from] ImageLoadError),
    /// Instruction fetch beyond the program memory.
    #[error("PC out of bounds: {pc:#x}")]
    FetchOutOfBounds {
        /// Program counter at fetch time.
        pc: u32,
    },
    /// Unsupported opcode or format selector.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Unsupported function-selector combination.
    #[error(transparent)]
    Execute(#[from] ExecuteError),
    /// Load/store beyond the combined memory and I/O window capacity.
    #[error("{width}-byte access at {addr:#x} is out of bounds")]
    MemoryBounds {
        /// Effective address.
        addr: u32,
        /// Access width in bytes.
        width: u8,
    },
    /// Invalid heap free.
    #[error(transparent)]
    Heap(#[from] HeapError),
    /// Host console failure.
    #[error(transparent)]
    Console(#[from] ConsoleError),
    /// The configured step limit was reached before a halt.
    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded {
        /// Configured limit.
        limit: u64,
    },
}

impl Fault {
    /// Returns the diagnostics class for this fault.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::ImageLoad(_) => FaultClass::Load,
            Self::FetchOutOfBounds { .. } => FaultClass::Fetch,
            Self::Decode(_) => FaultClass::Decode,
            Self::Execute(_) => FaultClass::Execute,
            Self::MemoryBounds { .. } => FaultClass::Memory,
            Self::Heap(_) => FaultClass::Heap,
            Self::Console(_) => FaultClass::Console,
            Self::StepLimitExceeded { .. } => FaultClass::Budget,
        }
    }

    /// Process exit status reported for this fault.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn exit_code(self) -> u8 {
        1
    }
}
