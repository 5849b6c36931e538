//! Character console behind the reserved I/O ports.

use std::io::{self, BufRead, Write};

use crate::fault::ConsoleError;

/// Host console collaborator driven by port reads and writes.
pub trait Console {
    /// Writes one character.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Io`] when the output stream fails.
    fn write_char(&mut self, byte: u8) -> Result<(), ConsoleError>;

    /// Writes a signed decimal integer without a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Io`] when the output stream fails.
    fn write_signed(&mut self, value: i32) -> Result<(), ConsoleError>;

    /// Writes lowercase hexadecimal without prefix or trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Io`] when the output stream fails.
    fn write_unsigned_hex(&mut self, value: u32) -> Result<(), ConsoleError>;

    /// Writes a program counter as lowercase hexadecimal plus a newline.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Io`] when the output stream fails.
    fn dump_pc(&mut self, pc: u32) -> Result<(), ConsoleError>;

    /// Reads one character; `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Io`] when the input stream fails.
    fn read_char(&mut self) -> Result<Option<u8>, ConsoleError>;

    /// Reads one optionally signed decimal integer, skipping leading whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::EndOfInput`] when input ends before any
    /// non-whitespace byte, [`ConsoleError::InvalidInteger`] when the next token
    /// is not a number that fits in 32 bits, and [`ConsoleError::Io`] when the
    /// input stream fails.
    fn read_signed(&mut self) -> Result<i32, ConsoleError>;
}

/// [`Console`] over any buffered reader and writer.
///
/// Output is flushed after every write so guest output interleaves with
/// prompts read from the same terminal.
#[derive(Debug)]
pub struct StdConsole<R, W> {
    input: R,
    output: W,
}

impl StdConsole<io::StdinLock<'static>, io::Stdout> {
    /// Console bound to the process standard streams.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> StdConsole<R, W> {
    /// Wraps a reader and a writer.
    #[must_use]
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Returns the wrapped reader and writer.
    #[must_use]
    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }

    fn emit(&mut self, args: std::fmt::Arguments<'_>) -> Result<(), ConsoleError> {
        self.output.write_fmt(args)?;
        self.output.flush()?;
        Ok(())
    }

    fn peek(&mut self) -> Result<Option<u8>, ConsoleError> {
        Ok(self.input.fill_buf()?.first().copied())
    }

    fn skip_whitespace(&mut self) -> Result<Option<u8>, ConsoleError> {
        while let Some(byte) = self.peek()? {
            if !byte.is_ascii_whitespace() {
                return Ok(Some(byte));
            }
            self.input.consume(1);
        }
        Ok(None)
    }
}

impl<R: BufRead, W: Write> Console for StdConsole<R, W> {
    fn write_char(&mut self, byte: u8) -> Result<(), ConsoleError> {
        self.output.write_all(&[byte])?;
        self.output.flush()?;
        Ok(())
    }

    fn write_signed(&mut self, value: i32) -> Result<(), ConsoleError> {
        self.emit(format_args!("{value}"))
    }

    fn write_unsigned_hex(&mut self, value: u32) -> Result<(), ConsoleError> {
        self.emit(format_args!("{value:x}"))
    }

    fn dump_pc(&mut self, pc: u32) -> Result<(), ConsoleError> {
        self.emit(format_args!("{pc:x}\n"))
    }

    fn read_char(&mut self) -> Result<Option<u8>, ConsoleError> {
        let byte = self.peek()?;
        if byte.is_some() {
            self.input.consume(1);
        }
        Ok(byte)
    }

    fn read_signed(&mut self) -> Result<i32, ConsoleError> {
        let Some(first) = self.skip_whitespace()? else {
            return Err(ConsoleError::EndOfInput);
        };

        let negative = first == b'-';
        if first == b'-' || first == b'+' {
            self.input.consume(1);
        }

        let mut magnitude: i64 = 0;
        let mut digits = 0_usize;
        while let Some(byte) = self.peek()? {
            if !byte.is_ascii_digit() {
                break;
            }
            self.input.consume(1);
            digits += 1;
            magnitude = magnitude
                .checked_mul(10)
                .and_then(|value| value.checked_add(i64::from(byte - b'0')))
                .ok_or(ConsoleError::InvalidInteger)?;
            if magnitude > i64::from(i32::MAX) + 1 {
                return Err(ConsoleError::InvalidInteger);
            }
        }

        if digits == 0 {
            return Err(ConsoleError::InvalidInteger);
        }
        let value = if negative { -magnitude } else { magnitude };
        i32::try_from(value).map_err(|_| ConsoleError::InvalidInteger)
    }
}
