//! System-call emulation.
//!
//! [`SpimSyscalls`] implements the SPIM/RARS console services on top of the
//! register file; [`IgnoredSyscalls`] is the variant bound when system calls
//! are administratively disabled.

use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::isa::Isa;
use crate::memory::Memory;
use crate::{RegisterFile, RegisterId, SimError, Word};

/// SPIM service: print the integer in the first argument register.
pub const PRINT_INT: u64 = 1;
/// SPIM service: print the NUL-terminated string at the first argument.
pub const PRINT_STRING: u64 = 4;
/// SPIM service: read a line holding an integer into the result register.
pub const READ_INT: u64 = 5;
/// SPIM service: read a line into the buffer at arg0 of length arg1.
pub const READ_STRING: u64 = 8;
/// SPIM service: print the low byte of the first argument.
pub const PRINT_CHAR: u64 = 11;
/// SPIM service: read one byte into the result register.
pub const READ_CHAR: u64 = 12;

/// Registers the system-call convention uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyscallAbi {
    /// Register holding the service number.
    pub service: RegisterId,
    /// Argument registers.
    pub args: [RegisterId; 2],
    /// Register receiving the service result.
    pub result: RegisterId,
}

/// Performs the side effects of a system-call trap.
pub trait SyscallHandler<I: Isa> {
    /// Services the system call described by the current register state.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnsupportedSyscall`] for unknown services, or the
    /// I/O and memory errors raised while servicing the call.
    fn execute(&mut self, rf: &mut RegisterFile<I>, memory: &mut dyn Memory)
        -> Result<(), SimError>;
}

/// Handler that ignores every system call.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoredSyscalls;

impl<I: Isa> SyscallHandler<I> for IgnoredSyscalls {
    fn execute(
        &mut self,
        _rf: &mut RegisterFile<I>,
        _memory: &mut dyn Memory,
    ) -> Result<(), SimError> {
        Ok(())
    }
}

/// SPIM-compatible console services over an injected reader and writer.
#[derive(Debug)]
pub struct SpimSyscalls<R, W> {
    input: R,
    output: W,
}

impl SpimSyscalls<io::BufReader<io::Stdin>, io::Stdout> {
    /// Services backed by the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> SpimSyscalls<R, W> {
    /// Creates services reading from `input` and writing to `output`.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Output sink, e.g. to inspect captured console output.
    pub const fn output(&self) -> &W {
        &self.output
    }

    fn read_line(&mut self) -> Result<String, SimError> {
        let mut line = String::new();
        let _ = self.input.read_line(&mut line)?;
        Ok(line)
    }

    fn print_int<V: Word>(&mut self, value: V) -> Result<(), SimError> {
        if value.is_negative() {
            write!(self.output, "-{}", V::ZERO.wrapping_sub(value).to_u128())?;
        } else {
            write!(self.output, "{}", value.to_u128())?;
        }
        Ok(())
    }

    fn print_string(&mut self, memory: &dyn Memory, mut addr: u64) -> Result<(), SimError> {
        let mut bytes = Vec::new();
        loop {
            let byte = memory.read(addr, 1)?;
            if byte == 0 {
                break;
            }
            bytes.push(byte.to_le_bytes()[0]);
            addr = addr.wrapping_add(1);
        }
        self.output.write_all(&bytes)?;
        Ok(())
    }

    fn read_string(
        &mut self,
        memory: &mut dyn Memory,
        addr: u64,
        capacity: u64,
    ) -> Result<(), SimError> {
        if capacity == 0 {
            return Ok(());
        }
        let line = self.read_line()?;
        let keep = usize::try_from(capacity - 1).unwrap_or(usize::MAX);
        let mut end = addr;
        for byte in line.bytes().take(keep) {
            memory.write(end, 1, u64::from(byte))?;
            end = end.wrapping_add(1);
        }
        memory.write(end, 1, 0)?;
        Ok(())
    }
}

impl<I: Isa, R: BufRead, W: Write> SyscallHandler<I> for SpimSyscalls<R, W> {
    fn execute(
        &mut self,
        rf: &mut RegisterFile<I>,
        memory: &mut dyn Memory,
    ) -> Result<(), SimError> {
        let abi = I::SYSCALL_ABI;
        let code = rf.read(abi.service).to_u64();
        let arg0 = rf.read(abi.args[0]);
        let arg1 = rf.read(abi.args[1]);
        debug!(isa = I::NAME, code, "servicing system call");

        match code {
            PRINT_INT => self.print_int(arg0)?,
            PRINT_STRING => self.print_string(memory, arg0.to_u64())?,
            READ_INT => {
                let line = self.read_line()?;
                let value: i64 = line.trim().parse().map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidData, "expected an integer")
                })?;
                rf.write(abi.result, I::Word::from_i64(value));
            }
            READ_STRING => self.read_string(memory, arg0.to_u64(), arg1.to_u64())?,
            PRINT_CHAR => self.output.write_all(&[arg0.to_u64().to_le_bytes()[0]])?,
            READ_CHAR => {
                let mut byte = [0_u8; 1];
                self.input.read_exact(&mut byte)?;
                rf.write(abi.result, I::Word::from_u64(u64::from(byte[0])));
            }
            _ => return Err(SimError::UnsupportedSyscall { code }),
        }
        self.output.flush()?;
        Ok(())
    }
}
