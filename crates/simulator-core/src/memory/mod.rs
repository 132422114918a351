//! Memory model contract and the sparse functional memory.

/// Access legality helpers shared by memory implementations.
pub mod access;
/// Sparse page-based memory used by the simulator and loaders.
pub mod func_memory;

pub use access::{validate_access_width, validate_range, SUPPORTED_ACCESS_WIDTHS};
pub use func_memory::{FuncMemory, PAGE_SIZE};

use crate::isa::Instruction;
use crate::{Address, MemoryFault};

/// Direction of a memory access requested by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Read from memory into the destination register.
    Load,
    /// Write a source register to memory.
    Store,
}

/// Memory access an executed instruction asks the memory stage to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryRequest {
    /// Load or store.
    pub kind: AccessKind,
    /// Effective byte address.
    pub addr: Address,
    /// Access width in bytes.
    pub size: usize,
    /// Value to store, truncated to `size` bytes. Unused for loads.
    pub value: u64,
    /// Loads only: sign-extend the loaded value instead of zero-extending.
    pub signed: bool,
}

/// Byte-addressable store seen by the simulator.
///
/// Multi-byte values are little-endian.
pub trait Memory {
    /// Program entry point.
    fn start_pc(&self) -> Address;

    /// Reads `size` bytes at `addr`.
    ///
    /// # Errors
    ///
    /// Returns a [`MemoryFault`] when the access width is unsupported or the
    /// access leaves the address space.
    fn read(&self, addr: Address, size: usize) -> Result<u64, MemoryFault>;

    /// Writes the low `size` bytes of `value` at `addr`.
    ///
    /// # Errors
    ///
    /// Returns a [`MemoryFault`] when the access width is unsupported or the
    /// access leaves the address space.
    fn write(&mut self, addr: Address, size: usize, value: u64) -> Result<(), MemoryFault>;
}

/// Performs the load or store requested by `instr`, if any.
///
/// Loaded values are handed back through [`Instruction::complete_load`].
///
/// # Errors
///
/// Propagates the [`MemoryFault`] raised by `memory`.
pub fn load_store<T: Instruction + ?Sized>(
    memory: &mut dyn Memory,
    instr: &mut T,
) -> Result<(), MemoryFault> {
    let Some(request) = instr.memory_request() else {
        return Ok(());
    };

    match request.kind {
        AccessKind::Load => {
            let value = memory.read(request.addr, request.size)?;
            instr.complete_load(value);
        }
        AccessKind::Store => memory.write(request.addr, request.size, request.value)?,
    }
    Ok(())
}
