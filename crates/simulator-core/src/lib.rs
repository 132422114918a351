//! Functional instruction-set simulator core for MIPS and RISC-V variants.

/// Register word abstraction shared by every variant.
pub mod word;
pub use word::{Address, Word};

/// Error taxonomy for setup, memory, decode and runaway failures.
pub mod fault;
pub use fault::{FaultClass, MemoryFault, SimError};

/// Architectural state: register file and trap kinds.
pub mod state;
pub use state::{RegisterFile, RegisterId, Trap};

/// Memory contract, access validation and the sparse functional memory.
pub mod memory;
pub use memory::{AccessKind, FuncMemory, Memory, MemoryRequest};

/// Architecture capability set and the per-variant decoders.
pub mod isa;
pub use isa::mips::{Mips32, Mips64, MipsI, MipsII, MipsIII, MipsIV};
pub use isa::riscv::{RiscV128, RiscV32, RiscV64};
pub use isa::{ExecuteState, Instruction, Isa};

/// Emulated system-call services.
pub mod syscall;
pub use syscall::{IgnoredSyscalls, SpimSyscalls, SyscallAbi, SyscallHandler};

/// Instruction fetch from bound memory.
pub mod fetch;
pub use fetch::{fetch_instr, INSTRUCTION_BYTES};

/// The ISA-generic step/run driver.
pub mod driver;
pub use driver::{FuncSim, MAX_NOPS_IN_A_ROW};

/// Public host-facing API for embedding the simulator.
pub mod api;
pub use api::{CollectTrace, NullTrace, SimConfig, Simulator, TraceSink, WriterTrace};

/// Closed registry of supported variants.
pub mod registry;
pub use registry::{create_simulator, IsaKind, UnknownIsa};

/// ELF and flat-binary program loaders.
pub mod loader;
pub use loader::{load_elf, load_elf_file, load_flat, LoadError};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
