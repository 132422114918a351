use thiserror::Error;

use crate::Address;

/// Memory subsystem failures raised while touching simulated memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MemoryFault {
    /// Access extends past the end of the configured address space.
    #[error("{size}-byte access at {addr:#x} is outside the address space")]
    OutOfRange {
        /// First byte of the access.
        addr: Address,
        /// Width of the access in bytes.
        size: usize,
    },
    /// Access width is not one the memory model supports.
    #[error("unsupported access width of {size} bytes")]
    UnsupportedWidth {
        /// Requested width in bytes.
        size: usize,
    },
}

/// Failure classes used when reporting why a run ended abnormally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// The no-progress guard fired.
    Runaway,
    /// Simulator used before it was fully configured.
    Setup,
    /// Memory collaborator rejected an access.
    Memory,
    /// Fetch collaborator could not decode an instruction.
    Decode,
    /// System-call emulation failed.
    Syscall,
}

/// Errors that terminate a simulation session.
///
/// Traps are not errors: `Syscall`, `Halt` and the ISA-specific kinds are
/// carried on the retired instruction. Everything here aborts the run.
#[derive(Debug, Error)]
pub enum SimError {
    /// More than [`crate::MAX_NOPS_IN_A_ROW`] no-op instructions retired back to back.
    #[error("bearing lost: {nops} nops in a row, next pc {pc:#x}")]
    RunawayExecution {
        /// Program counter after the last retired no-op.
        pc: Address,
        /// Length of the no-op streak that tripped the guard.
        nops: u32,
    },
    /// `init`, `step` or `run` was called with no memory bound.
    #[error("no memory is bound to the simulator")]
    MemoryNotBound,
    /// Simulated memory rejected an access.
    #[error(transparent)]
    Memory(#[from] MemoryFault),
    /// The fetched word is not a valid instruction for the active ISA.
    #[error("illegal instruction {raw:#010x} at {pc:#x}")]
    IllegalInstruction {
        /// Address the word was fetched from.
        pc: Address,
        /// Raw instruction word.
        raw: u32,
    },
    /// The program requested a system-call service that is not emulated.
    #[error("unsupported system call {code}")]
    UnsupportedSyscall {
        /// Service number read from the ABI service register.
        code: u64,
    },
    /// Host I/O failed while emulating a system call.
    #[error("system call i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Returns the reporting class for this error.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::RunawayExecution { .. } => FaultClass::Runaway,
            Self::MemoryNotBound => FaultClass::Setup,
            Self::Memory(_) => FaultClass::Memory,
            Self::IllegalInstruction { .. } => FaultClass::Decode,
            Self::UnsupportedSyscall { .. } | Self::Io(_) => FaultClass::Syscall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FaultClass, MemoryFault, SimError};

    #[test]
    fn memory_fault_converts_into_sim_error() {
        let error: SimError = MemoryFault::OutOfRange {
            addr: 0xFFFF_FFFF,
            size: 4,
        }
        .into();
        assert_eq!(error.class(), FaultClass::Memory);
        assert_eq!(
            error.to_string(),
            "4-byte access at 0xffffffff is outside the address space"
        );
    }

    #[test]
    fn runaway_message_names_the_streak() {
        let error = SimError::RunawayExecution {
            pc: 0x2000,
            nops: 11,
        };
        assert_eq!(error.class(), FaultClass::Runaway);
        assert_eq!(
            error.to_string(),
            "bearing lost: 11 nops in a row, next pc 0x2000"
        );
    }

    #[test]
    fn class_mapping_matches_error_taxonomy() {
        assert_eq!(SimError::MemoryNotBound.class(), FaultClass::Setup);
        assert_eq!(
            SimError::IllegalInstruction { pc: 0, raw: 0 }.class(),
            FaultClass::Decode
        );
        assert_eq!(
            SimError::UnsupportedSyscall { code: 99 }.class(),
            FaultClass::Syscall
        );
    }
}
