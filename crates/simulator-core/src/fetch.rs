//! Instruction fetch.

use crate::isa::Isa;
use crate::memory::Memory;
use crate::{Address, SimError};

/// Width of every instruction word in the supported ISAs.
pub const INSTRUCTION_BYTES: usize = 4;

/// Reads the little-endian instruction word at `pc` and decodes it for `I`.
///
/// # Errors
///
/// Returns [`SimError::Memory`] when `pc` is outside the address space and
/// [`SimError::IllegalInstruction`] when the word does not decode.
pub fn fetch_instr<I: Isa>(memory: &dyn Memory, pc: Address) -> Result<I::Instr, SimError> {
    let word = memory.read(pc, INSTRUCTION_BYTES)?;
    let raw = u32::try_from(word).map_err(|_| SimError::IllegalInstruction {
        pc,
        raw: u32::MAX,
    })?;
    I::decode(raw, pc)
}

#[cfg(test)]
mod tests {
    use super::fetch_instr;
    use crate::isa::mips::MipsI;
    use crate::isa::riscv::RiscV64;
    use crate::isa::Instruction;
    use crate::memory::FuncMemory;
    use crate::{MemoryFault, SimError};

    #[test]
    fn fetch_decodes_little_endian_words() {
        let mut memory = FuncMemory::new(32);
        // addiu $t0, $zero, 5
        memory.write_words(0x40_0000, &[0x2408_0005]).expect("fits");
        let instr = fetch_instr::<MipsI>(&memory, 0x40_0000).expect("decodes");
        assert_eq!(instr.raw(), 0x2408_0005);
        assert_eq!(instr.pc(), 0x40_0000);
    }

    #[test]
    fn fetch_surfaces_collaborator_faults() {
        let memory = FuncMemory::new(16);
        assert!(matches!(
            fetch_instr::<RiscV64>(&memory, 0xFFFE),
            Err(SimError::Memory(MemoryFault::OutOfRange { addr: 0xFFFE, size: 4 }))
        ));
        // zeroed memory is not a valid RISC-V encoding
        assert!(matches!(
            fetch_instr::<RiscV64>(&memory, 0x100),
            Err(SimError::IllegalInstruction { pc: 0x100, raw: 0 })
        ));
    }
}
