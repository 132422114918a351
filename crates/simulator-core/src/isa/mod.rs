//! Architecture capability set and the decoded-instruction contract.
//!
//! The driver is generic over [`Isa`]. Each variant names its register word,
//! its decoded instruction type and its register/syscall conventions; the
//! instruction carries all execute, trap and next-PC semantics.

use std::fmt;

use crate::memory::{AccessKind, MemoryRequest};
use crate::syscall::{SpimSyscalls, SyscallAbi, SyscallHandler};
use crate::{Address, RegisterId, SimError, Trap, Word};

/// Implements the bookkeeping half of [`Instruction`] for a type holding an
/// [`ExecuteState`] in its `state` field.
macro_rules! forward_execute_state {
    () => {
        fn pc(&self) -> $crate::Address {
            self.state.pc
        }

        fn raw(&self) -> u32 {
            self.state.raw
        }

        fn sequence_id(&self) -> u64 {
            self.state.sequence_id
        }

        fn set_sequence_id(&mut self, id: u64) {
            self.state.sequence_id = id;
        }

        fn sources(&self) -> [Option<$crate::RegisterId>; 2] {
            self.state.src
        }

        fn set_source_value(&mut self, slot: usize, value: Self::Word) {
            if let Some(operand) = self.state.v_src.get_mut(slot) {
                *operand = value;
            }
        }

        fn destinations(&self) -> [Option<$crate::RegisterId>; 2] {
            self.state.dst
        }

        fn destination_value(&self, slot: usize) -> Self::Word {
            self.state
                .v_dst
                .get(slot)
                .copied()
                .unwrap_or(<Self::Word as $crate::Word>::ZERO)
        }

        fn memory_request(&self) -> Option<$crate::memory::MemoryRequest> {
            self.state.memory
        }

        fn complete_load(&mut self, value: u64) {
            self.state.complete_load(value);
        }

        fn check_trap(&mut self) {
            self.state.check_trap();
        }

        fn trap_type(&self) -> $crate::Trap {
            self.state.trap
        }

        fn next_pc(&self) -> $crate::Address {
            self.state.new_pc
        }
    };
}

/// MIPS I through MIPS64.
pub mod mips;
/// RISC-V RV32I, RV64I and RV128I.
pub mod riscv;

/// Capability set describing one ISA variant.
pub trait Isa: Sized + 'static {
    /// Register word; its width is the architecture's XLEN.
    type Word: Word;
    /// Decoded instruction produced by [`Isa::decode`].
    type Instr: Instruction<Word = Self::Word>;

    /// Variant name, e.g. `mips32` or `riscv64`.
    const NAME: &'static str;
    /// Number of architectural registers in the register file.
    const REGISTER_COUNT: usize;
    /// Registers used by the system-call convention.
    const SYSCALL_ABI: SyscallAbi;

    /// Decodes one 32-bit instruction word fetched from `pc`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::IllegalInstruction`] when `raw` is not a valid
    /// encoding for this variant.
    fn decode(raw: u32, pc: Address) -> Result<Self::Instr, SimError>;

    /// ABI name of a register, used in traces and register dumps.
    fn register_name(reg: RegisterId) -> &'static str;

    /// Handler bound when system calls are emulated.
    #[must_use]
    fn syscall_handler() -> Box<dyn SyscallHandler<Self>> {
        Box::new(SpimSyscalls::stdio())
    }
}

/// Decoded instruction of some ISA, mutated stage by stage during a step.
///
/// The driver calls, in order: [`Instruction::set_sequence_id`],
/// [`Instruction::set_source_value`], [`Instruction::execute`],
/// [`Instruction::complete_load`] (loads only),
/// [`Instruction::check_trap`], then reads [`Instruction::next_pc`].
/// The [`fmt::Display`] form is the canonical trace line.
pub trait Instruction: fmt::Display + fmt::Debug {
    /// Register word of the owning ISA.
    type Word: Word;

    /// Address the instruction was fetched from.
    fn pc(&self) -> Address;

    /// Raw encoding.
    fn raw(&self) -> u32;

    /// Retirement sequence number assigned by the driver.
    fn sequence_id(&self) -> u64;

    /// Assigns the retirement sequence number.
    fn set_sequence_id(&mut self, id: u64);

    /// Source registers, by operand slot.
    fn sources(&self) -> [Option<RegisterId>; 2];

    /// Supplies the value of the source register in `slot`.
    fn set_source_value(&mut self, slot: usize, value: Self::Word);

    /// Destination registers, by result slot. Empty once the instruction trapped.
    fn destinations(&self) -> [Option<RegisterId>; 2];

    /// Value to commit to the destination register in `slot`.
    fn destination_value(&self, slot: usize) -> Self::Word;

    /// Applies the instruction's arithmetic and control semantics to its own state.
    fn execute(&mut self);

    /// Memory access the instruction needs after execute, if any.
    fn memory_request(&self) -> Option<MemoryRequest>;

    /// Receives the raw little-endian value read by a load.
    fn complete_load(&mut self, value: u64);

    /// Settles the final trap classification.
    fn check_trap(&mut self);

    /// Trap classification; meaningful after [`Instruction::check_trap`].
    fn trap_type(&self) -> Trap;

    /// Address of the next instruction in program order.
    fn next_pc(&self) -> Address;

    /// True when retiring this instruction has no architectural effect.
    fn is_nop(&self) -> bool;
}

/// Side effects an instruction accumulates between fetch and retirement.
///
/// Shared by every ISA family: the family decodes operands into it,
/// computes results into it and reports it back through [`Instruction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteState<W: Word> {
    /// Fetch address.
    pub pc: Address,
    /// Raw encoding.
    pub raw: u32,
    /// Retirement sequence number.
    pub sequence_id: u64,
    /// Source registers by operand slot.
    pub src: [Option<RegisterId>; 2],
    /// Source values read from the register file.
    pub v_src: [W; 2],
    /// Destination registers by result slot.
    pub dst: [Option<RegisterId>; 2],
    /// Computed destination values.
    pub v_dst: [W; 2],
    /// Pending memory access.
    pub memory: Option<MemoryRequest>,
    /// Next program counter.
    pub new_pc: Address,
    /// Unconditional jump; a jump to address zero classifies as [`Trap::Halt`].
    pub is_jump: bool,
    /// Trap raised during execute, not yet classified.
    pub pending_trap: Trap,
    /// Final trap classification.
    pub trap: Trap,
}

impl<W: Word> ExecuteState<W> {
    /// Creates the state for an instruction fetched at `pc`, falling through to `pc + 4`.
    #[must_use]
    pub fn new(pc: Address, raw: u32) -> Self {
        Self {
            pc,
            raw,
            sequence_id: 0,
            src: [None; 2],
            v_src: [W::ZERO; 2],
            dst: [None; 2],
            v_dst: [W::ZERO; 2],
            memory: None,
            new_pc: pc.wrapping_add(4),
            is_jump: false,
            pending_trap: Trap::NoTrap,
            trap: Trap::NoTrap,
        }
    }

    /// Address of the following instruction, truncated to the word width.
    #[must_use]
    pub fn fallthrough(&self) -> W {
        W::from_u64(self.pc.wrapping_add(4))
    }

    /// Sets the first destination value.
    pub fn set_result(&mut self, value: W) {
        self.v_dst[0] = value;
    }

    /// Drops every destination so write-back does nothing.
    pub fn suppress_writeback(&mut self) {
        self.dst = [None; 2];
    }

    /// Raises a trap: the instruction writes no register and touches no memory.
    pub fn raise(&mut self, trap: Trap) {
        self.pending_trap = trap;
        self.suppress_writeback();
        self.memory = None;
    }

    /// Redirects control flow to `target` (conditional branch taken).
    ///
    /// A target off the 4-byte instruction grid raises
    /// [`Trap::MisalignedFetch`] and the instruction falls through.
    pub fn branch_to(&mut self, target: W) {
        let target = target.to_u64();
        if target % 4 != 0 {
            self.raise(Trap::MisalignedFetch);
            return;
        }
        self.new_pc = target;
    }

    /// Unconditional jump to `target`; misaligned targets trap like
    /// [`ExecuteState::branch_to`].
    pub fn jump_to(&mut self, target: W) {
        let target = target.to_u64();
        if target % 4 != 0 {
            self.raise(Trap::MisalignedFetch);
            return;
        }
        self.is_jump = true;
        self.new_pc = target;
    }

    /// Requests a load of `size` bytes, raising [`Trap::UnalignedLoad`] when misaligned.
    pub fn request_load(&mut self, addr: W, size: usize, signed: bool) {
        let addr = addr.to_u64();
        if addr % size as u64 != 0 {
            self.raise(Trap::UnalignedLoad);
            return;
        }
        self.memory = Some(MemoryRequest {
            kind: AccessKind::Load,
            addr,
            size,
            value: 0,
            signed,
        });
    }

    /// Requests a store of the low `size` bytes of `value`, raising
    /// [`Trap::UnalignedStore`] when misaligned.
    pub fn request_store(&mut self, addr: W, size: usize, value: W) {
        let addr = addr.to_u64();
        if addr % size as u64 != 0 {
            self.raise(Trap::UnalignedStore);
            return;
        }
        self.memory = Some(MemoryRequest {
            kind: AccessKind::Store,
            addr,
            size,
            value: value.to_u64(),
            signed: false,
        });
    }

    /// Extends a loaded value into the first destination.
    #[allow(clippy::cast_possible_wrap)]
    pub fn complete_load(&mut self, value: u64) {
        let Some(request) = self.memory else {
            return;
        };
        let bits = u32::try_from(request.size * 8).unwrap_or(64);
        self.v_dst[0] = if request.signed && bits < 64 {
            let shift = 64 - bits;
            W::from_i64(((value << shift) as i64) >> shift)
        } else if request.signed {
            W::from_i64(value as i64)
        } else {
            W::from_u64(value)
        };
    }

    /// Settles the trap: a pending exception wins, then halt on a jump to zero.
    pub fn check_trap(&mut self) {
        self.trap = if self.pending_trap.is_trap() {
            self.pending_trap
        } else if self.is_jump && self.new_pc == 0 {
            Trap::Halt
        } else {
            Trap::NoTrap
        };
    }

    /// Writes the trace prefix `seq<TAB>pc: `.
    ///
    /// # Errors
    ///
    /// Propagates formatter errors.
    pub fn fmt_prefix(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{:#x}: ", self.sequence_id, self.pc)
    }

    /// Writes the trace suffix: committed registers, then the trap, if any.
    ///
    /// # Errors
    ///
    /// Propagates formatter errors.
    pub fn fmt_results(
        &self,
        f: &mut fmt::Formatter<'_>,
        register_name: fn(RegisterId) -> &'static str,
    ) -> fmt::Result {
        for (reg, value) in self.dst.iter().zip(self.v_dst.iter()) {
            if let Some(reg) = reg.filter(|reg| !reg.is_zero()) {
                write!(f, "\t [ {} = {value:#x} ]", register_name(reg))?;
            }
        }
        if self.trap.is_trap() {
            write!(f, "\t trap: {}", self.trap)?;
        }
        Ok(())
    }
}
