//! The functional simulation driver.
//!
//! [`FuncSim`] owns the program counter, the retirement sequence counter and
//! the no-op streak counter. Everything ISA-specific lives behind [`Isa`] and
//! [`Instruction`]; the driver only orders the stages and reacts to the trap
//! classification of each retired instruction.

use std::fmt;

use tracing::{debug, error, info, trace};

use crate::api::{SimConfig, Simulator, TraceSink, WriterTrace};
use crate::fetch::fetch_instr;
use crate::isa::{Instruction, Isa};
use crate::memory::{load_store, Memory};
use crate::syscall::{IgnoredSyscalls, SyscallHandler};
use crate::{Address, RegisterFile, RegisterId, SimError, Trap, Word};

/// Longest tolerated run of back-to-back no-op retirements.
pub const MAX_NOPS_IN_A_ROW: u32 = 10;

/// Functional simulator for the ISA variant `I`.
///
/// # INVARIANT
/// `sequence_id` equals the number of instructions retired since
/// construction, and `pc` only ever holds a memory entry point or the
/// next PC of the previously retired instruction.
pub struct FuncSim<I: Isa> {
    config: SimConfig,
    rf: RegisterFile<I>,
    memory: Option<Box<dyn Memory>>,
    pc: Address,
    sequence_id: u64,
    nops_in_a_row: u32,
    syscall_handler: Box<dyn SyscallHandler<I>>,
    trace: Box<dyn TraceSink>,
}

impl<I: Isa> fmt::Debug for FuncSim<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncSim")
            .field("isa", &I::NAME)
            .field("config", &self.config)
            .field("pc", &format_args!("{:#x}", self.pc))
            .field("sequence_id", &self.sequence_id)
            .field("nops_in_a_row", &self.nops_in_a_row)
            .field("memory_bound", &self.memory.is_some())
            .finish_non_exhaustive()
    }
}

impl<I: Isa> FuncSim<I> {
    /// Creates a simulator with the syscall handler `config` asks for.
    ///
    /// No memory is bound; call [`FuncSim::set_memory`] before running.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        let handler: Box<dyn SyscallHandler<I>> = if config.ignore_syscalls {
            Box::new(IgnoredSyscalls)
        } else {
            I::syscall_handler()
        };
        Self::with_syscall_handler(config, handler)
    }

    /// Creates a simulator with an explicit syscall handler.
    #[must_use]
    pub fn with_syscall_handler(config: SimConfig, handler: Box<dyn SyscallHandler<I>>) -> Self {
        Self {
            config,
            rf: RegisterFile::new(),
            memory: None,
            pc: 0,
            sequence_id: 0,
            nops_in_a_row: 0,
            syscall_handler: handler,
            trace: Box::new(WriterTrace::stdout()),
        }
    }

    /// Binds `memory`, replacing any previous binding.
    pub fn set_memory(&mut self, memory: Box<dyn Memory>) {
        self.memory = Some(memory);
    }

    /// Bound memory, if any.
    #[must_use]
    pub fn memory(&self) -> Option<&dyn Memory> {
        self.memory.as_deref()
    }

    /// Bound memory, mutably.
    pub fn memory_mut(&mut self) -> Option<&mut (dyn Memory + 'static)> {
        self.memory.as_deref_mut()
    }

    /// Unbinds and returns the memory.
    pub fn take_memory(&mut self) -> Option<Box<dyn Memory>> {
        self.memory.take()
    }

    /// Replaces the sink retired instructions are emitted to.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.trace = sink;
    }

    /// Points the PC at the memory's entry point and clears the no-op streak.
    ///
    /// The sequence counter is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MemoryNotBound`] when no memory is bound.
    pub fn init(&mut self) -> Result<(), SimError> {
        let memory = self.memory.as_deref().ok_or(SimError::MemoryNotBound)?;
        self.pc = memory.start_pc();
        self.nops_in_a_row = 0;
        debug!(isa = I::NAME, pc = self.pc, "simulator initialised");
        Ok(())
    }

    /// Retires exactly one instruction and returns it.
    ///
    /// Stages run in a fixed order: fetch, sequence numbering, operand read,
    /// execute, memory access, write-back, trap classification, PC update,
    /// then the no-op streak check.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::RunawayExecution`] when the instruction extends the
    /// no-op streak past [`MAX_NOPS_IN_A_ROW`], or the fetch and memory
    /// faults raised by the collaborators.
    pub fn step(&mut self) -> Result<I::Instr, SimError> {
        let memory = self.memory.as_deref_mut().ok_or(SimError::MemoryNotBound)?;

        let mut instr = fetch_instr::<I>(memory, self.pc)?;
        instr.set_sequence_id(self.sequence_id);
        self.sequence_id += 1;

        self.rf.read_sources(&mut instr);
        instr.execute();
        load_store(memory, &mut instr)?;
        self.rf.write_dst(&instr);
        instr.check_trap();
        self.pc = instr.next_pc();

        if instr.is_nop() {
            self.nops_in_a_row += 1;
            if self.nops_in_a_row > MAX_NOPS_IN_A_ROW {
                error!(
                    isa = I::NAME,
                    pc = self.pc,
                    nops = self.nops_in_a_row,
                    "runaway execution"
                );
                return Err(SimError::RunawayExecution {
                    pc: self.pc,
                    nops: self.nops_in_a_row,
                });
            }
        } else {
            self.nops_in_a_row = 0;
        }

        trace!(isa = I::NAME, "{instr}");
        Ok(instr)
    }

    /// Runs from the entry point for at most `max_instructions` retirements.
    ///
    /// Returns [`Trap::Halt`] when a halting instruction retires and
    /// [`Trap::NoTrap`] when the cap is reached. System calls are serviced
    /// in line; other trap kinds do not alter control flow.
    ///
    /// # Errors
    ///
    /// Propagates every error from [`FuncSim::init`], [`FuncSim::step`] and
    /// the syscall handler; each one aborts the run.
    pub fn run(&mut self, max_instructions: u64) -> Result<Trap, SimError> {
        self.init()?;

        for _ in 0..max_instructions {
            let instr = self.step()?;
            if self.config.log_enabled {
                self.trace.on_retire(&instr);
            }

            match instr.trap_type() {
                Trap::Syscall => {
                    let memory = self.memory.as_deref_mut().ok_or(SimError::MemoryNotBound)?;
                    self.syscall_handler.execute(&mut self.rf, memory)?;
                }
                Trap::Halt => {
                    info!(isa = I::NAME, retired = self.sequence_id, "halted");
                    return Ok(Trap::Halt);
                }
                _ => {}
            }
        }

        info!(
            isa = I::NAME,
            retired = self.sequence_id,
            "instruction limit reached"
        );
        Ok(Trap::NoTrap)
    }

    /// Address of the next instruction to fetch.
    #[must_use]
    pub const fn pc(&self) -> Address {
        self.pc
    }

    /// Sequence id the next retired instruction will receive.
    #[must_use]
    pub const fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    /// Length of the current no-op streak.
    #[must_use]
    pub const fn nops_in_a_row(&self) -> u32 {
        self.nops_in_a_row
    }

    /// Register file.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile<I> {
        &self.rf
    }

    /// Register file, mutably, e.g. to seed a stack pointer before running.
    pub fn registers_mut(&mut self) -> &mut RegisterFile<I> {
        &mut self.rf
    }

    /// Configuration fixed at construction.
    #[must_use]
    pub const fn config(&self) -> SimConfig {
        self.config
    }
}

impl<I: Isa> Simulator for FuncSim<I> {
    fn isa_name(&self) -> &'static str {
        I::NAME
    }

    fn set_memory(&mut self, memory: Box<dyn Memory>) {
        Self::set_memory(self, memory);
    }

    fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        Self::set_trace_sink(self, sink);
    }

    fn init(&mut self) -> Result<(), SimError> {
        Self::init(self)
    }

    fn run(&mut self, max_instructions: u64) -> Result<Trap, SimError> {
        Self::run(self, max_instructions)
    }

    fn pc(&self) -> Address {
        self.pc
    }

    fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    fn dump_registers(&self) -> String {
        self.rf.dump()
    }

    fn read_register(&self, index: u8) -> Option<u128> {
        (usize::from(index) < I::REGISTER_COUNT)
            .then(|| self.rf.read(RegisterId::new(index)).to_u128())
    }
}
