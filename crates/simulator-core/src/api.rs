//! Public host-facing API for embedding the simulator.
//!
//! [`SimConfig`] is the whole configuration surface of the driver,
//! [`TraceSink`] receives retired instructions in retirement order, and
//! [`Simulator`] is the variant-erased handle returned by
//! [`crate::create_simulator`].

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use crate::memory::Memory;
use crate::{Address, SimError, Trap};

/// Driver configuration, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SimConfig {
    /// Emits every retired instruction to the trace sink.
    pub log_enabled: bool,
    /// Binds the no-op system-call handler instead of the emulated services.
    pub ignore_syscalls: bool,
}

impl SimConfig {
    /// Returns the config with instruction tracing switched on or off.
    #[must_use]
    pub const fn with_log(mut self, log_enabled: bool) -> Self {
        self.log_enabled = log_enabled;
        self
    }

    /// Returns the config with system calls ignored or emulated.
    #[must_use]
    pub const fn with_ignored_syscalls(mut self, ignore_syscalls: bool) -> Self {
        self.ignore_syscalls = ignore_syscalls;
        self
    }
}

/// Receives each retired instruction's canonical textual form.
pub trait TraceSink {
    /// Records one retired instruction, in retirement order.
    fn on_retire(&mut self, line: &dyn fmt::Display);
}

/// Writes one trace line per retired instruction.
#[derive(Debug)]
pub struct WriterTrace<W: Write> {
    out: W,
}

impl WriterTrace<io::Stdout> {
    /// Trace sink writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> WriterTrace<W> {
    /// Creates a sink over `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TraceSink for WriterTrace<W> {
    fn on_retire(&mut self, line: &dyn fmt::Display) {
        if let Err(error) = writeln!(self.out, "{line}") {
            tracing::warn!(%error, "dropping trace line");
        }
    }
}

/// Collects trace lines in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CollectTrace {
    lines: Rc<RefCell<Vec<String>>>,
}

impl CollectTrace {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines recorded so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Number of lines recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    /// True when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }
}

impl TraceSink for CollectTrace {
    fn on_retire(&mut self, line: &dyn fmt::Display) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

/// Discards every trace line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn on_retire(&mut self, _line: &dyn fmt::Display) {}
}

/// Variant-erased simulator handle.
///
/// Implemented by every `FuncSim<I>`; lets hosts pick the ISA at runtime.
pub trait Simulator {
    /// Name of the bound ISA variant.
    fn isa_name(&self) -> &'static str;

    /// Binds memory, replacing any previous binding.
    fn set_memory(&mut self, memory: Box<dyn Memory>);

    /// Replaces the trace sink.
    fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>);

    /// Resets the PC to the memory's entry point and clears the no-op streak.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MemoryNotBound`] when no memory is bound.
    fn init(&mut self) -> Result<(), SimError>;

    /// Runs up to `max_instructions` instructions.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that aborted the run.
    fn run(&mut self, max_instructions: u64) -> Result<Trap, SimError>;

    /// Address of the next instruction to fetch.
    fn pc(&self) -> Address;

    /// Number of instructions retired so far.
    fn sequence_id(&self) -> u64;

    /// Register file rendered one register per line.
    fn dump_registers(&self) -> String;

    /// Zero-extended value of register `index`, if the variant has it.
    fn read_register(&self, index: u8) -> Option<u128>;
}

#[cfg(test)]
mod tests {
    use super::{CollectTrace, NullTrace, SimConfig, TraceSink, WriterTrace};

    #[test]
    fn default_config_emulates_syscalls_quietly() {
        let config = SimConfig::default();
        assert!(!config.log_enabled);
        assert!(!config.ignore_syscalls);
        let config = config.with_log(true).with_ignored_syscalls(true);
        assert_eq!(
            config,
            SimConfig {
                log_enabled: true,
                ignore_syscalls: true
            }
        );
    }

    #[test]
    fn writer_trace_emits_one_line_per_retirement() {
        let mut sink = WriterTrace::new(Vec::new());
        sink.on_retire(&"0\t0x1000: nop");
        sink.on_retire(&"1\t0x1004: nop");
        let text = String::from_utf8(sink.into_inner()).expect("utf-8 trace");
        assert_eq!(text, "0\t0x1000: nop\n1\t0x1004: nop\n");
    }

    #[test]
    fn collect_trace_clones_share_lines() {
        let collector = CollectTrace::new();
        let mut sink = collector.clone();
        sink.on_retire(&42);
        NullTrace.on_retire(&"ignored");
        assert_eq!(collector.lines(), vec!["42".to_owned()]);
        assert_eq!(collector.len(), 1);
        assert!(!collector.is_empty());
    }
}
