use std::fmt;
use std::fmt::Write as _;
use std::marker::PhantomData;

use crate::isa::{Instruction, Isa};
use crate::Word;

/// Architectural register index within an ISA's register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterId(u8);

impl RegisterId {
    /// Register zero, hardwired to the value 0.
    pub const ZERO: Self = Self(0);

    /// Creates a register identifier from its encoded number.
    #[must_use]
    pub const fn new(number: u8) -> Self {
        Self(number)
    }

    /// Returns the array index for this register.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns true for the hardwired zero register.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/// Register file for one ISA variant.
///
/// # INVARIANT
/// Register zero always reads as zero; writes to it are dropped.
pub struct RegisterFile<I: Isa> {
    values: Vec<I::Word>,
    _isa: PhantomData<fn() -> I>,
}

impl<I: Isa> Default for RegisterFile<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Isa> Clone for RegisterFile<I> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            _isa: PhantomData,
        }
    }
}

impl<I: Isa> fmt::Debug for RegisterFile<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterFile")
            .field("isa", &I::NAME)
            .field("values", &self.values)
            .finish()
    }
}

impl<I: Isa> RegisterFile<I> {
    /// Creates a register file with every register cleared.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: vec![I::Word::ZERO; I::REGISTER_COUNT],
            _isa: PhantomData,
        }
    }

    /// Number of architectural registers, including special ones like HI/LO.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; every ISA has at least the zero register.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reads a register. Out-of-range identifiers read as zero.
    #[must_use]
    pub fn read(&self, reg: RegisterId) -> I::Word {
        self.values
            .get(reg.index())
            .copied()
            .unwrap_or(I::Word::ZERO)
    }

    /// Writes a register. Writes to register zero or out of range are dropped.
    pub fn write(&mut self, reg: RegisterId, value: I::Word) {
        if reg.is_zero() {
            return;
        }
        if let Some(slot) = self.values.get_mut(reg.index()) {
            *slot = value;
        }
    }

    /// Populates the instruction's source operand values from current state.
    pub fn read_sources(&self, instr: &mut I::Instr) {
        for (slot, src) in instr.sources().into_iter().enumerate() {
            if let Some(reg) = src {
                instr.set_source_value(slot, self.read(reg));
            }
        }
    }

    /// Commits the instruction's destination values, if any.
    pub fn write_dst(&mut self, instr: &I::Instr) {
        for (slot, dst) in instr.destinations().into_iter().enumerate() {
            if let Some(reg) = dst {
                self.write(reg, instr.destination_value(slot));
            }
        }
    }

    /// Renders every register as `name = value`, one per line.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (number, value) in (0_u8..).zip(self.values.iter()) {
            let name = I::register_name(RegisterId::new(number));
            let _ = writeln!(out, "{name:>6} = {value:#x}");
        }
        out
    }
}
