use std::fmt;

/// Trap classification of a retired instruction.
///
/// A trap is recognized only after the instruction has otherwise completed
/// its effects. The driver acts on [`Trap::Syscall`] and [`Trap::Halt`];
/// every other kind is reported but does not alter control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Trap {
    /// Instruction retired normally.
    #[default]
    NoTrap,
    /// System-call request (`syscall`, `ecall`).
    Syscall,
    /// Program asked to stop (jump to address zero).
    Halt,
    /// Breakpoint instruction (`break`, `ebreak`).
    Breakpoint,
    /// Conditional trap instruction whose condition held.
    ExplicitTrap,
    /// Signed arithmetic overflow on a trapping add/subtract.
    IntegerOverflow,
    /// Load from an address not aligned to its width.
    UnalignedLoad,
    /// Store to an address not aligned to its width.
    UnalignedStore,
    /// Branch or jump to an address off the 4-byte instruction grid.
    MisalignedFetch,
}

impl Trap {
    /// Returns true for every classification except [`Trap::NoTrap`].
    #[must_use]
    pub const fn is_trap(self) -> bool {
        !matches!(self, Self::NoTrap)
    }

    /// Short lowercase name used in instruction traces.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoTrap => "none",
            Self::Syscall => "syscall",
            Self::Halt => "halt",
            Self::Breakpoint => "breakpoint",
            Self::ExplicitTrap => "explicit trap",
            Self::IntegerOverflow => "overflow",
            Self::UnalignedLoad => "unaligned load",
            Self::UnalignedStore => "unaligned store",
            Self::MisalignedFetch => "misaligned fetch",
        }
    }
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::Trap;

    #[test]
    fn default_is_no_trap() {
        assert_eq!(Trap::default(), Trap::NoTrap);
        assert!(!Trap::NoTrap.is_trap());
    }

    #[test]
    fn every_other_kind_is_a_trap() {
        for trap in [
            Trap::Syscall,
            Trap::Halt,
            Trap::Breakpoint,
            Trap::ExplicitTrap,
            Trap::IntegerOverflow,
            Trap::UnalignedLoad,
            Trap::UnalignedStore,
            Trap::MisalignedFetch,
        ] {
            assert!(trap.is_trap(), "{trap} should classify as a trap");
        }
    }
}
