//! The closed set of supported ISA variants.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::api::{SimConfig, Simulator};
use crate::driver::FuncSim;
use crate::isa::mips::{Mips32, Mips64, MipsI, MipsII, MipsIII, MipsIV};
use crate::isa::riscv::{RiscV128, RiscV32, RiscV64};
use crate::isa::Isa;

/// One of the nine supported ISA variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum IsaKind {
    /// MIPS I.
    MipsI,
    /// MIPS II.
    MipsII,
    /// MIPS III.
    MipsIII,
    /// MIPS IV.
    MipsIV,
    /// MIPS32.
    Mips32,
    /// MIPS64.
    Mips64,
    /// RV32I.
    RiscV32,
    /// RV64I.
    RiscV64,
    /// RV128I.
    RiscV128,
}

impl IsaKind {
    /// Every variant, in registry order.
    pub const ALL: [Self; 9] = [
        Self::MipsI,
        Self::MipsII,
        Self::MipsIII,
        Self::MipsIV,
        Self::Mips32,
        Self::Mips64,
        Self::RiscV32,
        Self::RiscV64,
        Self::RiscV128,
    ];

    /// Registry name, as accepted by [`IsaKind::from_str`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MipsI => MipsI::NAME,
            Self::MipsII => MipsII::NAME,
            Self::MipsIII => MipsIII::NAME,
            Self::MipsIV => MipsIV::NAME,
            Self::Mips32 => Mips32::NAME,
            Self::Mips64 => Mips64::NAME,
            Self::RiscV32 => RiscV32::NAME,
            Self::RiscV64 => RiscV64::NAME,
            Self::RiscV128 => RiscV128::NAME,
        }
    }

    /// Register width in bits.
    #[must_use]
    pub const fn xlen(self) -> u32 {
        match self {
            Self::MipsI | Self::MipsII | Self::Mips32 | Self::RiscV32 => 32,
            Self::MipsIII | Self::MipsIV | Self::Mips64 | Self::RiscV64 => 64,
            Self::RiscV128 => 128,
        }
    }

    /// True for the RISC-V family, false for MIPS.
    #[must_use]
    pub const fn is_riscv(self) -> bool {
        matches!(self, Self::RiscV32 | Self::RiscV64 | Self::RiscV128)
    }
}

impl fmt::Display for IsaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name that matches no registered variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ISA `{0}`; expected one of mips1, mips2, mips3, mips4, mips32, mips64, riscv32, riscv64, riscv128")]
pub struct UnknownIsa(pub String);

impl FromStr for IsaKind {
    type Err = UnknownIsa;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownIsa(name.to_owned()))
    }
}

/// Builds a simulator for `kind`.
#[must_use]
pub fn create_simulator(kind: IsaKind, config: SimConfig) -> Box<dyn Simulator> {
    match kind {
        IsaKind::MipsI => Box::new(FuncSim::<MipsI>::new(config)),
        IsaKind::MipsII => Box::new(FuncSim::<MipsII>::new(config)),
        IsaKind::MipsIII => Box::new(FuncSim::<MipsIII>::new(config)),
        IsaKind::MipsIV => Box::new(FuncSim::<MipsIV>::new(config)),
        IsaKind::Mips32 => Box::new(FuncSim::<Mips32>::new(config)),
        IsaKind::Mips64 => Box::new(FuncSim::<Mips64>::new(config)),
        IsaKind::RiscV32 => Box::new(FuncSim::<RiscV32>::new(config)),
        IsaKind::RiscV64 => Box::new(FuncSim::<RiscV64>::new(config)),
        IsaKind::RiscV128 => Box::new(FuncSim::<RiscV128>::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{create_simulator, IsaKind, UnknownIsa};
    use crate::api::SimConfig;

    #[rstest]
    #[case("mips1", IsaKind::MipsI)]
    #[case("mips4", IsaKind::MipsIV)]
    #[case("MIPS64", IsaKind::Mips64)]
    #[case("riscv128", IsaKind::RiscV128)]
    fn names_parse_case_insensitively(#[case] name: &str, #[case] kind: IsaKind) {
        assert_eq!(name.parse::<IsaKind>(), Ok(kind));
    }

    #[test]
    fn names_round_trip_through_display() {
        for kind in IsaKind::ALL {
            assert_eq!(kind.to_string().parse::<IsaKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(
            "sparc".parse::<IsaKind>(),
            Err(UnknownIsa("sparc".to_owned()))
        );
    }

    #[test]
    fn simulators_report_their_variant() {
        for kind in IsaKind::ALL {
            let sim = create_simulator(kind, SimConfig::default().with_ignored_syscalls(true));
            assert_eq!(sim.isa_name(), kind.name());
            assert_eq!(sim.sequence_id(), 0);
        }
        let sim = create_simulator(IsaKind::Mips64, SimConfig::default());
        assert_eq!(sim.read_register(33), Some(0));
        assert_eq!(sim.read_register(34), None);
    }
}
