//! MIPS family: MIPS I, II, III, IV, MIPS32 and MIPS64.
//!
//! All six variants share one decoder and one set of semantics; the variant
//! only fixes the register width and which extensions decode. Memory is
//! little-endian and branch delay slots are not modeled, so links hold
//! `pc + 4`.

use std::fmt;

use super::{ExecuteState, Instruction, Isa};
use crate::syscall::SyscallAbi;
use crate::{Address, RegisterId, SimError, Word};

/// Encoding tables and field extraction.
pub mod decode;
mod execute;

use decode::{decode_op, Fields, Format, MipsOp};

/// The HI multiply/divide register, stored after the 32 GPRs.
pub const HI: RegisterId = RegisterId::new(32);
/// The LO multiply/divide register.
pub const LO: RegisterId = RegisterId::new(33);
/// Return address register, `$ra`.
pub const RA: RegisterId = RegisterId::new(31);
/// 32 general-purpose registers plus HI and LO.
pub const REGISTER_COUNT: usize = 34;
/// SPIM convention: service in `$v0`, arguments in `$a0`/`$a1`, result in `$v0`.
pub const SYSCALL_ABI: SyscallAbi = SyscallAbi {
    service: RegisterId::new(2),
    args: [RegisterId::new(4), RegisterId::new(5)],
    result: RegisterId::new(2),
};

const REGISTER_NAMES: [&str; REGISTER_COUNT] = [
    "$zero", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", "$t0", "$t1", "$t2", "$t3", "$t4",
    "$t5", "$t6", "$t7", "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", "$t8", "$t9",
    "$k0", "$k1", "$gp", "$sp", "$fp", "$ra", "$hi", "$lo",
];

/// ABI name of a MIPS register.
#[must_use]
pub fn register_name(reg: RegisterId) -> &'static str {
    REGISTER_NAMES.get(reg.index()).copied().unwrap_or("$?")
}

/// Architecture revision of a MIPS variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MipsVersion {
    /// MIPS I.
    I,
    /// MIPS II.
    II,
    /// MIPS III.
    III,
    /// MIPS IV.
    IV,
    /// MIPS32.
    Mips32,
    /// MIPS64.
    Mips64,
}

impl MipsVersion {
    /// Every revision, oldest first.
    pub const ALL: [Self; 6] = [
        Self::I,
        Self::II,
        Self::III,
        Self::IV,
        Self::Mips32,
        Self::Mips64,
    ];

    /// True for the revisions with 64-bit registers.
    #[must_use]
    pub const fn is_64bit(self) -> bool {
        matches!(self, Self::III | Self::IV | Self::Mips64)
    }

    /// Whether operations from `extension` decode on this revision.
    #[must_use]
    pub const fn supports(self, extension: decode::Extension) -> bool {
        use decode::Extension;
        match extension {
            Extension::Base => true,
            Extension::Traps => !matches!(self, Self::I),
            Extension::Doubleword => self.is_64bit(),
            Extension::ConditionalMove => matches!(self, Self::IV | Self::Mips32 | Self::Mips64),
            Extension::Mips32 => matches!(self, Self::Mips32 | Self::Mips64),
        }
    }
}

/// Decoded MIPS instruction for a register word `W`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipsInstr<W: Word> {
    op: MipsOp,
    fields: Fields,
    state: ExecuteState<W>,
}

impl<W: Word> MipsInstr<W> {
    /// Decodes `raw`, fetched from `pc`, as an instruction of `version`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::IllegalInstruction`] for encodings `version` does
    /// not define.
    pub fn decode(raw: u32, pc: Address, version: MipsVersion) -> Result<Self, SimError> {
        let op = decode_op(raw, version).ok_or(SimError::IllegalInstruction { pc, raw })?;
        let fields = Fields::parse(raw);
        let mut state = ExecuteState::new(pc, raw);
        (state.src, state.dst) = operands(op, fields);
        Ok(Self { op, fields, state })
    }

    /// Decoded operation.
    #[must_use]
    pub const fn op(&self) -> MipsOp {
        self.op
    }

    /// Assembly text without the trace prefix and results.
    #[must_use]
    pub fn disassembly(&self) -> String {
        let mut text = String::new();
        let _ = self.write_disasm(&mut text);
        text
    }

    fn jump_target(&self) -> Address {
        (self.state.pc.wrapping_add(4) & !0x0FFF_FFFF) | (u64::from(self.fields.target) << 2)
    }

    #[allow(clippy::cast_sign_loss)]
    fn branch_target(&self) -> Address {
        self.state
            .pc
            .wrapping_add(4)
            .wrapping_add((self.fields.simm() << 2) as u64)
    }

    fn write_disasm(&self, out: &mut impl fmt::Write) -> fmt::Result {
        if self.is_nop() {
            return out.write_str("nop");
        }
        let Fields {
            rs, rt, rd, shamt, ..
        } = self.fields;
        let (rs, rt, rd) = (register_name(rs), register_name(rt), register_name(rd));
        let m = self.op.mnemonic();
        let simm = self.fields.simm();
        let imm = self.fields.imm;
        match self.op.format() {
            Format::Shift => write!(out, "{m} {rd}, {rt}, {shamt}"),
            Format::ShiftVariable => write!(out, "{m} {rd}, {rt}, {rs}"),
            Format::Register => write!(out, "{m} {rd}, {rs}, {rt}"),
            Format::HiLo | Format::Compare => write!(out, "{m} {rs}, {rt}"),
            Format::JumpRegister | Format::MoveTo => write!(out, "{m} {rs}"),
            Format::JumpLinkRegister | Format::Count => write!(out, "{m} {rd}, {rs}"),
            Format::MoveFrom => write!(out, "{m} {rd}"),
            Format::Bare => out.write_str(m),
            Format::Jump | Format::JumpLink => {
                write!(out, "{m} {:#x}", W::from_u64(self.jump_target()))
            }
            Format::Branch => {
                write!(out, "{m} {rs}, {rt}, {:#x}", W::from_u64(self.branch_target()))
            }
            Format::BranchZero | Format::BranchZeroLink => {
                write!(out, "{m} {rs}, {:#x}", W::from_u64(self.branch_target()))
            }
            Format::Immediate => write!(out, "{m} {rt}, {rs}, {simm}"),
            Format::Logical => write!(out, "{m} {rt}, {rs}, {imm:#x}"),
            Format::Upper => write!(out, "{m} {rt}, {imm:#x}"),
            Format::Load | Format::Store => write!(out, "{m} {rt}, {simm}({rs})"),
        }
    }
}

type Operands = ([Option<RegisterId>; 2], [Option<RegisterId>; 2]);

const fn operands(op: MipsOp, f: Fields) -> Operands {
    let special = if matches!(op, MipsOp::Mfhi | MipsOp::Mthi) {
        HI
    } else {
        LO
    };
    match op.format() {
        Format::Shift => ([None, Some(f.rt)], [Some(f.rd), None]),
        Format::ShiftVariable | Format::Register => ([Some(f.rs), Some(f.rt)], [Some(f.rd), None]),
        Format::HiLo => ([Some(f.rs), Some(f.rt)], [Some(HI), Some(LO)]),
        Format::Compare | Format::Branch | Format::Store => ([Some(f.rs), Some(f.rt)], [None, None]),
        Format::JumpRegister | Format::BranchZero => ([Some(f.rs), None], [None, None]),
        Format::JumpLinkRegister | Format::Count => ([Some(f.rs), None], [Some(f.rd), None]),
        Format::MoveFrom => ([Some(special), None], [Some(f.rd), None]),
        Format::MoveTo => ([Some(f.rs), None], [Some(special), None]),
        Format::Bare | Format::Jump => ([None, None], [None, None]),
        Format::JumpLink => ([None, None], [Some(RA), None]),
        Format::BranchZeroLink => ([Some(f.rs), None], [Some(RA), None]),
        Format::Immediate | Format::Logical | Format::Load => {
            ([Some(f.rs), None], [Some(f.rt), None])
        }
        Format::Upper => ([None, None], [Some(f.rt), None]),
    }
}

impl<W: Word> Instruction for MipsInstr<W> {
    type Word = W;

    forward_execute_state!();

    fn execute(&mut self) {
        self.execute_op();
    }

    fn is_nop(&self) -> bool {
        self.state.raw == 0
    }
}

impl<W: Word> fmt::Display for MipsInstr<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.state.fmt_prefix(f)?;
        self.write_disasm(f)?;
        self.state.fmt_results(f, register_name)
    }
}

macro_rules! mips_variant {
    ($(#[$doc:meta])* $name:ident, $word:ty, $version:ident, $isa_name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name;

        impl Isa for $name {
            type Word = $word;
            type Instr = MipsInstr<$word>;

            const NAME: &'static str = $isa_name;
            const REGISTER_COUNT: usize = REGISTER_COUNT;
            const SYSCALL_ABI: SyscallAbi = SYSCALL_ABI;

            fn decode(raw: u32, pc: Address) -> Result<Self::Instr, SimError> {
                MipsInstr::decode(raw, pc, MipsVersion::$version)
            }

            fn register_name(reg: RegisterId) -> &'static str {
                register_name(reg)
            }
        }
    };
}

mips_variant!(
    /// MIPS I: 32-bit base instruction set.
    MipsI, u32, I, "mips1"
);
mips_variant!(
    /// MIPS II: adds conditional traps.
    MipsII, u32, II, "mips2"
);
mips_variant!(
    /// MIPS III: 64-bit registers and doubleword operations.
    MipsIII, u64, III, "mips3"
);
mips_variant!(
    /// MIPS IV: adds conditional moves.
    MipsIV, u64, IV, "mips4"
);
mips_variant!(
    /// MIPS32: 32-bit with `mul`, `clz` and `clo`.
    Mips32, u32, Mips32, "mips32"
);
mips_variant!(
    /// MIPS64: every extension above.
    Mips64, u64, Mips64, "mips64"
);

#[cfg(test)]
mod tests {
    use super::{MipsInstr, MipsVersion, HI, LO};
    use crate::isa::Instruction;
    use crate::memory::AccessKind;
    use crate::{RegisterId, SimError, Trap, Word};

    fn exec<W: Word>(raw: u32, version: MipsVersion, pc: u64, values: [W; 2]) -> MipsInstr<W> {
        let mut instr = MipsInstr::<W>::decode(raw, pc, version).expect("valid encoding");
        for (slot, value) in values.into_iter().enumerate() {
            instr.set_source_value(slot, value);
        }
        instr.execute();
        instr.check_trap();
        instr
    }

    #[test]
    fn addu_writes_rd() {
        // addu $t2, $t0, $t1
        let instr = exec::<u32>(0x0109_5021, MipsVersion::I, 0x1000, [5, 7]);
        assert_eq!(instr.destinations()[0], Some(RegisterId::new(10)));
        assert_eq!(instr.destination_value(0), 12);
        assert_eq!(instr.trap_type(), Trap::NoTrap);
        assert_eq!(instr.next_pc(), 0x1004);
    }

    #[test]
    fn add_overflow_traps_without_writeback() {
        // add $t2, $t0, $t1
        let instr = exec::<u32>(0x0109_5020, MipsVersion::I, 0, [0x7FFF_FFFF, 1]);
        assert_eq!(instr.trap_type(), Trap::IntegerOverflow);
        assert_eq!(instr.destinations(), [None, None]);
    }

    #[test]
    fn word_results_sign_extend_on_64_bit_variants() {
        // addiu $t0, $t0, 1
        let instr = exec::<u64>(0x2508_0001, MipsVersion::Mips64, 0, [0x7FFF_FFFF, 0]);
        assert_eq!(instr.destination_value(0), 0xFFFF_FFFF_8000_0000);

        // daddu $t2, $t0, $t1
        let instr = exec::<u64>(0x0109_502D, MipsVersion::III, 0, [0x7FFF_FFFF, 1]);
        assert_eq!(instr.destination_value(0), 0x8000_0000);
    }

    #[test]
    fn mult_and_div_fill_hi_lo() {
        // mult $t0, $t1
        let instr = exec::<u32>(0x0109_0018, MipsVersion::I, 0, [0xFFFF_FFFE, 3]);
        assert_eq!(instr.destinations(), [Some(HI), Some(LO)]);
        assert_eq!(instr.destination_value(0), 0xFFFF_FFFF);
        assert_eq!(instr.destination_value(1), 0xFFFF_FFFA);

        // div $t0, $t1
        let instr = exec::<u32>(0x0109_001A, MipsVersion::I, 0, [7, 2]);
        assert_eq!(instr.destination_value(0), 1);
        assert_eq!(instr.destination_value(1), 3);

        let instr = exec::<u32>(0x0109_001A, MipsVersion::I, 0, [7, 0]);
        assert_eq!(instr.destinations(), [None, None]);
    }

    #[test]
    fn loads_and_stores_request_memory() {
        // lw $a0, 16($sp)
        let mut instr = exec::<u32>(0x8FA4_0010, MipsVersion::I, 0, [0x7FF0, 0]);
        let request = instr.memory_request().expect("lw accesses memory");
        assert_eq!(request.kind, AccessKind::Load);
        assert_eq!((request.addr, request.size), (0x8000, 4));
        instr.complete_load(0x8000_0000);
        assert_eq!(instr.destination_value(0), 0x8000_0000);

        // sw $t0, 2($sp)
        let instr = exec::<u32>(0xAFA8_0002, MipsVersion::I, 0, [0x1000, 9]);
        assert_eq!(instr.trap_type(), Trap::UnalignedStore);
        assert!(instr.memory_request().is_none());
    }

    #[test]
    fn control_flow_uses_pc_plus_four() {
        // beq $t0, $t1, 4
        let instr = exec::<u32>(0x1109_0004, MipsVersion::I, 0x1000, [3, 3]);
        assert_eq!(instr.next_pc(), 0x1014);
        let instr = exec::<u32>(0x1109_0004, MipsVersion::I, 0x1000, [3, 4]);
        assert_eq!(instr.next_pc(), 0x1004);

        // jal 0x100
        let instr = exec::<u32>(0x0C00_0040, MipsVersion::I, 0x1000, [0, 0]);
        assert_eq!(instr.next_pc(), 0x100);
        assert_eq!(instr.destination_value(0), 0x1004);
        assert_eq!(instr.trap_type(), Trap::NoTrap);
    }

    #[test]
    fn jump_register_to_zero_halts() {
        // jr $ra
        let instr = exec::<u64>(0x03E0_0008, MipsVersion::Mips64, 0x1000, [0, 0]);
        assert_eq!(instr.trap_type(), Trap::Halt);
    }

    #[test]
    fn syscall_and_conditional_traps() {
        let instr = exec::<u32>(0x0000_000C, MipsVersion::I, 0, [0, 0]);
        assert_eq!(instr.trap_type(), Trap::Syscall);

        // teq $t0, $t1
        let instr = exec::<u32>(0x0109_0034, MipsVersion::II, 0, [1, 1]);
        assert_eq!(instr.trap_type(), Trap::ExplicitTrap);
        let instr = exec::<u32>(0x0109_0034, MipsVersion::II, 0, [1, 2]);
        assert_eq!(instr.trap_type(), Trap::NoTrap);

        assert!(matches!(
            MipsInstr::<u32>::decode(0x0109_0034, 0x40, MipsVersion::I),
            Err(SimError::IllegalInstruction {
                pc: 0x40,
                raw: 0x0109_0034
            })
        ));
    }

    #[test]
    fn only_the_zero_word_is_a_nop() {
        let nop = exec::<u32>(0, MipsVersion::I, 0, [0, 0]);
        assert!(nop.is_nop());
        // sll $zero, $zero, 1
        let shift = exec::<u32>(0x0000_0040, MipsVersion::I, 0, [0, 0]);
        assert!(!shift.is_nop());
    }

    #[test]
    fn trace_line_shows_disassembly_and_results() {
        // addiu $t0, $zero, 5
        let mut instr = exec::<u32>(0x2408_0005, MipsVersion::I, 0x1000, [0, 0]);
        instr.set_sequence_id(3);
        assert_eq!(instr.disassembly(), "addiu $t0, $zero, 5");
        assert_eq!(instr.to_string(), "3\t0x1000: addiu $t0, $zero, 5\t [ $t0 = 0x5 ]");

        let lw = exec::<u32>(0x8FA4_0010, MipsVersion::I, 0, [0, 0]);
        assert_eq!(lw.disassembly(), "lw $a0, 16($sp)");
        let nop = exec::<u32>(0, MipsVersion::I, 0, [0, 0]);
        assert_eq!(nop.disassembly(), "nop");
    }
}
