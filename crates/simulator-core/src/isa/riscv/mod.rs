//! RISC-V family: RV32I, RV64I and RV128I.
//!
//! One decoder serves every width; XLEN comes from the register word. The
//! HINT space of the register-arithmetic opcodes (any such instruction with
//! `rd = x0`) retires as a no-op.

use std::fmt;

use super::{ExecuteState, Instruction, Isa};
use crate::syscall::SyscallAbi;
use crate::{Address, RegisterId, SimError, Word};

/// Encoding tables and immediate extraction.
pub mod decode;
mod execute;

use decode::{decode_op, opcode, Fields, Format, RvOp};

/// 32 integer registers, `x0` hardwired to zero.
pub const REGISTER_COUNT: usize = 32;
/// Service in `a7`, arguments in `a0`/`a1`, result in `a0`.
pub const SYSCALL_ABI: SyscallAbi = SyscallAbi {
    service: RegisterId::new(17),
    args: [RegisterId::new(10), RegisterId::new(11)],
    result: RegisterId::new(10),
};

const REGISTER_NAMES: [&str; REGISTER_COUNT] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// ABI name of an integer register.
#[must_use]
pub fn register_name(reg: RegisterId) -> &'static str {
    REGISTER_NAMES.get(reg.index()).copied().unwrap_or("x?")
}

/// Decoded RISC-V instruction for a register word `W`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiscVInstr<W: Word> {
    op: RvOp,
    fields: Fields,
    state: ExecuteState<W>,
}

impl<W: Word> RiscVInstr<W> {
    /// Decodes `raw`, fetched from `pc`, for an XLEN of `W::BITS`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::IllegalInstruction`] for encodings outside the base
    /// integer set of that width.
    pub fn decode(raw: u32, pc: Address) -> Result<Self, SimError> {
        let op = decode_op(raw, W::BITS).ok_or(SimError::IllegalInstruction { pc, raw })?;
        let fields = Fields::parse(raw, op.format(), W::BITS);
        let mut state = ExecuteState::new(pc, raw);
        (state.src, state.dst) = operands(op.format(), fields);
        Ok(Self { op, fields, state })
    }

    /// Decoded operation.
    #[must_use]
    pub const fn op(&self) -> RvOp {
        self.op
    }

    /// Assembly text without the trace prefix and results.
    #[must_use]
    pub fn disassembly(&self) -> String {
        let mut text = String::new();
        let _ = self.write_disasm(&mut text);
        text
    }

    #[allow(clippy::cast_sign_loss)]
    fn target(&self) -> W {
        W::from_u64(self.state.pc.wrapping_add(self.fields.imm as u64))
    }

    fn write_disasm(&self, out: &mut impl fmt::Write) -> fmt::Result {
        if self.state.raw == 0x0000_0013 {
            return out.write_str("nop");
        }
        let rd = register_name(self.fields.rd);
        let rs1 = register_name(self.fields.rs1);
        let rs2 = register_name(self.fields.rs2);
        let imm = self.fields.imm;
        let m = self.op.mnemonic();
        match self.op.format() {
            Format::Upper => write!(out, "{m} {rd}, {:#x}", (imm >> 12) & 0xF_FFFF),
            Format::Jump => write!(out, "{m} {rd}, {:#x}", self.target()),
            Format::JumpRegister | Format::Load => write!(out, "{m} {rd}, {imm}({rs1})"),
            Format::Branch => write!(out, "{m} {rs1}, {rs2}, {:#x}", self.target()),
            Format::Store => write!(out, "{m} {rs2}, {imm}({rs1})"),
            Format::Immediate | Format::Shift => write!(out, "{m} {rd}, {rs1}, {imm}"),
            Format::Register => write!(out, "{m} {rd}, {rs1}, {rs2}"),
            Format::Bare => out.write_str(m),
        }
    }
}

type Operands = ([Option<RegisterId>; 2], [Option<RegisterId>; 2]);

const fn operands(format: Format, f: Fields) -> Operands {
    match format {
        Format::Upper | Format::Jump => ([None, None], [Some(f.rd), None]),
        Format::JumpRegister | Format::Load | Format::Immediate | Format::Shift => {
            ([Some(f.rs1), None], [Some(f.rd), None])
        }
        Format::Branch | Format::Store => ([Some(f.rs1), Some(f.rs2)], [None, None]),
        Format::Register => ([Some(f.rs1), Some(f.rs2)], [Some(f.rd), None]),
        Format::Bare => ([None, None], [None, None]),
    }
}

impl<W: Word> Instruction for RiscVInstr<W> {
    type Word = W;

    forward_execute_state!();

    fn execute(&mut self) {
        self.execute_op();
    }

    fn is_nop(&self) -> bool {
        let major = self.state.raw & 0x7F;
        matches!(
            major,
            opcode::OP | opcode::OP_IMM | opcode::LUI | opcode::AUIPC
        ) && self.fields.rd.is_zero()
    }
}

impl<W: Word> fmt::Display for RiscVInstr<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.state.fmt_prefix(f)?;
        self.write_disasm(f)?;
        self.state.fmt_results(f, register_name)
    }
}

macro_rules! riscv_variant {
    ($(#[$doc:meta])* $name:ident, $word:ty, $isa_name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name;

        impl Isa for $name {
            type Word = $word;
            type Instr = RiscVInstr<$word>;

            const NAME: &'static str = $isa_name;
            const REGISTER_COUNT: usize = REGISTER_COUNT;
            const SYSCALL_ABI: SyscallAbi = SYSCALL_ABI;

            fn decode(raw: u32, pc: Address) -> Result<Self::Instr, SimError> {
                RiscVInstr::decode(raw, pc)
            }

            fn register_name(reg: RegisterId) -> &'static str {
                register_name(reg)
            }
        }
    };
}

riscv_variant!(
    /// RV32I.
    RiscV32, u32, "riscv32"
);
riscv_variant!(
    /// RV64I.
    RiscV64, u64, "riscv64"
);
riscv_variant!(
    /// RV128I.
    RiscV128, u128, "riscv128"
);
