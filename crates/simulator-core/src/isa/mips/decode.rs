//! MIPS encoding tables.
//!
//! Decoding is two-level: the primary opcode selects an operation directly
//! or names a sub-table (SPECIAL, REGIMM, SPECIAL2) indexed by the function
//! or `rt` field. Every operation records the extension that introduced it so
//! a variant can reject encodings newer than itself.

use super::MipsVersion;
use crate::RegisterId;

/// Architecture revision that introduced an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    /// Present since MIPS I.
    Base,
    /// Conditional trap instructions (MIPS II).
    Traps,
    /// Doubleword arithmetic, shifts and memory access (MIPS III).
    Doubleword,
    /// `movz`/`movn` (MIPS IV).
    ConditionalMove,
    /// `mul`/`clz`/`clo` (MIPS32).
    Mips32,
}

/// Operand layout, shared by decode and disassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// `rd, rt, shamt`
    Shift,
    /// `rd, rt, rs`
    ShiftVariable,
    /// `rd, rs, rt`
    Register,
    /// `rs, rt`, results in HI/LO.
    HiLo,
    /// `rs, rt`, no result.
    Compare,
    /// `rs`
    JumpRegister,
    /// `rd, rs`, link in `rd`.
    JumpLinkRegister,
    /// `rd`, source is HI or LO.
    MoveFrom,
    /// `rs`, destination is HI or LO.
    MoveTo,
    /// `rd, rs`
    Count,
    /// No operands.
    Bare,
    /// 26-bit region target.
    Jump,
    /// 26-bit region target, link in `$ra`.
    JumpLink,
    /// `rs, rt, offset`
    Branch,
    /// `rs, offset`
    BranchZero,
    /// `rs, offset`, link in `$ra`.
    BranchZeroLink,
    /// `rt, rs, signed immediate`
    Immediate,
    /// `rt, rs, unsigned immediate`
    Logical,
    /// `rt, immediate`
    Upper,
    /// `rt, offset(rs)`, `rt` written.
    Load,
    /// `rt, offset(rs)`, `rt` read.
    Store,
}

macro_rules! mips_ops {
    ($($variant:ident => $mnemonic:literal, $format:ident, $extension:ident;)*) => {
        /// Decoded MIPS operation.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(missing_docs)]
        pub enum MipsOp {
            $($variant,)*
        }

        impl MipsOp {
            /// Assembly mnemonic.
            #[must_use]
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $(Self::$variant => $mnemonic,)*
                }
            }

            /// Operand layout.
            #[must_use]
            pub const fn format(self) -> Format {
                match self {
                    $(Self::$variant => Format::$format,)*
                }
            }

            /// Revision that introduced the operation.
            #[must_use]
            pub const fn extension(self) -> Extension {
                match self {
                    $(Self::$variant => Extension::$extension,)*
                }
            }
        }
    };
}

mips_ops! {
    Sll => "sll", Shift, Base;
    Srl => "srl", Shift, Base;
    Sra => "sra", Shift, Base;
    Sllv => "sllv", ShiftVariable, Base;
    Srlv => "srlv", ShiftVariable, Base;
    Srav => "srav", ShiftVariable, Base;
    Jr => "jr", JumpRegister, Base;
    Jalr => "jalr", JumpLinkRegister, Base;
    Movz => "movz", Register, ConditionalMove;
    Movn => "movn", Register, ConditionalMove;
    Syscall => "syscall", Bare, Base;
    Break => "break", Bare, Base;
    Mfhi => "mfhi", MoveFrom, Base;
    Mthi => "mthi", MoveTo, Base;
    Mflo => "mflo", MoveFrom, Base;
    Mtlo => "mtlo", MoveTo, Base;
    Mult => "mult", HiLo, Base;
    Multu => "multu", HiLo, Base;
    Div => "div", HiLo, Base;
    Divu => "divu", HiLo, Base;
    Add => "add", Register, Base;
    Addu => "addu", Register, Base;
    Sub => "sub", Register, Base;
    Subu => "subu", Register, Base;
    And => "and", Register, Base;
    Or => "or", Register, Base;
    Xor => "xor", Register, Base;
    Nor => "nor", Register, Base;
    Slt => "slt", Register, Base;
    Sltu => "sltu", Register, Base;
    Dadd => "dadd", Register, Doubleword;
    Daddu => "daddu", Register, Doubleword;
    Dsub => "dsub", Register, Doubleword;
    Dsubu => "dsubu", Register, Doubleword;
    Tge => "tge", Compare, Traps;
    Tgeu => "tgeu", Compare, Traps;
    Tlt => "tlt", Compare, Traps;
    Tltu => "tltu", Compare, Traps;
    Teq => "teq", Compare, Traps;
    Tne => "tne", Compare, Traps;
    Dsll => "dsll", Shift, Doubleword;
    Dsrl => "dsrl", Shift, Doubleword;
    Dsra => "dsra", Shift, Doubleword;
    Dsll32 => "dsll32", Shift, Doubleword;
    Dsrl32 => "dsrl32", Shift, Doubleword;
    Dsra32 => "dsra32", Shift, Doubleword;
    Mul => "mul", Register, Mips32;
    Clz => "clz", Count, Mips32;
    Clo => "clo", Count, Mips32;
    Bltz => "bltz", BranchZero, Base;
    Bgez => "bgez", BranchZero, Base;
    Bltzal => "bltzal", BranchZeroLink, Base;
    Bgezal => "bgezal", BranchZeroLink, Base;
    J => "j", Jump, Base;
    Jal => "jal", JumpLink, Base;
    Beq => "beq", Branch, Base;
    Bne => "bne", Branch, Base;
    Blez => "blez", BranchZero, Base;
    Bgtz => "bgtz", BranchZero, Base;
    Addi => "addi", Immediate, Base;
    Addiu => "addiu", Immediate, Base;
    Slti => "slti", Immediate, Base;
    Sltiu => "sltiu", Immediate, Base;
    Andi => "andi", Logical, Base;
    Ori => "ori", Logical, Base;
    Xori => "xori", Logical, Base;
    Lui => "lui", Upper, Base;
    Daddi => "daddi", Immediate, Doubleword;
    Daddiu => "daddiu", Immediate, Doubleword;
    Lb => "lb", Load, Base;
    Lh => "lh", Load, Base;
    Lw => "lw", Load, Base;
    Lbu => "lbu", Load, Base;
    Lhu => "lhu", Load, Base;
    Lwu => "lwu", Load, Doubleword;
    Ld => "ld", Load, Doubleword;
    Sb => "sb", Store, Base;
    Sh => "sh", Store, Base;
    Sw => "sw", Store, Base;
    Sd => "sd", Store, Doubleword;
}

/// Bit fields of a MIPS instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fields {
    /// First source register.
    pub rs: RegisterId,
    /// Second source, or destination of I-type instructions.
    pub rt: RegisterId,
    /// Destination of R-type instructions.
    pub rd: RegisterId,
    /// Shift amount.
    pub shamt: u32,
    /// 16-bit immediate.
    pub imm: u16,
    /// 26-bit jump target.
    pub target: u32,
}

impl Fields {
    /// Splits `raw` into its fields.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn parse(raw: u32) -> Self {
        Self {
            rs: RegisterId::new(((raw >> 21) & 0x1F) as u8),
            rt: RegisterId::new(((raw >> 16) & 0x1F) as u8),
            rd: RegisterId::new(((raw >> 11) & 0x1F) as u8),
            shamt: (raw >> 6) & 0x1F,
            imm: (raw & 0xFFFF) as u16,
            target: raw & 0x03FF_FFFF,
        }
    }

    /// Immediate sign-extended to 64 bits.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_lossless)]
    pub const fn simm(self) -> i64 {
        self.imm as i16 as i64
    }
}

/// Decodes the operation of `raw`, or `None` when `version` does not define it.
#[must_use]
pub fn decode_op(raw: u32, version: MipsVersion) -> Option<MipsOp> {
    let op = match raw >> 26 {
        0x00 => special(raw & 0x3F)?,
        0x01 => regimm((raw >> 16) & 0x1F)?,
        0x02 => MipsOp::J,
        0x03 => MipsOp::Jal,
        0x04 => MipsOp::Beq,
        0x05 => MipsOp::Bne,
        0x06 => MipsOp::Blez,
        0x07 => MipsOp::Bgtz,
        0x08 => MipsOp::Addi,
        0x09 => MipsOp::Addiu,
        0x0A => MipsOp::Slti,
        0x0B => MipsOp::Sltiu,
        0x0C => MipsOp::Andi,
        0x0D => MipsOp::Ori,
        0x0E => MipsOp::Xori,
        0x0F => MipsOp::Lui,
        0x18 => MipsOp::Daddi,
        0x19 => MipsOp::Daddiu,
        0x1C => special2(raw & 0x3F)?,
        0x20 => MipsOp::Lb,
        0x21 => MipsOp::Lh,
        0x23 => MipsOp::Lw,
        0x24 => MipsOp::Lbu,
        0x25 => MipsOp::Lhu,
        0x27 => MipsOp::Lwu,
        0x28 => MipsOp::Sb,
        0x29 => MipsOp::Sh,
        0x2B => MipsOp::Sw,
        0x37 => MipsOp::Ld,
        0x3F => MipsOp::Sd,
        _ => return None,
    };
    version.supports(op.extension()).then_some(op)
}

const fn special(funct: u32) -> Option<MipsOp> {
    Some(match funct {
        0x00 => MipsOp::Sll,
        0x02 => MipsOp::Srl,
        0x03 => MipsOp::Sra,
        0x04 => MipsOp::Sllv,
        0x06 => MipsOp::Srlv,
        0x07 => MipsOp::Srav,
        0x08 => MipsOp::Jr,
        0x09 => MipsOp::Jalr,
        0x0A => MipsOp::Movz,
        0x0B => MipsOp::Movn,
        0x0C => MipsOp::Syscall,
        0x0D => MipsOp::Break,
        0x10 => MipsOp::Mfhi,
        0x11 => MipsOp::Mthi,
        0x12 => MipsOp::Mflo,
        0x13 => MipsOp::Mtlo,
        0x18 => MipsOp::Mult,
        0x19 => MipsOp::Multu,
        0x1A => MipsOp::Div,
        0x1B => MipsOp::Divu,
        0x20 => MipsOp::Add,
        0x21 => MipsOp::Addu,
        0x22 => MipsOp::Sub,
        0x23 => MipsOp::Subu,
        0x24 => MipsOp::And,
        0x25 => MipsOp::Or,
        0x26 => MipsOp::Xor,
        0x27 => MipsOp::Nor,
        0x2A => MipsOp::Slt,
        0x2B => MipsOp::Sltu,
        0x2C => MipsOp::Dadd,
        0x2D => MipsOp::Daddu,
        0x2E => MipsOp::Dsub,
        0x2F => MipsOp::Dsubu,
        0x30 => MipsOp::Tge,
        0x31 => MipsOp::Tgeu,
        0x32 => MipsOp::Tlt,
        0x33 => MipsOp::Tltu,
        0x34 => MipsOp::Teq,
        0x36 => MipsOp::Tne,
        0x38 => MipsOp::Dsll,
        0x3A => MipsOp::Dsrl,
        0x3B => MipsOp::Dsra,
        0x3C => MipsOp::Dsll32,
        0x3E => MipsOp::Dsrl32,
        0x3F => MipsOp::Dsra32,
        _ => return None,
    })
}

const fn regimm(rt: u32) -> Option<MipsOp> {
    Some(match rt {
        0x00 => MipsOp::Bltz,
        0x01 => MipsOp::Bgez,
        0x10 => MipsOp::Bltzal,
        0x11 => MipsOp::Bgezal,
        _ => return None,
    })
}

const fn special2(funct: u32) -> Option<MipsOp> {
    Some(match funct {
        0x02 => MipsOp::Mul,
        0x20 => MipsOp::Clz,
        0x21 => MipsOp::Clo,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{decode_op, Fields, Format, MipsOp};
    use crate::isa::mips::MipsVersion;
    use crate::RegisterId;

    #[test]
    fn fields_follow_the_r_and_i_layouts() {
        // addu $t2, $t0, $t1
        let fields = Fields::parse(0x0109_5021);
        assert_eq!(fields.rs, RegisterId::new(8));
        assert_eq!(fields.rt, RegisterId::new(9));
        assert_eq!(fields.rd, RegisterId::new(10));

        // addiu $t0, $zero, -1
        let fields = Fields::parse(0x2408_FFFF);
        assert_eq!(fields.simm(), -1);
        assert_eq!(fields.imm, 0xFFFF);
    }

    #[rstest]
    #[case(0x0109_5021, MipsOp::Addu)]
    #[case(0x0000_000C, MipsOp::Syscall)]
    #[case(0x0000_0000, MipsOp::Sll)]
    #[case(0x0411_0003, MipsOp::Bgezal)]
    #[case(0x8FA4_0010, MipsOp::Lw)]
    #[case(0x0800_0000, MipsOp::J)]
    fn base_encodings_decode_on_every_version(#[case] raw: u32, #[case] op: MipsOp) {
        for version in MipsVersion::ALL {
            assert_eq!(decode_op(raw, version), Some(op), "{version:?}");
        }
    }

    #[rstest]
    // teq $t0, $t1
    #[case(0x0109_0034, MipsOp::Teq, [false, true, true, true, true, true])]
    // daddu $t2, $t0, $t1
    #[case(0x0109_502D, MipsOp::Daddu, [false, false, true, true, false, true])]
    // movz $t2, $t0, $t1
    #[case(0x0109_500A, MipsOp::Movz, [false, false, false, true, true, true])]
    // mul $t2, $t0, $t1
    #[case(0x7109_5002, MipsOp::Mul, [false, false, false, false, true, true])]
    fn newer_encodings_are_gated_by_version(
        #[case] raw: u32,
        #[case] op: MipsOp,
        #[case] accepted: [bool; 6],
    ) {
        for (version, accepted) in MipsVersion::ALL.into_iter().zip(accepted) {
            let expected = accepted.then_some(op);
            assert_eq!(decode_op(raw, version), expected, "{version:?}");
        }
    }

    #[test]
    fn unknown_opcodes_are_rejected() {
        assert_eq!(decode_op(0xFC00_0000, MipsVersion::Mips64), Some(MipsOp::Sd));
        assert_eq!(decode_op(0x4400_0000, MipsVersion::Mips64), None);
        assert_eq!(decode_op(0x0000_0001, MipsVersion::Mips64), None);
        assert_eq!(decode_op(0x0402_0000, MipsVersion::Mips64), None);
    }

    #[test]
    fn formats_and_mnemonics_line_up() {
        assert_eq!(MipsOp::Sw.format(), Format::Store);
        assert_eq!(MipsOp::Mfhi.format(), Format::MoveFrom);
        assert_eq!(MipsOp::Dsra32.mnemonic(), "dsra32");
    }
}
