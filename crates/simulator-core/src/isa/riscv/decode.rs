//! RISC-V base integer encoding tables and immediate extraction.

#![allow(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]

use crate::RegisterId;

/// Major opcodes used by the base integer instruction sets.
pub mod opcode {
    /// Loads.
    pub const LOAD: u32 = 0x03;
    /// `fence`.
    pub const MISC_MEM: u32 = 0x0F;
    /// Register-immediate arithmetic.
    pub const OP_IMM: u32 = 0x13;
    /// Add upper immediate to PC.
    pub const AUIPC: u32 = 0x17;
    /// Register-immediate word arithmetic (RV64+).
    pub const OP_IMM_32: u32 = 0x1B;
    /// Stores.
    pub const STORE: u32 = 0x23;
    /// Register-register arithmetic.
    pub const OP: u32 = 0x33;
    /// Load upper immediate.
    pub const LUI: u32 = 0x37;
    /// Register-register word arithmetic (RV64+).
    pub const OP_32: u32 = 0x3B;
    /// Conditional branches.
    pub const BRANCH: u32 = 0x63;
    /// Indirect jump and link.
    pub const JALR: u32 = 0x67;
    /// Direct jump and link.
    pub const JAL: u32 = 0x6F;
    /// `ecall`, `ebreak`.
    pub const SYSTEM: u32 = 0x73;
}

/// Operand layout of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// `rd, imm20` (U-type).
    Upper,
    /// `rd, target` (J-type).
    Jump,
    /// `rd, offset(rs1)`, indirect jump.
    JumpRegister,
    /// `rs1, rs2, target` (B-type).
    Branch,
    /// `rd, offset(rs1)`.
    Load,
    /// `rs2, offset(rs1)` (S-type).
    Store,
    /// `rd, rs1, imm` (I-type).
    Immediate,
    /// `rd, rs1, shamt`.
    Shift,
    /// `rd, rs1, rs2` (R-type).
    Register,
    /// No operands.
    Bare,
}

macro_rules! rv_ops {
    ($($variant:ident => $mnemonic:literal, $format:ident, $min_xlen:literal;)*) => {
        /// Decoded RISC-V operation.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(missing_docs)]
        pub enum RvOp {
            $($variant,)*
        }

        impl RvOp {
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

            /// Narrowest XLEN that defines the operation.
            #[must_use]
            pub const fn min_xlen(self) -> u32 {
                match self {
                    $(Self::$variant => $min_xlen,)*
                }
            }
        }
    };
}

rv_ops! {
    Lui => "lui", Upper, 32;
    Auipc => "auipc", Upper, 32;
    Jal => "jal", Jump, 32;
    Jalr => "jalr", JumpRegister, 32;
    Beq => "beq", Branch, 32;
    Bne => "bne", Branch, 32;
    Blt => "blt", Branch, 32;
    Bge => "bge", Branch, 32;
    Bltu => "bltu", Branch, 32;
    Bgeu => "bgeu", Branch, 32;
    Lb => "lb", Load, 32;
    Lh => "lh", Load, 32;
    Lw => "lw", Load, 32;
    Lbu => "lbu", Load, 32;
    Lhu => "lhu", Load, 32;
    Lwu => "lwu", Load, 64;
    Ld => "ld", Load, 64;
    Sb => "sb", Store, 32;
    Sh => "sh", Store, 32;
    Sw => "sw", Store, 32;
    Sd => "sd", Store, 64;
    Addi => "addi", Immediate, 32;
    Slti => "slti", Immediate, 32;
    Sltiu => "sltiu", Immediate, 32;
    Xori => "xori", Immediate, 32;
    Ori => "ori", Immediate, 32;
    Andi => "andi", Immediate, 32;
    Slli => "slli", Shift, 32;
    Srli => "srli", Shift, 32;
    Srai => "srai", Shift, 32;
    Add => "add", Register, 32;
    Sub => "sub", Register, 32;
    Sll => "sll", Register, 32;
    Slt => "slt", Register, 32;
    Sltu => "sltu", Register, 32;
    Xor => "xor", Register, 32;
    Srl => "srl", Register, 32;
    Sra => "sra", Register, 32;
    Or => "or", Register, 32;
    And => "and", Register, 32;
    Addiw => "addiw", Immediate, 64;
    Slliw => "slliw", Shift, 64;
    Srliw => "srliw", Shift, 64;
    Sraiw => "sraiw", Shift, 64;
    Addw => "addw", Register, 64;
    Subw => "subw", Register, 64;
    Sllw => "sllw", Register, 64;
    Srlw => "srlw", Register, 64;
    Sraw => "sraw", Register, 64;
    Fence => "fence", Bare, 32;
    Ecall => "ecall", Bare, 32;
    Ebreak => "ebreak", Bare, 32;
}

/// Register and immediate fields of an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fields {
    /// Destination register.
    pub rd: RegisterId,
    /// First source register.
    pub rs1: RegisterId,
    /// Second source register.
    pub rs2: RegisterId,
    /// Sign-extended immediate for the operation's format; the shift amount
    /// for shifts.
    pub imm: i64,
}

const fn reg(raw: u32, shift: u32) -> RegisterId {
    RegisterId::new(((raw >> shift) & 0x1F) as u8)
}

/// I-type immediate.
#[must_use]
pub const fn imm_i(raw: u32) -> i64 {
    ((raw as i32) >> 20) as i64
}

/// S-type immediate.
#[must_use]
pub const fn imm_s(raw: u32) -> i64 {
    ((((raw as i32) >> 25) << 5) | ((raw >> 7) & 0x1F) as i32) as i64
}

/// B-type immediate.
#[must_use]
pub const fn imm_b(raw: u32) -> i64 {
    let sign = ((raw as i32) >> 31) << 12;
    let bit11 = ((raw >> 7) & 0x1) << 11;
    let bits10_5 = ((raw >> 25) & 0x3F) << 5;
    let bits4_1 = ((raw >> 8) & 0xF) << 1;
    (sign | (bit11 | bits10_5 | bits4_1) as i32) as i64
}

/// U-type immediate, already shifted into bits 31..12.
#[must_use]
pub const fn imm_u(raw: u32) -> i64 {
    ((raw & 0xFFFF_F000) as i32) as i64
}

/// J-type immediate.
#[must_use]
pub const fn imm_j(raw: u32) -> i64 {
    let sign = ((raw as i32) >> 31) << 20;
    let bits19_12 = raw & 0x000F_F000;
    let bit11 = ((raw >> 20) & 0x1) << 11;
    let bits10_1 = ((raw >> 21) & 0x3FF) << 1;
    (sign | (bits19_12 | bit11 | bits10_1) as i32) as i64
}

impl Fields {
    /// Extracts the fields of `raw` as laid out for `format`.
    #[must_use]
    pub const fn parse(raw: u32, format: Format, xlen: u32) -> Self {
        let imm = match format {
            Format::Upper => imm_u(raw),
            Format::Jump => imm_j(raw),
            Format::Branch => imm_b(raw),
            Format::Store => imm_s(raw),
            Format::JumpRegister | Format::Load | Format::Immediate => imm_i(raw),
            Format::Shift => ((raw >> 20) & shamt_mask(raw, xlen)) as i64,
            Format::Register | Format::Bare => 0,
        };
        Self {
            rd: reg(raw, 7),
            rs1: reg(raw, 15),
            rs2: reg(raw, 20),
            imm,
        }
    }
}

const fn shamt_mask(raw: u32, xlen: u32) -> u32 {
    if (raw & 0x7F) == opcode::OP_IMM_32 {
        0x1F
    } else {
        xlen - 1
    }
}

/// Decodes the operation of `raw` for a machine with `xlen`-bit registers.
#[must_use]
pub fn decode_op(raw: u32, xlen: u32) -> Option<RvOp> {
    let funct3 = (raw >> 12) & 0x7;
    let funct7 = raw >> 25;
    let op = match raw & 0x7F {
        opcode::LUI => RvOp::Lui,
        opcode::AUIPC => RvOp::Auipc,
        opcode::JAL => RvOp::Jal,
        opcode::JALR if funct3 == 0 => RvOp::Jalr,
        opcode::BRANCH => branch(funct3)?,
        opcode::LOAD => load(funct3)?,
        opcode::STORE => store(funct3)?,
        opcode::OP_IMM => op_imm(raw, funct3, xlen)?,
        opcode::OP_IMM_32 => op_imm_32(raw, funct3)?,
        opcode::OP => op_reg(funct3, funct7)?,
        opcode::OP_32 => op_32(funct3, funct7)?,
        opcode::MISC_MEM if funct3 == 0 => RvOp::Fence,
        opcode::SYSTEM => match raw {
            0x0000_0073 => RvOp::Ecall,
            0x0010_0073 => RvOp::Ebreak,
            _ => return None,
        },
        _ => return None,
    };
    (op.min_xlen() <= xlen).then_some(op)
}

const fn branch(funct3: u32) -> Option<RvOp> {
    Some(match funct3 {
        0 => RvOp::Beq,
        1 => RvOp::Bne,
        4 => RvOp::Blt,
        5 => RvOp::Bge,
        6 => RvOp::Bltu,
        7 => RvOp::Bgeu,
        _ => return None,
    })
}

const fn load(funct3: u32) -> Option<RvOp> {
    Some(match funct3 {
        0 => RvOp::Lb,
        1 => RvOp::Lh,
        2 => RvOp::Lw,
        3 => RvOp::Ld,
        4 => RvOp::Lbu,
        5 => RvOp::Lhu,
        6 => RvOp::Lwu,
        _ => return None,
    })
}

const fn store(funct3: u32) -> Option<RvOp> {
    Some(match funct3 {
        0 => RvOp::Sb,
        1 => RvOp::Sh,
        2 => RvOp::Sw,
        3 => RvOp::Sd,
        _ => return None,
    })
}

/// Bits of the 12-bit immediate above the shift amount must select the
/// shift kind: all clear, or only bit 10 for arithmetic right shifts.
const fn shift_kind(raw: u32, mask: u32) -> Option<bool> {
    match ((raw >> 20) & 0xFFF) & !mask {
        0 => Some(false),
        0x400 => Some(true),
        _ => None,
    }
}

fn op_imm(raw: u32, funct3: u32, xlen: u32) -> Option<RvOp> {
    Some(match funct3 {
        0 => RvOp::Addi,
        2 => RvOp::Slti,
        3 => RvOp::Sltiu,
        4 => RvOp::Xori,
        6 => RvOp::Ori,
        7 => RvOp::Andi,
        1 if !shift_kind(raw, xlen - 1)? => RvOp::Slli,
        5 if shift_kind(raw, xlen - 1)? => RvOp::Srai,
        5 => RvOp::Srli,
        _ => return None,
    })
}

fn op_imm_32(raw: u32, funct3: u32) -> Option<RvOp> {
    Some(match funct3 {
        0 => RvOp::Addiw,
        1 if !shift_kind(raw, 0x1F)? => RvOp::Slliw,
        5 if shift_kind(raw, 0x1F)? => RvOp::Sraiw,
        5 => RvOp::Srliw,
        _ => return None,
    })
}

const fn op_reg(funct3: u32, funct7: u32) -> Option<RvOp> {
    Some(match (funct7, funct3) {
        (0x00, 0) => RvOp::Add,
        (0x20, 0) => RvOp::Sub,
        (0x00, 1) => RvOp::Sll,
        (0x00, 2) => RvOp::Slt,
        (0x00, 3) => RvOp::Sltu,
        (0x00, 4) => RvOp::Xor,
        (0x00, 5) => RvOp::Srl,
        (0x20, 5) => RvOp::Sra,
        (0x00, 6) => RvOp::Or,
        (0x00, 7) => RvOp::And,
        _ => return None,
    })
}

const fn op_32(funct3: u32, funct7: u32) -> Option<RvOp> {
    Some(match (funct7, funct3) {
        (0x00, 0) => RvOp::Addw,
        (0x20, 0) => RvOp::Subw,
        (0x00, 1) => RvOp::Sllw,
        (0x00, 5) => RvOp::Srlw,
        (0x20, 5) => RvOp::Sraw,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{decode_op, imm_b, imm_i, imm_j, imm_s, imm_u, RvOp};

    #[test]
    fn immediates_are_reassembled_and_sign_extended() {
        // addi a0, a0, -1
        assert_eq!(imm_i(0xFFF5_0513), -1);
        // sw a1, -4(sp)
        assert_eq!(imm_s(0xFEB1_2E23), -4);
        // beq zero, zero, -8
        assert_eq!(imm_b(0xFE00_0CE3), -8);
        // beq zero, zero, +2048
        assert_eq!(imm_b(0x0000_00E3), 2048);
        // lui a0, 0x80000
        assert_eq!(imm_u(0x8000_0537), -0x8000_0000);
        // jal ra, -4
        assert_eq!(imm_j(0xFFDF_F0EF), -4);
        // jal zero, +2048
        assert_eq!(imm_j(0x0010_006F), 2048);
    }

    #[rstest]
    #[case(0x0000_0013, RvOp::Addi)]
    #[case(0x0000_0073, RvOp::Ecall)]
    #[case(0x0010_0073, RvOp::Ebreak)]
    #[case(0x4000_5033, RvOp::Sra)]
    #[case(0x0000_0067, RvOp::Jalr)]
    #[case(0x0FF0_000F, RvOp::Fence)]
    fn base_encodings_decode_on_every_width(#[case] raw: u32, #[case] op: RvOp) {
        for xlen in [32, 64, 128] {
            assert_eq!(decode_op(raw, xlen), Some(op), "xlen {xlen}");
        }
    }

    #[rstest]
    // ld a0, 0(a0)
    #[case(0x0005_3503, RvOp::Ld)]
    // addiw a0, a0, 1
    #[case(0x0015_051B, RvOp::Addiw)]
    // subw a0, a0, a1
    #[case(0x40B5_053B, RvOp::Subw)]
    fn wide_encodings_need_64_bit_registers(#[case] raw: u32, #[case] op: RvOp) {
        assert_eq!(decode_op(raw, 32), None);
        assert_eq!(decode_op(raw, 64), Some(op));
        assert_eq!(decode_op(raw, 128), Some(op));
    }

    #[test]
    fn shift_amount_width_follows_xlen() {
        // slli a0, a0, 32
        let slli_32 = 0x0205_1513;
        assert_eq!(decode_op(slli_32, 32), None);
        assert_eq!(decode_op(slli_32, 64), Some(RvOp::Slli));
        // srai a0, a0, 64
        let srai_64 = 0x4405_5513;
        assert_eq!(decode_op(srai_64, 64), None);
        assert_eq!(decode_op(srai_64, 128), Some(RvOp::Srai));
    }

    #[test]
    fn reserved_encodings_are_rejected() {
        assert_eq!(decode_op(0x0000_0000, 64), None);
        assert_eq!(decode_op(0xFFFF_FFFF, 64), None);
        // funct7 0x01 is the M extension
        assert_eq!(decode_op(0x02B5_0533, 64), None);
        assert_eq!(decode_op(0x0000_1067, 64), None);
    }
}
