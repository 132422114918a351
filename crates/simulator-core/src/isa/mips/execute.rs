//! MIPS instruction semantics.
//!
//! Operands arrive in `v_src[0]` (`rs`, or HI/LO for moves) and `v_src[1]`
//! (`rt`). 32-bit results are sign-extended to the register width, which is
//! the identity on 32-bit variants.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use super::decode::MipsOp;
use super::MipsInstr;
use crate::{Trap, Word};

fn sext<W: Word>(value: u32) -> W {
    W::from_i64(i64::from(value as i32))
}

fn signed32<W: Word>(value: W) -> i32 {
    value.low32() as i32
}

fn bool_word<W: Word>(value: bool) -> W {
    if value {
        W::ONE
    } else {
        W::ZERO
    }
}

fn overflowed<W: Word>(a: W, b: W, result: W) -> bool {
    a.is_negative() == b.is_negative() && result.is_negative() != a.is_negative()
}

impl<W: Word> MipsInstr<W> {
    pub(super) fn execute_op(&mut self) {
        let a = self.state.v_src[0];
        let b = self.state.v_src[1];
        let imm = W::from_i64(self.fields.simm());
        let uimm = W::from_u64(u64::from(self.fields.imm));
        let shamt = self.fields.shamt;

        match self.op {
            MipsOp::Sll => self.state.set_result(sext(b.low32() << shamt)),
            MipsOp::Srl => self.state.set_result(sext(b.low32() >> shamt)),
            MipsOp::Sra => self.state.set_result(sext((signed32(b) >> shamt) as u32)),
            MipsOp::Sllv => self.state.set_result(sext(b.low32() << (a.low32() & 0x1F))),
            MipsOp::Srlv => self.state.set_result(sext(b.low32() >> (a.low32() & 0x1F))),
            MipsOp::Srav => {
                let shifted = signed32(b) >> (a.low32() & 0x1F);
                self.state.set_result(sext(shifted as u32));
            }
            MipsOp::Dsll => self.state.set_result(b.shl(shamt)),
            MipsOp::Dsrl => self.state.set_result(b.shr(shamt)),
            MipsOp::Dsra => self.state.set_result(b.sra(shamt)),
            MipsOp::Dsll32 => self.state.set_result(b.shl(shamt + 32)),
            MipsOp::Dsrl32 => self.state.set_result(b.shr(shamt + 32)),
            MipsOp::Dsra32 => self.state.set_result(b.sra(shamt + 32)),

            MipsOp::Jr => self.state.jump_to(a),
            MipsOp::Jalr => {
                let link = self.state.fallthrough();
                self.state.set_result(link);
                self.state.jump_to(a);
            }
            MipsOp::J | MipsOp::Jal => {
                if self.op == MipsOp::Jal {
                    let link = self.state.fallthrough();
                    self.state.set_result(link);
                }
                self.state.jump_to(W::from_u64(self.jump_target()));
            }

            MipsOp::Beq => self.branch_if(a == b),
            MipsOp::Bne => self.branch_if(a != b),
            MipsOp::Blez => self.branch_if(a.is_negative() || a == W::ZERO),
            MipsOp::Bgtz => self.branch_if(!a.is_negative() && a != W::ZERO),
            MipsOp::Bltz => self.branch_if(a.is_negative()),
            MipsOp::Bgez => self.branch_if(!a.is_negative()),
            MipsOp::Bltzal | MipsOp::Bgezal => {
                let link = self.state.fallthrough();
                self.state.set_result(link);
                self.branch_if(a.is_negative() == (self.op == MipsOp::Bltzal));
            }

            MipsOp::Movz | MipsOp::Movn => {
                if (b == W::ZERO) == (self.op == MipsOp::Movz) {
                    self.state.set_result(a);
                } else {
                    self.state.suppress_writeback();
                }
            }
            MipsOp::Syscall => self.state.raise(Trap::Syscall),
            MipsOp::Break => self.state.raise(Trap::Breakpoint),
            MipsOp::Mfhi | MipsOp::Mflo | MipsOp::Mthi | MipsOp::Mtlo => {
                self.state.set_result(a);
            }

            MipsOp::Mult => {
                let product = i64::from(signed32(a)) * i64::from(signed32(b));
                self.set_hi_lo((product >> 32) as u32, product as u32);
            }
            MipsOp::Multu => {
                let product = u64::from(a.low32()) * u64::from(b.low32());
                self.set_hi_lo((product >> 32) as u32, product as u32);
            }
            MipsOp::Div => {
                let (dividend, divisor) = (signed32(a), signed32(b));
                if divisor == 0 {
                    self.state.suppress_writeback();
                } else {
                    self.set_hi_lo(
                        dividend.wrapping_rem(divisor) as u32,
                        dividend.wrapping_div(divisor) as u32,
                    );
                }
            }
            MipsOp::Divu => {
                let (dividend, divisor) = (a.low32(), b.low32());
                if divisor == 0 {
                    self.state.suppress_writeback();
                } else {
                    self.set_hi_lo(dividend % divisor, dividend / divisor);
                }
            }
            MipsOp::Mul => {
                let product = signed32(a).wrapping_mul(signed32(b));
                self.state.set_result(sext(product as u32));
            }
            MipsOp::Clz => self.state.set_result(W::from_u64(u64::from(a.low32().leading_zeros()))),
            MipsOp::Clo => self.state.set_result(W::from_u64(u64::from(a.low32().leading_ones()))),

            MipsOp::Add | MipsOp::Addi => {
                let rhs = if self.op == MipsOp::Add { b } else { imm };
                match signed32(a).checked_add(signed32(rhs)) {
                    Some(sum) => self.state.set_result(sext(sum as u32)),
                    None => self.state.raise(Trap::IntegerOverflow),
                }
            }
            MipsOp::Sub => match signed32(a).checked_sub(signed32(b)) {
                Some(diff) => self.state.set_result(sext(diff as u32)),
                None => self.state.raise(Trap::IntegerOverflow),
            },
            MipsOp::Addu => self.state.set_result(sext(a.low32().wrapping_add(b.low32()))),
            MipsOp::Addiu => self.state.set_result(sext(a.low32().wrapping_add(imm.low32()))),
            MipsOp::Subu => self.state.set_result(sext(a.low32().wrapping_sub(b.low32()))),
            MipsOp::Dadd | MipsOp::Daddi => {
                let rhs = if self.op == MipsOp::Dadd { b } else { imm };
                let sum = a.wrapping_add(rhs);
                if overflowed(a, rhs, sum) {
                    self.state.raise(Trap::IntegerOverflow);
                } else {
                    self.state.set_result(sum);
                }
            }
            MipsOp::Dsub => {
                let diff = a.wrapping_sub(b);
                if a.is_negative() != b.is_negative() && diff.is_negative() != a.is_negative() {
                    self.state.raise(Trap::IntegerOverflow);
                } else {
                    self.state.set_result(diff);
                }
            }
            MipsOp::Daddu => self.state.set_result(a.wrapping_add(b)),
            MipsOp::Daddiu => self.state.set_result(a.wrapping_add(imm)),
            MipsOp::Dsubu => self.state.set_result(a.wrapping_sub(b)),

            MipsOp::And => self.state.set_result(a & b),
            MipsOp::Or => self.state.set_result(a | b),
            MipsOp::Xor => self.state.set_result(a ^ b),
            MipsOp::Nor => self.state.set_result(!(a | b)),
            MipsOp::Andi => self.state.set_result(a & uimm),
            MipsOp::Ori => self.state.set_result(a | uimm),
            MipsOp::Xori => self.state.set_result(a ^ uimm),
            MipsOp::Slt => self.state.set_result(bool_word(a.signed_lt(b))),
            MipsOp::Sltu => self.state.set_result(bool_word(a < b)),
            MipsOp::Slti => self.state.set_result(bool_word(a.signed_lt(imm))),
            MipsOp::Sltiu => self.state.set_result(bool_word(a < imm)),
            MipsOp::Lui => self.state.set_result(sext(u32::from(self.fields.imm) << 16)),

            MipsOp::Tge => self.trap_if(!a.signed_lt(b)),
            MipsOp::Tgeu => self.trap_if(a >= b),
            MipsOp::Tlt => self.trap_if(a.signed_lt(b)),
            MipsOp::Tltu => self.trap_if(a < b),
            MipsOp::Teq => self.trap_if(a == b),
            MipsOp::Tne => self.trap_if(a != b),

            MipsOp::Lb => self.state.request_load(a.wrapping_add(imm), 1, true),
            MipsOp::Lh => self.state.request_load(a.wrapping_add(imm), 2, true),
            MipsOp::Lw => self.state.request_load(a.wrapping_add(imm), 4, true),
            MipsOp::Ld => self.state.request_load(a.wrapping_add(imm), 8, true),
            MipsOp::Lbu => self.state.request_load(a.wrapping_add(imm), 1, false),
            MipsOp::Lhu => self.state.request_load(a.wrapping_add(imm), 2, false),
            MipsOp::Lwu => self.state.request_load(a.wrapping_add(imm), 4, false),
            MipsOp::Sb => self.state.request_store(a.wrapping_add(imm), 1, b),
            MipsOp::Sh => self.state.request_store(a.wrapping_add(imm), 2, b),
            MipsOp::Sw => self.state.request_store(a.wrapping_add(imm), 4, b),
            MipsOp::Sd => self.state.request_store(a.wrapping_add(imm), 8, b),
        }
    }

    fn branch_if(&mut self, taken: bool) {
        if taken {
            self.state.branch_to(W::from_u64(self.branch_target()));
        }
    }

    fn trap_if(&mut self, condition: bool) {
        if condition {
            self.state.raise(Trap::ExplicitTrap);
        }
    }

    fn set_hi_lo(&mut self, hi: u32, lo: u32) {
        self.state.v_dst = [sext(hi), sext(lo)];
    }
}
