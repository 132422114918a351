//! RISC-V base integer semantics, shared by every XLEN.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use super::decode::RvOp;
use super::RiscVInstr;
use crate::{Trap, Word};

fn sext<W: Word>(value: u32) -> W {
    W::from_i64(i64::from(value as i32))
}

fn bool_word<W: Word>(value: bool) -> W {
    if value {
        W::ONE
    } else {
        W::ZERO
    }
}

impl<W: Word> RiscVInstr<W> {
    pub(super) fn execute_op(&mut self) {
        let a = self.state.v_src[0];
        let b = self.state.v_src[1];
        let imm = W::from_i64(self.fields.imm);
        let pc = W::from_u64(self.state.pc);
        let shamt = u32::try_from(self.fields.imm).unwrap_or(0);
        let xlen_mask = W::BITS - 1;

        match self.op {
            RvOp::Lui => self.state.set_result(imm),
            RvOp::Auipc => self.state.set_result(pc.wrapping_add(imm)),
            RvOp::Jal => {
                let link = self.state.fallthrough();
                self.state.set_result(link);
                self.state.jump_to(pc.wrapping_add(imm));
            }
            RvOp::Jalr => {
                let target = a.wrapping_add(imm) & !W::ONE;
                let link = self.state.fallthrough();
                self.state.set_result(link);
                self.state.jump_to(target);
            }

            RvOp::Beq => self.branch_if(a == b, pc.wrapping_add(imm)),
            RvOp::Bne => self.branch_if(a != b, pc.wrapping_add(imm)),
            RvOp::Blt => self.branch_if(a.signed_lt(b), pc.wrapping_add(imm)),
            RvOp::Bge => self.branch_if(!a.signed_lt(b), pc.wrapping_add(imm)),
            RvOp::Bltu => self.branch_if(a < b, pc.wrapping_add(imm)),
            RvOp::Bgeu => self.branch_if(a >= b, pc.wrapping_add(imm)),

            RvOp::Lb => self.state.request_load(a.wrapping_add(imm), 1, true),
            RvOp::Lh => self.state.request_load(a.wrapping_add(imm), 2, true),
            RvOp::Lw => self.state.request_load(a.wrapping_add(imm), 4, true),
            RvOp::Ld => self.state.request_load(a.wrapping_add(imm), 8, true),
            RvOp::Lbu => self.state.request_load(a.wrapping_add(imm), 1, false),
            RvOp::Lhu => self.state.request_load(a.wrapping_add(imm), 2, false),
            RvOp::Lwu => self.state.request_load(a.wrapping_add(imm), 4, false),
            RvOp::Sb => self.state.request_store(a.wrapping_add(imm), 1, b),
            RvOp::Sh => self.state.request_store(a.wrapping_add(imm), 2, b),
            RvOp::Sw => self.state.request_store(a.wrapping_add(imm), 4, b),
            RvOp::Sd => self.state.request_store(a.wrapping_add(imm), 8, b),

            RvOp::Addi => self.state.set_result(a.wrapping_add(imm)),
            RvOp::Slti => self.state.set_result(bool_word(a.signed_lt(imm))),
            RvOp::Sltiu => self.state.set_result(bool_word(a < imm)),
            RvOp::Xori => self.state.set_result(a ^ imm),
            RvOp::Ori => self.state.set_result(a | imm),
            RvOp::Andi => self.state.set_result(a & imm),
            RvOp::Slli => self.state.set_result(a.shl(shamt)),
            RvOp::Srli => self.state.set_result(a.shr(shamt)),
            RvOp::Srai => self.state.set_result(a.sra(shamt)),

            RvOp::Add => self.state.set_result(a.wrapping_add(b)),
            RvOp::Sub => self.state.set_result(a.wrapping_sub(b)),
            RvOp::Sll => self.state.set_result(a.shl(b.low32() & xlen_mask)),
            RvOp::Slt => self.state.set_result(bool_word(a.signed_lt(b))),
            RvOp::Sltu => self.state.set_result(bool_word(a < b)),
            RvOp::Xor => self.state.set_result(a ^ b),
            RvOp::Srl => self.state.set_result(a.shr(b.low32() & xlen_mask)),
            RvOp::Sra => self.state.set_result(a.sra(b.low32() & xlen_mask)),
            RvOp::Or => self.state.set_result(a | b),
            RvOp::And => self.state.set_result(a & b),

            RvOp::Addiw => self.state.set_result(sext(a.low32().wrapping_add(imm.low32()))),
            RvOp::Slliw => self.state.set_result(sext(a.low32() << shamt)),
            RvOp::Srliw => self.state.set_result(sext(a.low32() >> shamt)),
            RvOp::Sraiw => self.state.set_result(sext(((a.low32() as i32) >> shamt) as u32)),
            RvOp::Addw => self.state.set_result(sext(a.low32().wrapping_add(b.low32()))),
            RvOp::Subw => self.state.set_result(sext(a.low32().wrapping_sub(b.low32()))),
            RvOp::Sllw => self.state.set_result(sext(a.low32() << (b.low32() & 0x1F))),
            RvOp::Srlw => self.state.set_result(sext(a.low32() >> (b.low32() & 0x1F))),
            RvOp::Sraw => {
                let shifted = (a.low32() as i32) >> (b.low32() & 0x1F);
                self.state.set_result(sext(shifted as u32));
            }

            RvOp::Fence => {}
            RvOp::Ecall => self.state.raise(Trap::Syscall),
            RvOp::Ebreak => self.state.raise(Trap::Breakpoint),
        }
    }

    fn branch_if(&mut self, taken: bool, target: W) {
        if taken {
            self.state.branch_to(target);
        }
    }
}
