use crate::simt::isa::{DecodedInst, Major, Opcode};
use crate::utils::{sign_ext, BitSlice};
use num_traits::FromPrimitive;

/// The decoding oracle: maps the 4 instruction bytes at a PC to a tagged
/// operation with operand fields. Only the RV32IMA subset the target
/// toolchain emits is recognised, plus the custom nesting push/pop and
/// cache-line-flush opcodes; everything else decodes to `Unknown` and is
/// skipped by the execute stage.
#[derive(Debug)]
pub struct DecodeUnit;

impl DecodeUnit {
    pub fn decode(raw: u32) -> DecodedInst {
        let rd = raw.sel(11, 7) as u8;
        let f3 = raw.sel(14, 12) as u8;
        let rs1 = raw.sel(19, 15) as u8;
        let rs2 = raw.sel(24, 20) as u8;
        let f7 = raw.sel(31, 25) as u8;

        let imm_i = sign_ext::<12>(raw.sel(31, 20));
        let imm_s = sign_ext::<12>((raw.sel(31, 25) << 5) | raw.sel(11, 7));
        let imm_b = sign_ext::<13>(
            ((raw.bit(31) as u32) << 12)
                | ((raw.bit(7) as u32) << 11)
                | (raw.sel(30, 25) << 5)
                | (raw.sel(11, 8) << 1),
        );
        let imm_u = raw.sel(31, 12) as i32;
        let imm_j = sign_ext::<21>(
            ((raw.bit(31) as u32) << 20)
                | (raw.sel(19, 12) << 12)
                | ((raw.bit(20) as u32) << 11)
                | (raw.sel(30, 21) << 1),
        );
        let shamt = raw.sel(24, 20) as i32;

        let mut inst = DecodedInst {
            op: Opcode::Unknown,
            rd,
            rs1,
            rs2,
            imm: 0,
            csr: 0,
            raw,
        };

        let Some(major) = Major::from_u32(raw.sel(6, 0)) else {
            return inst;
        };

        match major {
            Major::Lui => {
                inst.op = Opcode::Lui;
                inst.imm = imm_u;
            }
            Major::Auipc => {
                inst.op = Opcode::Auipc;
                inst.imm = imm_u;
            }
            Major::Jal => {
                inst.op = Opcode::Jal;
                inst.imm = imm_j;
            }
            Major::Jalr => {
                inst.op = Opcode::Jalr;
                inst.imm = imm_i;
            }
            Major::Branch => {
                inst.imm = imm_b;
                inst.op = match f3 {
                    0b000 => Opcode::Beq,
                    0b001 => Opcode::Bne,
                    0b100 => Opcode::Blt,
                    0b101 => Opcode::Bge,
                    0b110 => Opcode::Bltu,
                    0b111 => Opcode::Bgeu,
                    _ => Opcode::Unknown,
                };
            }
            Major::Load => {
                inst.imm = imm_i;
                inst.op = match f3 {
                    0b000 => Opcode::Lb,
                    0b001 => Opcode::Lh,
                    0b010 => Opcode::Lw,
                    0b100 => Opcode::Lbu,
                    0b101 => Opcode::Lhu,
                    _ => Opcode::Unknown,
                };
            }
            Major::Store => {
                inst.imm = imm_s;
                inst.op = match f3 {
                    0b000 => Opcode::Sb,
                    0b001 => Opcode::Sh,
                    0b010 => Opcode::Sw,
                    _ => Opcode::Unknown,
                };
            }
            Major::OpImm => {
                inst.imm = imm_i;
                inst.op = match f3 {
                    0b000 => Opcode::Addi,
                    0b010 => Opcode::Slti,
                    0b011 => Opcode::Sltiu,
                    0b100 => Opcode::Xori,
                    0b110 => Opcode::Ori,
                    0b111 => Opcode::Andi,
                    0b001 => {
                        inst.imm = shamt;
                        Opcode::Slli
                    }
                    0b101 => {
                        inst.imm = shamt;
                        if f7 == 0b0100000 {
                            Opcode::Srai
                        } else {
                            Opcode::Srli
                        }
                    }
                    _ => Opcode::Unknown,
                };
            }
            Major::Op => {
                inst.op = if f7 == 0b0000001 {
                    // RV32M
                    match f3 {
                        0b000 => Opcode::Mul,
                        0b100 => Opcode::Div,
                        0b101 => Opcode::Divu,
                        0b110 => Opcode::Rem,
                        0b111 => Opcode::Remu,
                        _ => Opcode::Unknown,
                    }
                } else {
                    match (f3, f7) {
                        (0b000, 0b0000000) => Opcode::Add,
                        (0b000, 0b0100000) => Opcode::Sub,
                        (0b001, 0b0000000) => Opcode::Sll,
                        (0b010, 0b0000000) => Opcode::Slt,
                        (0b011, 0b0000000) => Opcode::Sltu,
                        (0b100, 0b0000000) => Opcode::Xor,
                        (0b101, 0b0000000) => Opcode::Srl,
                        (0b101, 0b0100000) => Opcode::Sra,
                        (0b110, 0b0000000) => Opcode::Or,
                        (0b111, 0b0000000) => Opcode::And,
                        _ => Opcode::Unknown,
                    }
                };
            }
            Major::Amo => {
                // funct5 selects the AMO; only AMOADD.W on words is issued.
                if raw.sel(31, 27) == 0 && f3 == 0b010 {
                    inst.op = Opcode::AmoaddW;
                }
            }
            Major::MiscMem => {
                inst.op = Opcode::Fence;
            }
            Major::System => {
                inst.op = match f3 {
                    0b000 => match raw.sel(31, 20) {
                        0 => Opcode::Ecall,
                        1 => Opcode::Ebreak,
                        _ => Opcode::Unknown,
                    },
                    0b001 => {
                        inst.csr = raw.sel(31, 20) as u16;
                        Opcode::Csrrw
                    }
                    _ => Opcode::Unknown,
                };
            }
            Major::NoclOp => {
                inst.op = match f3 {
                    0b000 => Opcode::NoclPush,
                    0b001 => Opcode::NoclPop,
                    _ => Opcode::Unknown,
                };
            }
            Major::FlushOp => {
                if f3 == 0b000 {
                    inst.op = Opcode::CacheLineFlush;
                }
            }
        }

        inst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::asm;

    #[test]
    fn decodes_itype_arith() {
        let inst = DecodeUnit::decode(asm::addi(1, 0, 10));
        assert_eq!(inst.op, Opcode::Addi);
        assert_eq!(inst.rd, 1);
        assert_eq!(inst.rs1, 0);
        assert_eq!(inst.imm, 10);

        let inst = DecodeUnit::decode(asm::addi(5, 5, -1));
        assert_eq!(inst.imm, -1);
    }

    #[test]
    fn decodes_rtype_and_m_extension() {
        let inst = DecodeUnit::decode(asm::add(3, 1, 2));
        assert_eq!(inst.op, Opcode::Add);
        let inst = DecodeUnit::decode(asm::sub(3, 1, 2));
        assert_eq!(inst.op, Opcode::Sub);
        let inst = DecodeUnit::decode(asm::mul(3, 1, 2));
        assert_eq!(inst.op, Opcode::Mul);
        let inst = DecodeUnit::decode(asm::div(3, 1, 2));
        assert_eq!(inst.op, Opcode::Div);
        let inst = DecodeUnit::decode(asm::remu(3, 1, 2));
        assert_eq!(inst.op, Opcode::Remu);
    }

    #[test]
    fn decodes_loads_and_stores() {
        let inst = DecodeUnit::decode(asm::lw(4, 10, -8));
        assert_eq!(inst.op, Opcode::Lw);
        assert_eq!(inst.rd, 4);
        assert_eq!(inst.rs1, 10);
        assert_eq!(inst.imm, -8);

        let inst = DecodeUnit::decode(asm::sw(4, 10, 12));
        assert_eq!(inst.op, Opcode::Sw);
        assert_eq!(inst.rs2, 4);
        assert_eq!(inst.rs1, 10);
        assert_eq!(inst.imm, 12);

        let inst = DecodeUnit::decode(asm::lbu(2, 3, 0));
        assert_eq!(inst.op, Opcode::Lbu);
    }

    #[test]
    fn decodes_branches_with_byte_displacement() {
        let inst = DecodeUnit::decode(asm::beq(1, 2, -16));
        assert_eq!(inst.op, Opcode::Beq);
        assert_eq!(inst.imm, -16);

        let inst = DecodeUnit::decode(asm::bne(1, 2, 32));
        assert_eq!(inst.op, Opcode::Bne);
        assert_eq!(inst.imm, 32);
    }

    #[test]
    fn decodes_jumps() {
        let inst = DecodeUnit::decode(asm::jal(1, 2048));
        assert_eq!(inst.op, Opcode::Jal);
        assert_eq!(inst.imm, 2048);

        let inst = DecodeUnit::decode(asm::jalr(0, 1, 0));
        assert_eq!(inst.op, Opcode::Jalr);
        assert_eq!(inst.rs1, 1);
    }

    #[test]
    fn decodes_upper_immediates_unshifted() {
        let inst = DecodeUnit::decode(asm::lui(7, 0xABCDE));
        assert_eq!(inst.op, Opcode::Lui);
        assert_eq!(inst.imm, 0xABCDE);

        let inst = DecodeUnit::decode(asm::auipc(7, 0x1));
        assert_eq!(inst.op, Opcode::Auipc);
        assert_eq!(inst.imm, 1);
    }

    #[test]
    fn decodes_csrrw_and_system() {
        let inst = DecodeUnit::decode(asm::csrrw(2, 0x830, 11));
        assert_eq!(inst.op, Opcode::Csrrw);
        assert_eq!(inst.csr, 0x830);
        assert_eq!(inst.rd, 2);
        assert_eq!(inst.rs1, 11);

        assert_eq!(DecodeUnit::decode(asm::ecall()).op, Opcode::Ecall);
        assert_eq!(DecodeUnit::decode(asm::ebreak()).op, Opcode::Ebreak);
        assert_eq!(DecodeUnit::decode(asm::fence()).op, Opcode::Fence);
    }

    #[test]
    fn decodes_amoadd() {
        let inst = DecodeUnit::decode(asm::amoadd_w(5, 6, 7));
        assert_eq!(inst.op, Opcode::AmoaddW);
        assert_eq!(inst.rd, 5);
        assert_eq!(inst.rs2, 6);
        assert_eq!(inst.rs1, 7);
    }

    #[test]
    fn decodes_custom_nesting_opcodes() {
        // low bytes 09 00 / 09 10 / 08 00
        assert_eq!(DecodeUnit::decode(0x0000_0009).op, Opcode::NoclPush);
        assert_eq!(DecodeUnit::decode(0x0000_1009).op, Opcode::NoclPop);
        assert_eq!(DecodeUnit::decode(0x0000_0008).op, Opcode::CacheLineFlush);
        assert_eq!(DecodeUnit::decode(asm::noclpush()).op, Opcode::NoclPush);
        assert_eq!(DecodeUnit::decode(asm::noclpop()).op, Opcode::NoclPop);
    }

    #[test]
    fn unrecognised_words_decode_to_unknown() {
        assert_eq!(DecodeUnit::decode(0xFFFF_FFFF).op, Opcode::Unknown);
        assert_eq!(DecodeUnit::decode(0).op, Opcode::Unknown);
        // MULH is outside the issued subset
        let mulh = 0x0220_90b3; // f7=1, f3=001
        assert_eq!(DecodeUnit::decode(mulh).op, Opcode::Unknown);
    }
}
