use std::fmt::{Display, Formatter};

/// Major opcode field, bits [6:0] of the raw word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive)]
pub enum Major {
    Load    = 0b0000011,
    MiscMem = 0b0001111,
    OpImm   = 0b0010011,
    Auipc   = 0b0010111,
    Store   = 0b0100011,
    Amo     = 0b0101111,
    Op      = 0b0110011,
    Lui     = 0b0110111,
    Branch  = 0b1100011,
    Jalr    = 0b1100111,
    Jal     = 0b1101111,
    System  = 0b1110011,
    /// Custom opcode space used by the nesting push/pop instructions.
    NoclOp  = 0b0001001,
    /// Custom opcode space used by the cache-line flush instruction.
    FlushOp = 0b0001000,
}

/// Fully-resolved operation kind. The three custom instructions keep the
/// distinguished numbers the decoder historically assigned them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Opcode {
    Add,
    Addi,
    Sub,
    Mul,
    Div,
    Divu,
    Rem,
    Remu,
    And,
    Andi,
    Or,
    Ori,
    Xor,
    Xori,
    Sll,
    Slli,
    Srl,
    Srli,
    Sra,
    Srai,
    Slt,
    Slti,
    Sltu,
    Sltiu,
    Lui,
    Auipc,
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    Sb,
    Sh,
    Sw,
    AmoaddW,
    Jal,
    Jalr,
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    Fence,
    Ecall,
    Ebreak,
    Csrrw,
    CacheLineFlush = 0xFD,
    NoclPop = 0xFE,
    NoclPush = 0xFF,
    #[default]
    Unknown = 0x100,
}

impl Opcode {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Addi => "ADDI",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Divu => "DIVU",
            Opcode::Rem => "REM",
            Opcode::Remu => "REMU",
            Opcode::And => "AND",
            Opcode::Andi => "ANDI",
            Opcode::Or => "OR",
            Opcode::Ori => "ORI",
            Opcode::Xor => "XOR",
            Opcode::Xori => "XORI",
            Opcode::Sll => "SLL",
            Opcode::Slli => "SLLI",
            Opcode::Srl => "SRL",
            Opcode::Srli => "SRLI",
            Opcode::Sra => "SRA",
            Opcode::Srai => "SRAI",
            Opcode::Slt => "SLT",
            Opcode::Slti => "SLTI",
            Opcode::Sltu => "SLTU",
            Opcode::Sltiu => "SLTIU",
            Opcode::Lui => "LUI",
            Opcode::Auipc => "AUIPC",
            Opcode::Lb => "LB",
            Opcode::Lh => "LH",
            Opcode::Lw => "LW",
            Opcode::Lbu => "LBU",
            Opcode::Lhu => "LHU",
            Opcode::Sb => "SB",
            Opcode::Sh => "SH",
            Opcode::Sw => "SW",
            Opcode::AmoaddW => "AMOADD.W",
            Opcode::Jal => "JAL",
            Opcode::Jalr => "JALR",
            Opcode::Beq => "BEQ",
            Opcode::Bne => "BNE",
            Opcode::Blt => "BLT",
            Opcode::Bge => "BGE",
            Opcode::Bltu => "BLTU",
            Opcode::Bgeu => "BGEU",
            Opcode::Fence => "FENCE",
            Opcode::Ecall => "ECALL",
            Opcode::Ebreak => "EBREAK",
            Opcode::Csrrw => "CSRRW",
            Opcode::CacheLineFlush => "CACHE_LINE_FLUSH",
            Opcode::NoclPop => "NOCLPOP",
            Opcode::NoclPush => "NOCLPUSH",
            Opcode::Unknown => "UNKNOWN",
        }
    }
}

/// A decoded instruction: operation kind plus up to three operand fields.
/// Produced by the decode oracle from the 4 bytes at a PC.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecodedInst {
    pub op: Opcode,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    /// Sign-extended immediate; for U-type ops this is the raw upper-20
    /// value, shifted at execute time.
    pub imm: i32,
    pub csr: u16,
    pub raw: u32,
}

impl Display for DecodedInst {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {{ raw: {:#010x}, rd: x{}, rs1: x{}, rs2: x{}, imm: {} }}",
            self.op.mnemonic(),
            self.raw,
            self.rd,
            self.rs1,
            self.rs2,
            self.imm
        )
    }
}
