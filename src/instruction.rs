//! The decoded instruction data model: operands, operand equality, and
//! the instruction struct itself.

/// One of the 8 general registers. The index follows the standard 8086
/// register encoding, so its meaning depends on the width: index 0 is
/// al when narrow and ax when wide, index 4 is ah when narrow and sp
/// when wide, and so on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Register {
    pub idx: u8,
    pub wide: bool,
}

impl Register {
    pub fn new(idx: u8, wide: bool) -> Self {
        Register { idx: idx & 0b111, wide }
    }
}

/// Segment register selected by a 2-bit SR field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SegmentReg {
    Es,
    Cs,
    Ss,
    Ds,
}

impl SegmentReg {
    /// SR (Segment Register) Field Encoding
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => SegmentReg::Es,
            0b01 => SegmentReg::Cs,
            0b10 => SegmentReg::Ss,
            _ => SegmentReg::Ds,
        }
    }
}

/// The 8 effective address expressions selected by the r/m field, plus
/// the direct-address form (`mod=00 rm=110`, where a 16-bit absolute
/// address follows instead of [bp]).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AddressExpr {
    BxSi,
    BxDi,
    BpSi,
    BpDi,
    Si,
    Di,
    Bp,
    Bx,
    Direct,
}

impl AddressExpr {
    /// R/M (Register/Memory) Field Encoding for the memory modes.
    /// See table 4-10. The direct-address special case is decided by the
    /// caller, since it also depends on the mod field.
    pub fn from_rm(rm: u8) -> Self {
        match rm & 0b111 {
            0b000 => AddressExpr::BxSi,
            0b001 => AddressExpr::BxDi,
            0b010 => AddressExpr::BpSi,
            0b011 => AddressExpr::BpDi,
            0b100 => AddressExpr::Si,
            0b101 => AddressExpr::Di,
            0b110 => AddressExpr::Bp,
            _ => AddressExpr::Bx,
        }
    }
}

/// A memory operand: an address expression plus a signed displacement
/// (0 when the encoding carried none).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EffectiveAddress {
    pub expr: AddressExpr,
    pub disp: i16,
}

/// An immediate operand. The raw 16-bit value is stored as parsed from
/// the stream (narrow reads are already sign-extended); `wide` records
/// whether the encoding carried a word or a byte.
#[derive(Copy, Clone, Debug)]
pub struct Immediate {
    pub value: u16,
    pub wide: bool,
}

impl PartialEq for Immediate {
    /// Byte immediates compare truncated to their low byte, so 0x00FF
    /// and 0xFFFF are the same byte immediate. Word immediates compare
    /// all 16 bits. Differing widths never compare equal.
    fn eq(&self, rhs: &Self) -> bool {
        if self.wide != rhs.wide {
            return false;
        }
        if self.wide {
            self.value == rhs.value
        } else {
            self.value as u8 == rhs.value as u8
        }
    }
}

/// A single operand slot of a decoded instruction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Operand {
    None,
    Register(Register),
    SegmentReg(SegmentReg),
    Immediate(Immediate),
    Memory(EffectiveAddress),
}

impl Operand {
    pub fn is_none(&self) -> bool {
        matches!(self, Operand::None)
    }

    pub fn reg(idx: u8, wide: bool) -> Self {
        Operand::Register(Register::new(idx, wide))
    }

    pub fn imm(value: u16, wide: bool) -> Self {
        Operand::Immediate(Immediate { value, wide })
    }

    pub fn mem(expr: AddressExpr, disp: i16) -> Self {
        Operand::Memory(EffectiveAddress { expr, disp })
    }
}

/// The recognized operations. One mnemonic each; see the format table in
/// `format.rs` for the encodings that produce them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Mov,
    Add,
    Adc,
    Sub,
    Sbb,
    Cmp,
    And,
    Or,
    Xor,
    Test,
    Push,
    Pop,
    Xchg,
    In,
    Out,
    Inc,
    Dec,
    Neg,
    Not,
    Mul,
    Imul,
    Div,
    Idiv,
    Rol,
    Ror,
    Rcl,
    Rcr,
    Shl,
    Shr,
    Sar,
    Lea,
    Xlat,
    Lahf,
    Sahf,
    Pushf,
    Popf,
}

impl Op {
    /// Ops where the mnemonic alone does not tell the assembler the
    /// operand size, so a memory operand needs a byte/word prefix.
    pub fn needs_mem_size_hint(self) -> bool {
        matches!(
            self,
            Op::Push
                | Op::Pop
                | Op::Inc
                | Op::Dec
                | Op::Neg
                | Op::Not
                | Op::Mul
                | Op::Imul
                | Op::Div
                | Op::Idiv
                | Op::Rol
                | Op::Ror
                | Op::Rcl
                | Op::Rcr
                | Op::Shl
                | Op::Shr
                | Op::Sar
        )
    }
}

/// A fully decoded instruction: an operation plus two operand slots,
/// either of which may be `Operand::None`.
#[derive(Copy, Clone, Debug)]
pub struct Instruction {
    pub op: Op,
    pub operands: [Operand; 2],
    /// The decoded width bit (or implied width), kept so rendering can
    /// size-annotate memory operands. Not part of instruction equality.
    pub wide: bool,
}

impl Instruction {
    pub fn new(op: Op, op1: Operand, op2: Operand) -> Self {
        Instruction {
            op,
            operands: [op1, op2],
            wide: true,
        }
    }
}

impl PartialEq for Instruction {
    fn eq(&self, rhs: &Self) -> bool {
        self.op == rhs.op && self.operands == rhs.operands
    }
}
