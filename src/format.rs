//! The instruction format table.
//!
//! Every recognized encoding is one [`InstFormat`]: an operation tag plus
//! an ordered list of bit fields. A field either consumes bits from the
//! stream (literal opcode bits to match, or a value to extract) or, with
//! a width of 0, injects a fixed value the encoding does not physically
//! carry (e.g. push/pop are always word-sized).
//!
//! Formats are tried in table order and the first match wins, so rows
//! sharing a first-byte literal must be distinguished by a later literal
//! (the group encodings like `1111011w` do this with their second-byte
//! /TTT literal). See table 4-12 of the 8086 manual for the encodings.

use crate::instruction::Op;

/// What a decoded bit field means to the instruction assembler.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Fixed opcode bits that must match for the format to apply.
    Literal,
    Mod,
    Reg,
    RegMem,
    Direction,
    Width,
    SignExtend,
    SegReg,
    /// Parsed displacement value (filled in by the decoder, never a
    /// stream field).
    Disp,
    /// Parsed immediate value (filled in by the decoder, or injected by
    /// a format for a synthetic count operand).
    Data,
    /// Flag: a displacement always follows, regardless of mod.
    HasDisp,
    /// Flag: trailing immediate data follows.
    HasData,
    /// Flag: the trailing data is a word if the width bit is set.
    WideDataIfW,
    /// Flag: the reg/mem operand is wide even if the width bit is not
    /// set (e.g. the DX port register of in/out).
    RegMemWide,
}

impl FieldKind {
    pub const COUNT: usize = 14;
}

/// One bit field of an instruction format. `bits == 0` means the field
/// consumes nothing from the stream and `value` is taken as-is.
#[derive(Copy, Clone, Debug)]
pub struct Field {
    pub kind: FieldKind,
    pub bits: u8,
    pub value: u8,
}

/// An operation tag plus the ordered fields that encode it.
#[derive(Copy, Clone, Debug)]
pub struct InstFormat {
    pub op: Op,
    pub fields: &'static [Field],
}

const fn field(kind: FieldKind, bits: u8, value: u8) -> Field {
    Field { kind, bits, value }
}

/// Opcode literal bits that must match the stream.
const fn lit(bits: u8, value: u8) -> Field {
    field(FieldKind::Literal, bits, value)
}

const MOD: Field = field(FieldKind::Mod, 2, 0);
const REG: Field = field(FieldKind::Reg, 3, 0);
const RM: Field = field(FieldKind::RegMem, 3, 0);
const SR: Field = field(FieldKind::SegReg, 2, 0);
const D: Field = field(FieldKind::Direction, 1, 0);
const W: Field = field(FieldKind::Width, 1, 0);
const S: Field = field(FieldKind::SignExtend, 1, 0);

/// Trailing immediate data follows the displacement (if any).
const DATA: Field = field(FieldKind::HasData, 0, 1);
/// The trailing data is a word iff the width bit is set.
const DATA_IF_W: Field = field(FieldKind::WideDataIfW, 0, 1);
/// The reg/mem operand is wide regardless of the width bit.
const RM_WIDE: Field = field(FieldKind::RegMemWide, 0, 1);

// Implied (zero-width) fields injecting values the encoding hard-codes.
const fn imp_d(value: u8) -> Field {
    field(FieldKind::Direction, 0, value)
}
const fn imp_w(value: u8) -> Field {
    field(FieldKind::Width, 0, value)
}
const fn imp_mod(value: u8) -> Field {
    field(FieldKind::Mod, 0, value)
}
const fn imp_reg(value: u8) -> Field {
    field(FieldKind::Reg, 0, value)
}
const fn imp_rm(value: u8) -> Field {
    field(FieldKind::RegMem, 0, value)
}
/// Inject an immediate operand without consuming stream bytes (the
/// implicit count of 1 in the shift/rotate encodings).
const fn imp_data(value: u8) -> Field {
    field(FieldKind::Data, 0, value)
}

const fn fmt(op: Op, fields: &'static [Field]) -> InstFormat {
    InstFormat { op, fields }
}

/// The format table, in match priority order.
pub static FORMATS: &[InstFormat] = &[
    // mov - register/memory to/from register
    fmt(Op::Mov, &[lit(6, 0b100010), D, W, MOD, REG, RM]),
    // mov - immediate to register/memory
    fmt(
        Op::Mov,
        &[lit(7, 0b1100011), W, MOD, lit(3, 0b000), RM, DATA, DATA_IF_W, imp_d(0)],
    ),
    // mov - immediate to register
    fmt(Op::Mov, &[lit(4, 0b1011), W, REG, DATA, DATA_IF_W, imp_d(1)]),
    // mov - memory to accumulator (direct address follows)
    fmt(
        Op::Mov,
        &[lit(7, 0b1010000), W, imp_d(1), imp_reg(0), imp_mod(0b00), imp_rm(0b110)],
    ),
    // mov - accumulator to memory
    fmt(
        Op::Mov,
        &[lit(7, 0b1010001), W, imp_d(0), imp_reg(0), imp_mod(0b00), imp_rm(0b110)],
    ),
    // mov - register/memory to segment register
    fmt(
        Op::Mov,
        &[lit(8, 0b10001110), MOD, lit(1, 0b0), SR, RM, imp_d(1), imp_w(1)],
    ),
    // mov - segment register to register/memory
    fmt(
        Op::Mov,
        &[lit(8, 0b10001100), MOD, lit(1, 0b0), SR, RM, imp_d(0), imp_w(1)],
    ),
    // add
    fmt(Op::Add, &[lit(6, 0b000000), D, W, MOD, REG, RM]),
    fmt(
        Op::Add,
        &[lit(6, 0b100000), S, W, MOD, lit(3, 0b000), RM, DATA, DATA_IF_W, imp_d(0)],
    ),
    fmt(Op::Add, &[lit(7, 0b0000010), W, imp_d(1), imp_reg(0), DATA, DATA_IF_W]),
    // adc
    fmt(Op::Adc, &[lit(6, 0b000100), D, W, MOD, REG, RM]),
    fmt(
        Op::Adc,
        &[lit(6, 0b100000), S, W, MOD, lit(3, 0b010), RM, DATA, DATA_IF_W, imp_d(0)],
    ),
    fmt(Op::Adc, &[lit(7, 0b0001010), W, imp_d(1), imp_reg(0), DATA, DATA_IF_W]),
    // sub
    fmt(Op::Sub, &[lit(6, 0b001010), D, W, MOD, REG, RM]),
    fmt(
        Op::Sub,
        &[lit(6, 0b100000), S, W, MOD, lit(3, 0b101), RM, DATA, DATA_IF_W, imp_d(0)],
    ),
    fmt(Op::Sub, &[lit(7, 0b0010110), W, imp_d(1), imp_reg(0), DATA, DATA_IF_W]),
    // sbb
    fmt(Op::Sbb, &[lit(6, 0b000110), D, W, MOD, REG, RM]),
    fmt(
        Op::Sbb,
        &[lit(6, 0b100000), S, W, MOD, lit(3, 0b011), RM, DATA, DATA_IF_W, imp_d(0)],
    ),
    fmt(Op::Sbb, &[lit(7, 0b0001110), W, imp_d(1), imp_reg(0), DATA, DATA_IF_W]),
    // cmp
    fmt(Op::Cmp, &[lit(6, 0b001110), D, W, MOD, REG, RM]),
    fmt(
        Op::Cmp,
        &[lit(6, 0b100000), S, W, MOD, lit(3, 0b111), RM, DATA, DATA_IF_W, imp_d(0)],
    ),
    fmt(Op::Cmp, &[lit(7, 0b0011110), W, imp_d(1), imp_reg(0), DATA, DATA_IF_W]),
    // and
    fmt(Op::And, &[lit(6, 0b001000), D, W, MOD, REG, RM]),
    fmt(
        Op::And,
        &[lit(6, 0b100000), S, W, MOD, lit(3, 0b100), RM, DATA, DATA_IF_W, imp_d(0)],
    ),
    fmt(Op::And, &[lit(7, 0b0010010), W, imp_d(1), imp_reg(0), DATA, DATA_IF_W]),
    // or
    fmt(Op::Or, &[lit(6, 0b000010), D, W, MOD, REG, RM]),
    fmt(
        Op::Or,
        &[lit(6, 0b100000), S, W, MOD, lit(3, 0b001), RM, DATA, DATA_IF_W, imp_d(0)],
    ),
    fmt(Op::Or, &[lit(7, 0b0000110), W, imp_d(1), imp_reg(0), DATA, DATA_IF_W]),
    // xor
    fmt(Op::Xor, &[lit(6, 0b001100), D, W, MOD, REG, RM]),
    fmt(
        Op::Xor,
        &[lit(6, 0b100000), S, W, MOD, lit(3, 0b110), RM, DATA, DATA_IF_W, imp_d(0)],
    ),
    fmt(Op::Xor, &[lit(7, 0b0011010), W, imp_d(1), imp_reg(0), DATA, DATA_IF_W]),
    // test
    fmt(Op::Test, &[lit(7, 0b1000010), W, MOD, REG, RM, imp_d(0)]),
    fmt(
        Op::Test,
        &[lit(7, 0b1111011), W, MOD, lit(3, 0b000), RM, DATA, DATA_IF_W, imp_d(0)],
    ),
    fmt(Op::Test, &[lit(7, 0b1010100), W, imp_d(1), imp_reg(0), DATA, DATA_IF_W]),
    // push
    fmt(Op::Push, &[lit(5, 0b01010), REG, imp_w(1), imp_d(1)]),
    fmt(Op::Push, &[lit(8, 0b11111111), MOD, lit(3, 0b110), RM, imp_w(1), imp_d(0)]),
    fmt(Op::Push, &[lit(3, 0b000), SR, lit(3, 0b110), imp_d(1), imp_w(1)]),
    // pop
    fmt(Op::Pop, &[lit(5, 0b01011), REG, imp_w(1), imp_d(1)]),
    fmt(Op::Pop, &[lit(8, 0b10001111), MOD, lit(3, 0b000), RM, imp_w(1), imp_d(0)]),
    fmt(Op::Pop, &[lit(3, 0b000), SR, lit(3, 0b111), imp_d(1), imp_w(1)]),
    // xchg - register/memory with register
    fmt(Op::Xchg, &[lit(7, 0b1000011), W, MOD, REG, RM, imp_d(0)]),
    // xchg - register with accumulator
    fmt(
        Op::Xchg,
        &[lit(5, 0b10010), REG, imp_w(1), imp_mod(0b11), imp_rm(0b000), imp_d(0)],
    ),
    // in - fixed port
    fmt(Op::In, &[lit(7, 0b1110010), W, imp_d(1), imp_reg(0), DATA]),
    // in - variable port (dx)
    fmt(
        Op::In,
        &[lit(7, 0b1110110), W, imp_d(1), imp_reg(0), imp_mod(0b11), imp_rm(0b010), RM_WIDE],
    ),
    // out - fixed port
    fmt(Op::Out, &[lit(7, 0b1110011), W, imp_d(0), imp_reg(0), DATA]),
    // out - variable port (dx)
    fmt(
        Op::Out,
        &[lit(7, 0b1110111), W, imp_d(0), imp_reg(0), imp_mod(0b11), imp_rm(0b010), RM_WIDE],
    ),
    // inc
    fmt(Op::Inc, &[lit(7, 0b1111111), W, MOD, lit(3, 0b000), RM, imp_d(0)]),
    fmt(Op::Inc, &[lit(5, 0b01000), REG, imp_w(1), imp_d(1)]),
    // dec
    fmt(Op::Dec, &[lit(7, 0b1111111), W, MOD, lit(3, 0b001), RM, imp_d(0)]),
    fmt(Op::Dec, &[lit(5, 0b01001), REG, imp_w(1), imp_d(1)]),
    // 1111011w group: not/neg/mul/imul/div/idiv (test imm is above)
    fmt(Op::Not, &[lit(7, 0b1111011), W, MOD, lit(3, 0b010), RM, imp_d(0)]),
    fmt(Op::Neg, &[lit(7, 0b1111011), W, MOD, lit(3, 0b011), RM, imp_d(0)]),
    fmt(Op::Mul, &[lit(7, 0b1111011), W, MOD, lit(3, 0b100), RM, imp_d(0)]),
    fmt(Op::Imul, &[lit(7, 0b1111011), W, MOD, lit(3, 0b101), RM, imp_d(0)]),
    fmt(Op::Div, &[lit(7, 0b1111011), W, MOD, lit(3, 0b110), RM, imp_d(0)]),
    fmt(Op::Idiv, &[lit(7, 0b1111011), W, MOD, lit(3, 0b111), RM, imp_d(0)]),
    // shifts/rotates with an implicit count of 1
    fmt(Op::Rol, &[lit(7, 0b1101000), W, MOD, lit(3, 0b000), RM, imp_d(0), imp_data(1)]),
    fmt(Op::Ror, &[lit(7, 0b1101000), W, MOD, lit(3, 0b001), RM, imp_d(0), imp_data(1)]),
    fmt(Op::Rcl, &[lit(7, 0b1101000), W, MOD, lit(3, 0b010), RM, imp_d(0), imp_data(1)]),
    fmt(Op::Rcr, &[lit(7, 0b1101000), W, MOD, lit(3, 0b011), RM, imp_d(0), imp_data(1)]),
    fmt(Op::Shl, &[lit(7, 0b1101000), W, MOD, lit(3, 0b100), RM, imp_d(0), imp_data(1)]),
    fmt(Op::Shr, &[lit(7, 0b1101000), W, MOD, lit(3, 0b101), RM, imp_d(0), imp_data(1)]),
    fmt(Op::Sar, &[lit(7, 0b1101000), W, MOD, lit(3, 0b111), RM, imp_d(0), imp_data(1)]),
    // lea - always a word-wide register destination
    fmt(Op::Lea, &[lit(8, 0b10001101), MOD, REG, RM, imp_d(1), imp_w(1)]),
    // no-operand instructions
    fmt(Op::Xlat, &[lit(8, 0b11010111)]),
    fmt(Op::Lahf, &[lit(8, 0b10011111)]),
    fmt(Op::Sahf, &[lit(8, 0b10011110)]),
    fmt(Op::Pushf, &[lit(8, 0b10011100)]),
    fmt(Op::Popf, &[lit(8, 0b10011101)]),
];
