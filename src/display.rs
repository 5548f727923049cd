//! Text rendering of decoded instructions, nasm-compatible so the output
//! can be fed back through an assembler.

use std::fmt;

use crate::instruction::{
    AddressExpr, EffectiveAddress, Immediate, Instruction, Op, Operand, Register, SegmentReg,
};

/// Register names indexed by register index, then by width.
/// See table 4-9.
const REGISTERS: [[&str; 2]; 8] = [
    ["al", "ax"],
    ["cl", "cx"],
    ["dl", "dx"],
    ["bl", "bx"],
    ["ah", "sp"],
    ["ch", "bp"],
    ["dh", "si"],
    ["bh", "di"],
];

const SEG_REGISTERS: [&str; 4] = ["es", "cs", "ss", "ds"];

impl Op {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::Mov => "mov",
            Op::Add => "add",
            Op::Adc => "adc",
            Op::Sub => "sub",
            Op::Sbb => "sbb",
            Op::Cmp => "cmp",
            Op::And => "and",
            Op::Or => "or",
            Op::Xor => "xor",
            Op::Test => "test",
            Op::Push => "push",
            Op::Pop => "pop",
            Op::Xchg => "xchg",
            Op::In => "in",
            Op::Out => "out",
            Op::Inc => "inc",
            Op::Dec => "dec",
            Op::Neg => "neg",
            Op::Not => "not",
            Op::Mul => "mul",
            Op::Imul => "imul",
            Op::Div => "div",
            Op::Idiv => "idiv",
            Op::Rol => "rol",
            Op::Ror => "ror",
            Op::Rcl => "rcl",
            Op::Rcr => "rcr",
            Op::Shl => "shl",
            Op::Shr => "shr",
            Op::Sar => "sar",
            Op::Lea => "lea",
            Op::Xlat => "xlat",
            Op::Lahf => "lahf",
            Op::Sahf => "sahf",
            Op::Pushf => "pushf",
            Op::Popf => "popf",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", REGISTERS[self.idx as usize][self.wide as usize])
    }
}

impl fmt::Display for SegmentReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", SEG_REGISTERS[*self as usize])
    }
}

impl AddressExpr {
    /// The base/index expression text. Empty for a direct address.
    fn expr_text(self) -> &'static str {
        match self {
            AddressExpr::BxSi => "bx + si",
            AddressExpr::BxDi => "bx + di",
            AddressExpr::BpSi => "bp + si",
            AddressExpr::BpDi => "bp + di",
            AddressExpr::Si => "si",
            AddressExpr::Di => "di",
            AddressExpr::Bp => "bp",
            AddressExpr::Bx => "bx",
            AddressExpr::Direct => "",
        }
    }
}

impl fmt::Display for EffectiveAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.expr, self.disp) {
            (AddressExpr::Direct, disp) => {
                if disp < 0 {
                    write!(f, "[-{}]", disp.unsigned_abs())
                } else {
                    write!(f, "[{}]", disp)
                }
            }
            (expr, 0) => write!(f, "[{}]", expr.expr_text()),
            (expr, disp) => {
                let sign = if disp < 0 { '-' } else { '+' };
                write!(f, "[{} {} {}]", expr.expr_text(), sign, disp.unsigned_abs())
            }
        }
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The size prefix keeps the operand unambiguous when the other
        // operand is memory
        let size = if self.wide { "word" } else { "byte" };
        write!(f, "{} {}", size, self.value as i16)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => Ok(()),
            Operand::Register(reg) => write!(f, "{}", reg),
            Operand::SegmentReg(sr) => write!(f, "{}", sr),
            Operand::Immediate(imm) => write!(f, "{}", imm),
            Operand::Memory(addr) => write!(f, "{}", addr),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)?;
        let mut sep = " ";
        for operand in &self.operands {
            if operand.is_none() {
                continue;
            }
            write!(f, "{}", sep)?;
            // For stack and unary/shift ops the mnemonic does not imply
            // an operand size, so a memory operand gets one explicitly
            if matches!(operand, Operand::Memory(_)) && self.op.needs_mem_size_hint() {
                write!(f, "{} ", if self.wide { "word" } else { "byte" })?;
            }
            write!(f, "{}", operand)?;
            sep = ", ";
        }
        Ok(())
    }
}
