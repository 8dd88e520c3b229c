//! The parser's output shape: a flat list of parsed items plus the operands
//! they carry. Modeled as tagged sums (spec §3, §9) rather than the
//! `interface{}` + type switch the original Go compiler uses for the same
//! job.

use ravm::{Mnemonic, RegisterId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Register(RegisterId),
    Integer(i32),
    Identifier(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedItem {
    Label(String),
    OpCodeOnly(Mnemonic),
    Unary(Mnemonic, Operand),
    Binary(Mnemonic, Operand, Operand),
}
