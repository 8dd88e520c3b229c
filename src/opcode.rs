use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive as _, ToPrimitive as _};
use util::EnumFromStr;
use util_derive::EnumFromStr;

/// The densely-assigned, append-only opcode set. Order is part of the wire
/// format: `Mnemonic::NOP as u8 == 0` and every later variant is the next
/// integer up, exactly the sequence the binary image encodes.
#[derive(Clone, Copy, Eq, PartialEq, Debug, FromPrimitive, ToPrimitive, EnumFromStr)]
pub enum Mnemonic {
    NOP,
    IN,
    OUT,
    LD,
    ST,
    XOR,
    ADD,
    SUB,
    MUL,
    DIV,
    IXOR,
    IADD,
    ISUB,
    IMUL,
    IDIV,
    INC,
    DEC,
    B,
    BZ,
    BN,
    BX,
    BXZ,
    BXN,
    HLT,
}

impl Mnemonic {
    pub fn opcode(self) -> u8 {
        self.to_u8().unwrap()
    }

    pub fn from_opcode(byte: u8) -> Option<Mnemonic> {
        num_traits::FromPrimitive::from_u8(byte)
    }

    /// Number of operand bytes following the opcode byte, per the shape
    /// table: zero operands, one register, one register + 4-byte immediate
    /// or label target, or two registers.
    pub fn operand_len(self) -> usize {
        use Mnemonic::*;
        match self {
            NOP | HLT => 0,
            IN | OUT | INC | DEC | BX | BXZ | BXN => 1,
            B | BZ | BN => 4,
            LD | ST | XOR | ADD | SUB | MUL | DIV => 2,
            IXOR | IADD | ISUB | IMUL | IDIV => 5,
        }
    }
}
