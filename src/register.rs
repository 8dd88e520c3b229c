use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::ToPrimitive as _;
use util::EnumFromStr;
use util_derive::EnumFromStr;

/// The sixteen register names an assembly operand can name. CPSR and SPSR
/// are addressed by the machine internally (see `constants::CPSR_INDEX`)
/// and have no operand-level identity.
#[derive(Clone, Copy, Eq, PartialEq, Debug, FromPrimitive, ToPrimitive, EnumFromStr)]
pub enum RegisterId {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
}

pub const SP: RegisterId = RegisterId::R13;
pub const LR: RegisterId = RegisterId::R14;
pub const PC: RegisterId = RegisterId::R15;

/// Index of `id` within the register file.
pub fn register_index(id: RegisterId) -> usize {
    id.to_usize().unwrap()
}

/// Reconstructs a `RegisterId` from the one-byte operand encoding used in
/// the binary image (high nibble must already be zero; enforced by the
/// caller, which rejects decode results outside 0..=15).
pub fn register_from_byte(byte: u8) -> Option<RegisterId> {
    num_traits::FromPrimitive::from_u8(byte)
}
