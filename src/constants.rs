//! Register-file layout and CPSR flag bits.

/// General-purpose R0..R12, plus SP/LR/PC (R13/R14/R15), plus CPSR and SPSR.
/// Only the first 16 slots are reachable from an assembly operand; CPSR and
/// SPSR are maintained by the machine itself.
pub const REGISTER_COUNT: usize = 18;

pub const CPSR_INDEX: usize = 16;
pub const SPSR_INDEX: usize = 17;

pub const COND_NEG: i32 = 1 << 31;
pub const COND_ZERO: i32 = 1 << 30;
pub const COND_CARRY: i32 = 1 << 29;
pub const COND_OVERFLOW: i32 = 1 << 28;
