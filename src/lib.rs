//! Register-based virtual machine: register file, data/code memory, and the
//! fetch/decode/execute loop. Code images are produced by the sibling `rasm`
//! crate; this crate only runs them.

pub mod constants;
pub mod io;
pub mod memory;
pub mod opcode;
pub mod processor;
pub mod register;

pub use io::IoHandle;
pub use opcode::Mnemonic;
pub use processor::{ExitCode, Machine};
pub use register::{register_index, RegisterId};

/// Byte order used for every multi-byte integer in the binary image and in
/// data memory.
pub use util::Endian;

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ByteOrder;
    use std::thread;

    fn reg_byte(id: RegisterId) -> u8 {
        register::register_index(id) as u8
    }

    fn push_reg(code: &mut Vec<u8>, op: Mnemonic, rd: RegisterId) {
        code.push(op.opcode());
        code.push(reg_byte(rd));
    }

    fn push_reg_reg(code: &mut Vec<u8>, op: Mnemonic, rd: RegisterId, rm: RegisterId) {
        code.push(op.opcode());
        code.push(reg_byte(rd));
        code.push(reg_byte(rm));
    }

    fn push_reg_imm(code: &mut Vec<u8>, op: Mnemonic, rd: RegisterId, imm: i32) {
        code.push(op.opcode());
        code.push(reg_byte(rd));
        let mut buf = [0u8; 4];
        Endian::write_i32(&mut buf, imm);
        code.extend_from_slice(&buf);
    }

    #[test]
    fn halt_alone_produces_a_one_byte_image_and_halts_immediately() {
        let code = vec![Mnemonic::HLT.opcode()];
        let (mut machine, _io) = Machine::new(0, code.len());
        machine.load_code(&code);
        assert_eq!(machine.run(), ExitCode::Halted);
    }

    #[test]
    fn echo_transports_values_in_order() {
        // L: IN R0 / OUT R0 / B L
        let mut code = Vec::new();
        let label = code.len() as i32;
        push_reg(&mut code, Mnemonic::IN, RegisterId::R0);
        push_reg(&mut code, Mnemonic::OUT, RegisterId::R0);
        code.push(Mnemonic::B.opcode());
        let mut buf = [0u8; 4];
        Endian::write_i32(&mut buf, label);
        code.extend_from_slice(&buf);

        let (mut machine, io) = Machine::new(0, code.len());
        machine.load_code(&code);
        let handle = thread::spawn(move || machine.run());

        for v in [1, 2, 3] {
            io.input.send(v).unwrap();
            assert_eq!(io.output.recv().unwrap(), v);
        }

        drop(io);
        // dropping both ends leaves the machine blocked forever on the next
        // IN; there is no in-band cancellation opcode, so we only assert the
        // observed echoes above.
        drop(handle);
    }

    #[test]
    fn division_by_zero_leaves_the_register_unchanged() {
        let mut code = Vec::new();
        push_reg_imm(&mut code, Mnemonic::IADD, RegisterId::R0, 5);
        push_reg_imm(&mut code, Mnemonic::IDIV, RegisterId::R0, 0);

        let (mut machine, _io) = Machine::new(0, code.len());
        machine.load_code(&code);
        assert_eq!(machine.run(), ExitCode::DivisionByZero);
        assert_eq!(machine.register(register::register_index(RegisterId::R0)), 5);
    }

    #[test]
    fn add_then_sub_matches_the_quantified_invariant() {
        let x: i32 = 17;
        let y: i32 = 9;
        let mut code = Vec::new();
        push_reg_imm(&mut code, Mnemonic::IADD, RegisterId::R0, x);
        push_reg_imm(&mut code, Mnemonic::ISUB, RegisterId::R0, y);
        code.push(Mnemonic::HLT.opcode());

        let (mut machine, _io) = Machine::new(0, code.len());
        machine.load_code(&code);
        assert_eq!(machine.run(), ExitCode::Halted);
        assert_eq!(machine.register(register::register_index(RegisterId::R0)), x - y);
    }

    #[test]
    fn ld_st_round_trip_through_data_memory() {
        let mut code = Vec::new();
        // R1 = 0 (index), R0 = 99, ST R0,R1, LD R2,R1
        push_reg_reg(&mut code, Mnemonic::XOR, RegisterId::R1, RegisterId::R1);
        push_reg_imm(&mut code, Mnemonic::IADD, RegisterId::R0, 99);
        push_reg_reg(&mut code, Mnemonic::ST, RegisterId::R0, RegisterId::R1);
        push_reg_reg(&mut code, Mnemonic::LD, RegisterId::R2, RegisterId::R1);
        code.push(Mnemonic::HLT.opcode());

        let (mut machine, _io) = Machine::new(1, code.len());
        machine.load_code(&code);
        assert_eq!(machine.run(), ExitCode::Halted);
        assert_eq!(machine.register(register::register_index(RegisterId::R2)), 99);
    }

    #[test]
    fn out_of_bounds_store_is_a_fatal_memory_error() {
        let mut code = Vec::new();
        push_reg_imm(&mut code, Mnemonic::IADD, RegisterId::R1, 4);
        push_reg_reg(&mut code, Mnemonic::ST, RegisterId::R0, RegisterId::R1);

        let (mut machine, _io) = Machine::new(1, code.len());
        machine.load_code(&code);
        assert_eq!(machine.run(), ExitCode::BadMemoryAccess);
    }

    #[test]
    fn illegal_opcode_byte_is_reported() {
        let code = vec![0xff];
        let (mut machine, _io) = Machine::new(0, code.len());
        machine.load_code(&code);
        assert_eq!(machine.run(), ExitCode::IllegalOpcode);
    }

    #[test]
    fn running_past_the_end_of_code_halts_without_error() {
        let code = vec![Mnemonic::NOP.opcode()];
        let (mut machine, _io) = Machine::new(0, code.len());
        machine.load_code(&code);
        assert_eq!(machine.run(), ExitCode::Halted);
    }
}
