use byteorder::ByteOrder;
use log::{error, trace};

use crate::constants::{self, COND_CARRY, COND_NEG, COND_OVERFLOW, COND_ZERO};
use crate::io::Io;
use crate::memory::DataMemory;
use crate::opcode::Mnemonic;
use crate::register::register_from_byte;
use crate::Endian;

use super::ExitCode;

pub enum TickResult {
    Running,
    Exit(ExitCode),
}

pub struct Core {
    registers: [i32; constants::REGISTER_COUNT],
    data: DataMemory,
    code: Vec<u8>,
    code_capacity: usize,
    io: Io,
}

const PC_INDEX: usize = 15;

impl Core {
    pub fn new(data_words: usize, code_capacity: usize, io: Io) -> Core {
        Core {
            registers: [0; constants::REGISTER_COUNT],
            data: DataMemory::new(data_words),
            code: Vec::new(),
            code_capacity,
            io,
        }
    }

    pub fn load_code(&mut self, code: &[u8]) {
        assert!(
            code.len() <= self.code_capacity,
            "code image exceeds configured capacity"
        );
        self.code = Vec::from(code);
    }

    pub fn register(&self, index: usize) -> i32 {
        self.registers[index]
    }

    fn pc(&self) -> usize {
        self.registers[PC_INDEX] as usize
    }

    fn set_pc(&mut self, value: usize) {
        self.registers[PC_INDEX] = value as i32;
    }

    fn fetch_register(&self, at: usize) -> Option<usize> {
        let byte = self.code.get(at).copied()?;
        register_from_byte(byte & 0x0f).map(crate::register::register_index)
    }

    fn fetch_i32(&self, at: usize) -> Option<i32> {
        let end = at.checked_add(4)?;
        if end > self.code.len() {
            return None;
        }
        Some(Endian::read_i32(&self.code[at..end]))
    }

    /// Fetch, decode, dispatch one instruction. Returns `Exit` on HLT, code
    /// exhaustion, or a fatal runtime error; otherwise leaves PC past the
    /// retired instruction and returns `Running`.
    pub fn tick(&mut self) -> TickResult {
        let pc = self.pc();

        if pc >= self.code.len() {
            return TickResult::Exit(ExitCode::Halted);
        }

        let opcode_byte = self.code[pc];
        let mnemonic = match Mnemonic::from_opcode(opcode_byte) {
            Some(m) => m,
            None => {
                error!("illegal opcode byte {:#04x} at pc={}", opcode_byte, pc);
                return TickResult::Exit(ExitCode::IllegalOpcode);
            }
        };

        if let Mnemonic::HLT = mnemonic {
            trace!("retire HLT pc={}", pc);
            return TickResult::Exit(ExitCode::Halted);
        }

        let operands_at = pc + 1;
        if operands_at + mnemonic.operand_len() > self.code.len() {
            error!("truncated operand for {:?} at pc={}", mnemonic, pc);
            return TickResult::Exit(ExitCode::BadCodeFetch);
        }

        trace!("retire {:?} pc={}", mnemonic, pc);

        let mut next_pc = operands_at + mnemonic.operand_len();

        let result = match mnemonic {
            Mnemonic::NOP => Ok(()),
            Mnemonic::HLT => unreachable!(),

            Mnemonic::IN => self.op_in(operands_at),
            Mnemonic::OUT => self.op_out(operands_at),

            Mnemonic::LD => self.op_load(operands_at),
            Mnemonic::ST => self.op_store(operands_at),

            Mnemonic::XOR => self.alu_reg_logical(operands_at, |a, b| a ^ b),
            Mnemonic::ADD => self.alu_reg(operands_at, wrapping_add),
            Mnemonic::SUB => self.alu_reg(operands_at, wrapping_sub),
            Mnemonic::MUL => self.alu_reg(operands_at, wrapping_mul),
            Mnemonic::DIV => self.alu_div_reg(operands_at),

            Mnemonic::IXOR => self.alu_imm_logical(operands_at, |a, b| a ^ b),
            Mnemonic::IADD => self.alu_imm(operands_at, wrapping_add),
            Mnemonic::ISUB => self.alu_imm(operands_at, wrapping_sub),
            Mnemonic::IMUL => self.alu_imm(operands_at, wrapping_mul),
            Mnemonic::IDIV => self.alu_div_imm(operands_at),

            Mnemonic::INC => self.alu_unary(operands_at, |a| wrapping_add(a, 1)),
            Mnemonic::DEC => self.alu_unary(operands_at, |a| wrapping_sub(a, 1)),

            Mnemonic::B => self.branch_absolute(operands_at, &mut next_pc, true),
            Mnemonic::BZ => {
                let taken = self.flag(COND_ZERO);
                self.branch_absolute(operands_at, &mut next_pc, taken)
            }
            Mnemonic::BN => {
                let taken = self.flag(COND_NEG);
                self.branch_absolute(operands_at, &mut next_pc, taken)
            }

            Mnemonic::BX => self.branch_register(operands_at, &mut next_pc, true),
            Mnemonic::BXZ => {
                let taken = self.flag(COND_ZERO);
                self.branch_register(operands_at, &mut next_pc, taken)
            }
            Mnemonic::BXN => {
                let taken = self.flag(COND_NEG);
                self.branch_register(operands_at, &mut next_pc, taken)
            }
        };

        match result {
            Ok(()) => {
                self.set_pc(next_pc);
                TickResult::Running
            }
            Err(exit_code) => TickResult::Exit(exit_code),
        }
    }

    fn flag(&self, bit: i32) -> bool {
        self.registers[constants::CPSR_INDEX] & bit != 0
    }

    fn set_flag(&mut self, bit: i32, value: bool) {
        if value {
            self.registers[constants::CPSR_INDEX] |= bit;
        } else {
            self.registers[constants::CPSR_INDEX] &= !bit;
        }
    }

    fn update_flags_nz(&mut self, result: i32) {
        self.set_flag(COND_ZERO, result == 0);
        self.set_flag(COND_NEG, result < 0);
    }

    /// Logical ops cannot overflow; only N/Z change, C/V are left as-is.
    fn update_flags_logical(&mut self, result: i32) {
        self.update_flags_nz(result);
    }

    fn update_flags(&mut self, result: i32, carry: bool, overflow: bool) {
        self.update_flags_nz(result);
        self.set_flag(COND_CARRY, carry);
        self.set_flag(COND_OVERFLOW, overflow);
    }

    fn op_in(&mut self, at: usize) -> Result<(), ExitCode> {
        let rd = self.fetch_register(at).ok_or(ExitCode::BadCodeFetch)?;
        let value = self.io.input.recv().unwrap_or_else(|_| block_forever());
        self.registers[rd] = value;
        Ok(())
    }

    fn op_out(&mut self, at: usize) -> Result<(), ExitCode> {
        let rd = self.fetch_register(at).ok_or(ExitCode::BadCodeFetch)?;
        let value = self.registers[rd];
        if self.io.output.send(value).is_err() {
            block_forever();
        }
        Ok(())
    }

    fn op_load(&mut self, at: usize) -> Result<(), ExitCode> {
        let rd = self.fetch_register(at).ok_or(ExitCode::BadCodeFetch)?;
        let rm = self.fetch_register(at + 1).ok_or(ExitCode::BadCodeFetch)?;
        let value = self
            .data
            .read(self.registers[rm])
            .ok_or(ExitCode::BadMemoryAccess)?;
        self.registers[rd] = value;
        Ok(())
    }

    fn op_store(&mut self, at: usize) -> Result<(), ExitCode> {
        let rd = self.fetch_register(at).ok_or(ExitCode::BadCodeFetch)?;
        let rm = self.fetch_register(at + 1).ok_or(ExitCode::BadCodeFetch)?;
        if self.data.write(self.registers[rm], self.registers[rd]) {
            Ok(())
        } else {
            Err(ExitCode::BadMemoryAccess)
        }
    }

    fn alu_reg(
        &mut self,
        at: usize,
        op: impl Fn(i32, i32) -> (i32, bool, bool),
    ) -> Result<(), ExitCode> {
        let rd = self.fetch_register(at).ok_or(ExitCode::BadCodeFetch)?;
        let rm = self.fetch_register(at + 1).ok_or(ExitCode::BadCodeFetch)?;
        let (result, carry, overflow) = op(self.registers[rd], self.registers[rm]);
        self.registers[rd] = result;
        self.update_flags(result, carry, overflow);
        Ok(())
    }

    fn alu_imm(
        &mut self,
        at: usize,
        op: impl Fn(i32, i32) -> (i32, bool, bool),
    ) -> Result<(), ExitCode> {
        let rd = self.fetch_register(at).ok_or(ExitCode::BadCodeFetch)?;
        let imm = self.fetch_i32(at + 1).ok_or(ExitCode::BadCodeFetch)?;
        let (result, carry, overflow) = op(self.registers[rd], imm);
        self.registers[rd] = result;
        self.update_flags(result, carry, overflow);
        Ok(())
    }

    fn alu_reg_logical(&mut self, at: usize, op: impl Fn(i32, i32) -> i32) -> Result<(), ExitCode> {
        let rd = self.fetch_register(at).ok_or(ExitCode::BadCodeFetch)?;
        let rm = self.fetch_register(at + 1).ok_or(ExitCode::BadCodeFetch)?;
        let result = op(self.registers[rd], self.registers[rm]);
        self.registers[rd] = result;
        self.update_flags_logical(result);
        Ok(())
    }

    fn alu_imm_logical(&mut self, at: usize, op: impl Fn(i32, i32) -> i32) -> Result<(), ExitCode> {
        let rd = self.fetch_register(at).ok_or(ExitCode::BadCodeFetch)?;
        let imm = self.fetch_i32(at + 1).ok_or(ExitCode::BadCodeFetch)?;
        let result = op(self.registers[rd], imm);
        self.registers[rd] = result;
        self.update_flags_logical(result);
        Ok(())
    }

    fn alu_unary(
        &mut self,
        at: usize,
        op: impl Fn(i32) -> (i32, bool, bool),
    ) -> Result<(), ExitCode> {
        let rd = self.fetch_register(at).ok_or(ExitCode::BadCodeFetch)?;
        let (result, carry, overflow) = op(self.registers[rd]);
        self.registers[rd] = result;
        self.update_flags(result, carry, overflow);
        Ok(())
    }

    fn alu_div_reg(&mut self, at: usize) -> Result<(), ExitCode> {
        let rd = self.fetch_register(at).ok_or(ExitCode::BadCodeFetch)?;
        let rm = self.fetch_register(at + 1).ok_or(ExitCode::BadCodeFetch)?;
        self.div(rd, self.registers[rm])
    }

    fn alu_div_imm(&mut self, at: usize) -> Result<(), ExitCode> {
        let rd = self.fetch_register(at).ok_or(ExitCode::BadCodeFetch)?;
        let imm = self.fetch_i32(at + 1).ok_or(ExitCode::BadCodeFetch)?;
        self.div(rd, imm)
    }

    fn div(&mut self, rd: usize, divisor: i32) -> Result<(), ExitCode> {
        if divisor == 0 {
            error!("division by zero, rd={}", rd);
            return Err(ExitCode::DivisionByZero);
        }
        let (result, overflow) = self.registers[rd].overflowing_div(divisor);
        self.registers[rd] = result;
        self.update_flags(result, false, overflow);
        Ok(())
    }

    fn branch_absolute(
        &mut self,
        at: usize,
        next_pc: &mut usize,
        taken: bool,
    ) -> Result<(), ExitCode> {
        let target = self.fetch_i32(at).ok_or(ExitCode::BadCodeFetch)?;
        if taken {
            *next_pc = target.max(0) as usize;
        }
        Ok(())
    }

    fn branch_register(
        &mut self,
        at: usize,
        next_pc: &mut usize,
        taken: bool,
    ) -> Result<(), ExitCode> {
        let rd = self.fetch_register(at).ok_or(ExitCode::BadCodeFetch)?;
        if taken {
            *next_pc = self.registers[rd].max(0) as usize;
        }
        Ok(())
    }
}

/// A host that severs both I/O endpoints leaves the VM blocked forever on
/// the next IN/OUT; there is no in-band cancellation opcode. `mpsc` reports
/// a severed channel as an immediate `Err` rather than a block, so IN/OUT
/// park the thread themselves to turn disconnection into permanent
/// suspension instead of silently progressing.
fn block_forever() -> ! {
    loop {
        std::thread::park();
    }
}

fn wrapping_add(a: i32, b: i32) -> (i32, bool, bool) {
    let (result, overflow) = a.overflowing_add(b);
    let carry = (a as i64 + b as i64) as u64 > u32::MAX as u64;
    (result, carry, overflow)
}

fn wrapping_sub(a: i32, b: i32) -> (i32, bool, bool) {
    let (result, overflow) = a.overflowing_sub(b);
    let carry = (a as i64) < (b as i64);
    (result, carry, overflow)
}

fn wrapping_mul(a: i32, b: i32) -> (i32, bool, bool) {
    let (result, overflow) = a.overflowing_mul(b);
    (result, overflow, overflow)
}
