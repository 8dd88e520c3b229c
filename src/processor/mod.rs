mod core;

use crate::io::{self, IoHandle};
use self::core::{Core, TickResult};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExitCode {
    Halted,              // HLT, or PC ran off the end of code
    DivisionByZero,      // DIV/IDIV with a zero divisor
    IllegalOpcode,       // code[PC] did not decode to a known mnemonic
    BadMemoryAccess,     // LD/ST addressed a data-memory index out of range
    BadCodeFetch,        // an operand read, or a branch target, fell outside code
}

/// A loaded, runnable instance of the register machine. Construct with
/// `Machine::new`, load an image exactly once with `load_code`, then drive
/// it to completion with `run` on a thread separate from whichever thread
/// holds the `IoHandle`'s sender/receiver.
pub struct Machine {
    core: Core,
}

impl Machine {
    /// `data_words` sizes data memory; `code_capacity` bounds how much code
    /// `load_code` will accept.
    pub fn new(data_words: usize, code_capacity: usize) -> (Machine, IoHandle) {
        let (machine_io, handle) = io::channel();

        (
            Machine {
                core: Core::new(data_words, code_capacity, machine_io),
            },
            handle,
        )
    }

    /// Loads the binary image. Must be called exactly once, before `run`.
    pub fn load_code(&mut self, code: &[u8]) {
        self.core.load_code(code);
    }

    pub fn register(&self, index: usize) -> i32 {
        self.core.register(index)
    }

    /// Runs fetch/decode/execute until HLT, code exhaustion, or a fatal
    /// runtime error.
    pub fn run(&mut self) -> ExitCode {
        loop {
            if let TickResult::Exit(exit_code) = self.core.tick() {
                return exit_code;
            }
        }
    }
}
