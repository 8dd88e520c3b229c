//! Assembler for the [ravm](../ravm/index.html) register machine.
//!
//! [`assemble`] lexes and parses a source string into a label-resolved
//! instruction list, then encodes it into the binary image [`ravm::Machine`]
//! loads and runs. Lex and parse errors accumulate and are all returned
//! together; an undefined label reference is fatal and short-circuits code
//! generation, matching spec §7's error taxonomy.
//!
//! ```text
//! source text -> tokens -> parsed items + label table -> binary image
//! ```

mod ast;
mod codegen;
mod error;
mod labels;
mod lexer;
mod parser;

pub use ast::{Operand, ParsedItem};
pub use error::{Error, LinkError, ParseError, ParseErrorKind};
pub use labels::LabelTable;

/// Assembles `src` into a binary image ready to hand to
/// `ravm::Machine::load_code`.
pub fn assemble(src: &str) -> Result<Vec<u8>, Error> {
    let (items, labels, errors) = parser::parse(src);
    if !errors.is_empty() {
        return Err(Error::Parse(errors));
    }
    codegen::generate(&items, &labels).map_err(Error::from)
}

/// Runs just the parser, exposing the parsed item list, label table, and any
/// accumulated errors without requiring every label to resolve. Useful for
/// tooling that wants to inspect a program that doesn't yet assemble cleanly.
pub fn parse(src: &str) -> (Vec<ParsedItem>, LabelTable, Vec<ParseError>) {
    parser::parse(src)
}
