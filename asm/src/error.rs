use ravm::Mnemonic;
use std::error::Error as StdError;
use std::fmt;

/// What went wrong while turning one token (or the absence of one) into
/// part of the parsed item list. Carries no position itself; `ParseError`
/// pairs it with the offending token's byte offset so the two travel
/// together the way spec §7 requires ("reported with the position of the
/// offending token").
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    IllegalByte,
    ExpectedColonAfterLabel,
    ExpectedOperand,
    ExpectedComma,
    WrongOperandKind { mnemonic: Mnemonic },
    UnknownMnemonic,
    DuplicateLabel(String),
    MalformedInteger(String),
    UnexpectedEof,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::IllegalByte => write!(f, "illegal byte in source"),
            ParseErrorKind::ExpectedColonAfterLabel => write!(f, "expected ':' after label name"),
            ParseErrorKind::ExpectedOperand => write!(f, "expected an operand"),
            ParseErrorKind::ExpectedComma => write!(f, "expected ',' between operands"),
            ParseErrorKind::WrongOperandKind { mnemonic } => {
                write!(f, "wrong operand kind for {:?}", mnemonic)
            }
            ParseErrorKind::UnknownMnemonic => write!(f, "unknown mnemonic"),
            ParseErrorKind::DuplicateLabel(name) => write!(f, "duplicate label '{}'", name),
            ParseErrorKind::MalformedInteger(text) => write!(f, "malformed integer literal '{}'", text),
            ParseErrorKind::UnexpectedEof => write!(f, "unexpected end of input"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub offset: usize,
    pub kind: ParseErrorKind,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset {}: {}", self.offset, self.kind)
    }
}

impl StdError for ParseError {}

/// Fatal at code-generation time: a B/BZ/BN referenced a label that was
/// never defined. No image is produced (spec §4.3, §7).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkError {
    pub label: String,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "undefined label '{}'", self.label)
    }
}

impl StdError for LinkError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// One or more lex/parse errors accumulated; assembly stops short of
    /// code generation.
    Parse(Vec<ParseError>),
    Link(LinkError),
}

impl From<LinkError> for Error {
    fn from(err: LinkError) -> Error {
        Error::Link(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(errors) => {
                writeln!(f, "{} parse error(s):", errors.len())?;
                for err in errors {
                    writeln!(f, "  {}", err)?;
                }
                Ok(())
            }
            Error::Link(err) => write!(f, "link error: {}", err),
        }
    }
}

impl StdError for Error {}
