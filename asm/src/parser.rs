//! Recursive-descent parser: tokens in, a parsed item list + label table +
//! accumulated errors out (spec §4.2).
//!
//! Grammar:
//! ```text
//! program     = { item } ;
//! item        = label | instruction ;
//! label       = identifier ":" ;
//! instruction = mnemonic [ operand { "," operand } ] ;
//! operand     = register | integer | identifier ;
//! ```
//!
//! Grounded on `original_source/compiler/parser.go`'s `parseCommand` switch:
//! same one-token lookahead, same per-mnemonic operand-shape dispatch. Where
//! the original logs and drops a malformed command, this parser pushes a
//! `ParseError` and resynchronizes, because spec §4.2/§7 asks for
//! accumulated errors rather than a single first failure.

use crate::ast::{Operand, ParsedItem};
use crate::error::{ParseError, ParseErrorKind};
use crate::labels::LabelTable;
use crate::lexer::{Lexer, Token, TokenKind};
use ravm::Mnemonic;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    tok: Token<'a>,
    offset: u32,
    items: Vec<ParsedItem>,
    labels: LabelTable,
    errors: Vec<ParseError>,
}

pub fn parse(src: &str) -> (Vec<ParsedItem>, LabelTable, Vec<ParseError>) {
    let mut parser = Parser::new(src);
    parser.run();
    (parser.items, parser.labels, parser.errors)
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Parser<'a> {
        let mut lexer = Lexer::new(src.as_bytes());
        let tok = lexer.next();
        Parser {
            lexer,
            tok,
            offset: 0,
            items: Vec::new(),
            labels: LabelTable::new(),
            errors: Vec::new(),
        }
    }

    fn bump(&mut self) -> Token<'a> {
        let prev = self.tok;
        self.tok = self.lexer.next();
        prev
    }

    fn error(&mut self, offset: usize, kind: ParseErrorKind) {
        self.errors.push(ParseError { offset, kind });
    }

    fn run(&mut self) {
        loop {
            match self.tok.kind {
                TokenKind::Eof => return,
                TokenKind::Illegal => {
                    self.error(self.tok.offset, ParseErrorKind::IllegalByte);
                    self.bump();
                }
                TokenKind::Ident(name) => self.parse_label(name),
                TokenKind::Mnemonic(mnemonic) => self.parse_instruction(mnemonic),
                _ => {
                    self.error(self.tok.offset, ParseErrorKind::UnknownMnemonic);
                    self.resync();
                }
            }
        }
    }

    fn parse_label(&mut self, name: &str) {
        let offset = self.tok.offset;
        let name = name.to_owned();
        self.bump();
        if self.tok.kind != TokenKind::Colon {
            self.error(offset, ParseErrorKind::ExpectedColonAfterLabel);
            self.resync();
            return;
        }
        self.bump();
        if self.labels.contains_key(&name) {
            self.error(offset, ParseErrorKind::DuplicateLabel(name));
            return;
        }
        self.labels.insert(name.clone(), self.offset);
        self.items.push(ParsedItem::Label(name));
    }

    fn parse_instruction(&mut self, mnemonic: Mnemonic) {
        use Mnemonic::*;

        let start = self.tok.offset;
        self.bump();

        let item = match mnemonic {
            NOP | HLT => Some(ParsedItem::OpCodeOnly(mnemonic)),

            IN | OUT | INC | DEC | BX | BXZ | BXN => {
                self.parse_register_operand(mnemonic, start).map(|r| ParsedItem::Unary(mnemonic, r))
            }

            B | BZ | BN => {
                self.parse_label_operand(mnemonic, start).map(|id| ParsedItem::Unary(mnemonic, id))
            }

            LD | ST | XOR | ADD | SUB | MUL | DIV => self
                .parse_register_operand(mnemonic, start)
                .and_then(|rd| {
                    self.expect_comma(mnemonic, start)?;
                    let rm = self.parse_register_operand(mnemonic, start)?;
                    Some((rd, rm))
                })
                .map(|(rd, rm)| ParsedItem::Binary(mnemonic, rd, rm)),

            IXOR | IADD | ISUB | IMUL | IDIV => self
                .parse_register_operand(mnemonic, start)
                .and_then(|rd| {
                    self.expect_comma(mnemonic, start)?;
                    let imm = self.parse_integer_operand(mnemonic, start)?;
                    Some((rd, imm))
                })
                .map(|(rd, imm)| ParsedItem::Binary(mnemonic, rd, imm)),
        };

        match item {
            Some(item) => {
                self.offset += 1 + mnemonic.operand_len() as u32;
                self.items.push(item);
            }
            None => self.resync(),
        }
    }

    fn parse_register_operand(&mut self, mnemonic: Mnemonic, start: usize) -> Option<Operand> {
        match self.tok.kind {
            TokenKind::Register(r) => {
                self.bump();
                Some(Operand::Register(r))
            }
            _ => {
                self.error(start, ParseErrorKind::WrongOperandKind { mnemonic });
                None
            }
        }
    }

    fn parse_label_operand(&mut self, mnemonic: Mnemonic, start: usize) -> Option<Operand> {
        match self.tok.kind {
            TokenKind::Ident(name) => {
                let name = name.to_owned();
                self.bump();
                Some(Operand::Identifier(name))
            }
            _ => {
                self.error(start, ParseErrorKind::WrongOperandKind { mnemonic });
                None
            }
        }
    }

    fn parse_integer_operand(&mut self, mnemonic: Mnemonic, start: usize) -> Option<Operand> {
        let negative = if self.tok.kind == TokenKind::Minus {
            self.bump();
            true
        } else {
            false
        };

        let text = match self.tok.kind {
            TokenKind::Int(text) => text,
            _ => {
                self.error(start, ParseErrorKind::WrongOperandKind { mnemonic });
                return None;
            }
        };
        self.bump();

        match parse_literal(text, negative) {
            Some(value) => Some(Operand::Integer(value)),
            None => {
                self.error(start, ParseErrorKind::MalformedInteger(text.to_owned()));
                None
            }
        }
    }

    fn expect_comma(&mut self, mnemonic: Mnemonic, start: usize) -> Option<()> {
        if self.tok.kind != TokenKind::Comma {
            self.error(start, ParseErrorKind::WrongOperandKind { mnemonic });
            return None;
        }
        self.bump();
        Some(())
    }

    /// Skips tokens until the next one that can start an instruction (a
    /// mnemonic) or end of input, per spec §4.2's resynchronization rule.
    fn resync(&mut self) {
        loop {
            match self.tok.kind {
                TokenKind::Eof | TokenKind::Mnemonic(_) => return,
                _ => {
                    self.bump();
                }
            }
        }
    }
}

fn parse_literal(text: &str, negative: bool) -> Option<i32> {
    let magnitude: u32 = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        text.parse().ok()?
    };

    if negative {
        if magnitude > i32::MAX as u32 + 1 {
            return None;
        }
        Some((magnitude as i64 * -1) as i32)
    } else {
        if magnitude > i32::MAX as u32 {
            return None;
        }
        Some(magnitude as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ravm::RegisterId;

    #[test]
    fn labels_are_bound_to_the_offset_of_the_next_instruction() {
        let (items, labels, errors) = parse("L:\n  IN R0\n  OUT R0\n  B L\n");
        assert!(errors.is_empty());
        assert_eq!(labels.get("L"), Some(&0));
        assert_eq!(
            items,
            vec![
                ParsedItem::Label("L".to_owned()),
                ParsedItem::Unary(Mnemonic::IN, Operand::Register(RegisterId::R0)),
                ParsedItem::Unary(Mnemonic::OUT, Operand::Register(RegisterId::R0)),
                ParsedItem::Unary(Mnemonic::B, Operand::Identifier("L".to_owned())),
            ]
        );
    }

    #[test]
    fn forward_label_reference_resolves_to_the_offset_recorded_later() {
        let (_, labels, errors) = parse("B SKIP\nNOP\nSKIP:\nHLT\n");
        assert!(errors.is_empty());
        // B (1 + 4 bytes) then NOP (1 byte) puts SKIP at offset 6.
        assert_eq!(labels.get("SKIP"), Some(&6));
    }

    #[test]
    fn negative_immediate_is_parsed_with_its_sign() {
        let (items, _, errors) = parse("ISUB R0, -5\n");
        assert!(errors.is_empty());
        assert_eq!(
            items,
            vec![ParsedItem::Binary(
                Mnemonic::ISUB,
                Operand::Register(RegisterId::R0),
                Operand::Integer(-5)
            )]
        );
    }

    #[test]
    fn missing_comma_is_reported_and_parsing_resumes_at_the_next_mnemonic() {
        let (items, _, errors) = parse("ADD R0 R1\nHLT\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(items, vec![ParsedItem::OpCodeOnly(Mnemonic::HLT)]);
    }

    #[test]
    fn duplicate_label_is_reported() {
        let (_, _, errors) = parse("L:\nNOP\nL:\nHLT\n");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].kind, ParseErrorKind::DuplicateLabel(_)));
    }

    #[test]
    fn wrong_operand_kind_is_reported() {
        let (_, _, errors) = parse("IN 5\n");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].kind, ParseErrorKind::WrongOperandKind { .. }));
    }

    #[test]
    fn unknown_mnemonic_surfaces_as_an_identifier_used_without_a_colon() {
        let (_, _, errors) = parse("FROBNICATE R0\n");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].kind, ParseErrorKind::ExpectedColonAfterLabel));
    }
}
