//! Byte-stream tokenizer.
//!
//! Mirrors the shape of a Go-style hand-written scanner: a one-character
//! lookahead (`ch`), a current offset and a read offset, and a `bump()` step
//! that always makes progress. Identifiers are looked up against the
//! register and mnemonic name tables as soon as they are scanned; punctuation
//! is single-byte. The tokenizer works directly on raw bytes (not `&str`) so
//! that malformed UTF-8 can be reported instead of rejected at the type
//! boundary.

use ravm::{Mnemonic, RegisterId};

const BOM: char = '\u{feff}';
const REPLACEMENT: char = '\u{fffd}';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind<'a> {
    Illegal,
    Eof,
    /// Never produced by this tokenizer's own scanning rules (the stable
    /// ISA has no comment syntax, see spec §6); kept so the token-kind set
    /// matches the data model in full and a future extension has somewhere
    /// to plug in.
    Comment,
    Ident(&'a str),
    Int(&'a str),
    Colon,
    Comma,
    Minus,
    Register(RegisterId),
    Mnemonic(Mnemonic),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub offset: usize,
    pub kind: TokenKind<'a>,
}

pub struct Lexer<'a> {
    src: &'a [u8],
    offset: usize,
    rd_offset: usize,
    ch: Option<char>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a [u8]) -> Lexer<'a> {
        let mut lexer = Lexer { src, offset: 0, rd_offset: 0, ch: None };
        lexer.bump();
        if lexer.ch == Some(BOM) {
            lexer.bump();
        }
        lexer
    }

    /// Advances one character, always making progress.
    fn bump(&mut self) {
        if self.rd_offset >= self.src.len() {
            self.offset = self.src.len();
            self.ch = None;
            return;
        }

        self.offset = self.rd_offset;
        let byte = self.src[self.rd_offset];

        if byte == 0 {
            self.rd_offset += 1;
            self.ch = Some('\u{0}');
            return;
        }

        if byte < 0x80 {
            self.rd_offset += 1;
            self.ch = Some(byte as char);
            return;
        }

        let (c, width) = decode_char(&self.src[self.rd_offset..]);
        self.rd_offset += width;
        if c == BOM && self.offset > 0 {
            self.ch = Some(BOM);
            return;
        }
        self.ch = Some(c);
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.ch, Some(' ') | Some('\t') | Some('\r') | Some('\n')) {
            self.bump();
        }
    }

    /// Scans and returns the next token. Never returns anything but `Eof`
    /// once the input is exhausted.
    pub fn next(&mut self) -> Token<'a> {
        self.skip_whitespace();
        let start = self.offset;

        let ch = match self.ch {
            Some(c) => c,
            None => return Token { offset: start, kind: TokenKind::Eof },
        };

        if is_ident_start(ch) {
            let text = self.scan_identifier();
            return Token { offset: start, kind: classify(text) };
        }

        if ch.is_ascii_digit() {
            let text = self.scan_number();
            return Token { offset: start, kind: TokenKind::Int(text) };
        }

        let single = match ch {
            ':' => Some(TokenKind::Colon),
            ',' => Some(TokenKind::Comma),
            '-' => Some(TokenKind::Minus),
            _ => None,
        };

        if let Some(kind) = single {
            self.bump();
            return Token { offset: start, kind };
        }

        // NUL, a byte that does not start a valid UTF-8 sequence, and a
        // stray BOM all land here; `bump` has already advanced past the
        // offending byte so scanning keeps making progress.
        self.bump();
        Token { offset: start, kind: TokenKind::Illegal }
    }

    fn scan_identifier(&mut self) -> &'a str {
        let start = self.offset;
        while let Some(c) = self.ch {
            if is_ident_continue(c) {
                self.bump();
            } else {
                break;
            }
        }
        std::str::from_utf8(&self.src[start..self.offset]).unwrap_or("")
    }

    fn scan_number(&mut self) -> &'a str {
        let start = self.offset;
        if self.ch == Some('0') {
            self.bump();
            if matches!(self.ch, Some('x') | Some('X')) {
                self.bump();
                while matches!(self.ch, Some(c) if c.is_ascii_hexdigit()) {
                    self.bump();
                }
                return std::str::from_utf8(&self.src[start..self.offset]).unwrap_or("");
            }
        }
        while matches!(self.ch, Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        std::str::from_utf8(&self.src[start..self.offset]).unwrap_or("")
    }
}

/// Decodes one UTF-8 scalar value starting at `bytes[0]`. Returns the
/// replacement character and a one-byte width on any encoding error, the
/// same recovery `utf8.DecodeRune` performs.
fn decode_char(bytes: &[u8]) -> (char, usize) {
    for len in 1..=bytes.len().min(4) {
        if let Ok(s) = std::str::from_utf8(&bytes[..len]) {
            if let Some(c) = s.chars().next() {
                return (c, len);
            }
        }
    }
    (REPLACEMENT, 1)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn classify(text: &str) -> TokenKind<'_> {
    if let Ok(reg) = text.parse::<RegisterId>() {
        return TokenKind::Register(reg);
    }
    if let Ok(mnemonic) = text.parse::<Mnemonic>() {
        return TokenKind::Mnemonic(mnemonic);
    }
    TokenKind::Ident(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind<'_>> {
        kinds_bytes(src.as_bytes())
    }

    fn kinds_bytes(src: &[u8]) -> Vec<TokenKind<'_>> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                return out;
            }
        }
    }

    #[test]
    fn scans_a_label_and_an_instruction() {
        let out = kinds("L:\n  IN R0\n");
        assert_eq!(
            out,
            vec![
                TokenKind::Ident("L"),
                TokenKind::Colon,
                TokenKind::Mnemonic(Mnemonic::IN),
                TokenKind::Register(RegisterId::R0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_decimal_and_hex_integers() {
        let out = kinds("IMUL R0, 42\nIADD R1, 0xFF");
        assert_eq!(
            out,
            vec![
                TokenKind::Mnemonic(Mnemonic::IMUL),
                TokenKind::Register(RegisterId::R0),
                TokenKind::Comma,
                TokenKind::Int("42"),
                TokenKind::Mnemonic(Mnemonic::IADD),
                TokenKind::Register(RegisterId::R1),
                TokenKind::Comma,
                TokenKind::Int("0xFF"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn minus_precedes_a_negative_literal() {
        let out = kinds("ISUB R0, -5");
        assert_eq!(
            out,
            vec![
                TokenKind::Mnemonic(Mnemonic::ISUB),
                TokenKind::Register(RegisterId::R0),
                TokenKind::Comma,
                TokenKind::Minus,
                TokenKind::Int("5"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn eof_is_sticky() {
        let mut lexer = Lexer::new(b"HLT");
        lexer.next();
        assert_eq!(lexer.next().kind, TokenKind::Eof);
        assert_eq!(lexer.next().kind, TokenKind::Eof);
    }

    #[test]
    fn nul_byte_is_illegal_and_scanning_continues() {
        let out = kinds("HLT\u{0}NOP");
        assert_eq!(
            out,
            vec![
                TokenKind::Mnemonic(Mnemonic::HLT),
                TokenKind::Illegal,
                TokenKind::Mnemonic(Mnemonic::NOP),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn bad_utf8_is_illegal_and_scanning_continues() {
        let mut bytes = b"HLT ".to_vec();
        bytes.push(0xff);
        bytes.extend_from_slice(b" NOP");
        let out = kinds_bytes(&bytes);
        assert_eq!(
            out,
            vec![
                TokenKind::Mnemonic(Mnemonic::HLT),
                TokenKind::Illegal,
                TokenKind::Mnemonic(Mnemonic::NOP),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn stray_bom_after_offset_zero_is_illegal() {
        let out = kinds("HLT \u{feff}NOP");
        assert_eq!(
            out,
            vec![
                TokenKind::Mnemonic(Mnemonic::HLT),
                TokenKind::Illegal,
                TokenKind::Mnemonic(Mnemonic::NOP),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn leading_bom_at_offset_zero_is_silently_skipped() {
        let out = kinds("\u{feff}HLT");
        assert_eq!(out, vec![TokenKind::Mnemonic(Mnemonic::HLT), TokenKind::Eof]);
    }
}
