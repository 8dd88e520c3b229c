//! Single linear pass over the parsed item list, emitting the binary image
//! described in spec §6. By the time code generation runs, the parser has
//! already resolved every label to a byte offset, so a B/BZ/BN operand is
//! just a table lookup (spec §4.3).

use crate::ast::{Operand, ParsedItem};
use crate::error::LinkError;
use crate::labels::LabelTable;
use byteorder::ByteOrder;
use ravm::Endian;

pub fn generate(items: &[ParsedItem], labels: &LabelTable) -> Result<Vec<u8>, LinkError> {
    let mut out = Vec::new();

    for item in items {
        match item {
            ParsedItem::Label(_) => {}
            ParsedItem::OpCodeOnly(mnemonic) => out.push(mnemonic.opcode()),
            ParsedItem::Unary(mnemonic, a) => {
                out.push(mnemonic.opcode());
                encode_operand(a, labels, &mut out)?;
            }
            ParsedItem::Binary(mnemonic, a, b) => {
                out.push(mnemonic.opcode());
                encode_operand(a, labels, &mut out)?;
                encode_operand(b, labels, &mut out)?;
            }
        }
    }

    Ok(out)
}

fn encode_operand(operand: &Operand, labels: &LabelTable, out: &mut Vec<u8>) -> Result<(), LinkError> {
    match operand {
        Operand::Register(reg) => out.push(ravm::register_index(*reg) as u8),
        Operand::Integer(value) => {
            let mut buf = [0u8; 4];
            Endian::write_i32(&mut buf, *value);
            out.extend_from_slice(&buf);
        }
        Operand::Identifier(name) => {
            let offset = labels.get(name).ok_or_else(|| LinkError { label: name.clone() })?;
            let mut buf = [0u8; 4];
            Endian::write_i32(&mut buf, *offset as i32);
            out.extend_from_slice(&buf);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn image_length_matches_the_sum_of_encoded_instruction_sizes() {
        let (items, labels, errors) = parse("L:\n  IN R0\n  OUT R0\n  B L\n");
        assert!(errors.is_empty());
        let image = generate(&items, &labels).unwrap();
        // IN (1+1) + OUT (1+1) + B (1+4) = 9
        assert_eq!(image.len(), 9);
    }

    #[test]
    fn branch_target_encodes_the_recorded_label_offset() {
        let (items, labels, _) = parse("L:\n  IN R0\n  OUT R0\n  B L\n");
        let image = generate(&items, &labels).unwrap();
        let target = Endian::read_i32(&image[5..9]);
        assert_eq!(target, *labels.get("L").unwrap() as i32);
    }

    #[test]
    fn undefined_label_is_a_fatal_link_error() {
        let (items, labels, errors) = parse("B NOWHERE\n");
        assert!(errors.is_empty());
        let err = generate(&items, &labels).unwrap_err();
        assert_eq!(err.label, "NOWHERE");
    }

    #[test]
    fn halt_alone_produces_a_one_byte_image() {
        let (items, labels, _) = parse("HLT\n");
        let image = generate(&items, &labels).unwrap();
        assert_eq!(image, vec![ravm::Mnemonic::HLT.opcode()]);
    }
}
