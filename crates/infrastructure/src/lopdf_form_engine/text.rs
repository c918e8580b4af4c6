//! PDF text string and WinAnsi conversions.

use lopdf::{Object, StringFormat};

const UTF16_BOM: [u8; 2] = [0xFE, 0xFF];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Decodes a PDF text string (UTF-16BE with BOM, UTF-8 with BOM, or
/// PDFDocEncoding approximated as Latin-1).
pub(super) fn decode_text(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&UTF16_BOM) {
        let units = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
        return char::decode_utf16(units)
            .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
    }

    if let Some(utf8) = bytes.strip_prefix(&UTF8_BOM) {
        return String::from_utf8_lossy(utf8).into_owned();
    }

    bytes.iter().map(|&byte| char::from(byte)).collect()
}

/// Encodes a text string, Latin-1 when possible and UTF-16BE otherwise.
pub(super) fn encode_text(text: &str) -> Object {
    if text.chars().all(|character| u32::from(character) <= 0xFF) {
        let bytes = text.chars().map(|character| character as u8).collect();
        return Object::String(bytes, StringFormat::Literal);
    }

    let mut bytes = UTF16_BOM.to_vec();
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Bytes for a string drawn with a WinAnsi-encoded standard font.
///
/// Characters outside the encoding become `?`.
pub(super) fn win_ansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|character| match character {
            ' '..='~' | '\u{A0}'..='\u{FF}' => character as u8,
            '\u{20AC}' => 0x80,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            _ => b'?',
        })
        .collect()
}

/// Projects a field value object as text. Names keep a leading slash.
pub(super) fn value_to_string(object: &Object) -> Option<String> {
    match object {
        Object::Null => None,
        Object::String(bytes, _) => Some(decode_text(bytes)),
        Object::Name(name) => Some(format!("/{}", String::from_utf8_lossy(name))),
        Object::Integer(value) => Some(value.to_string()),
        Object::Real(value) => Some(value.to_string()),
        Object::Boolean(value) => Some(value.to_string()),
        Object::Array(items) => Some(
            items
                .iter()
                .filter_map(value_to_string)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use lopdf::Object;

    use super::{decode_text, encode_text, value_to_string, win_ansi_bytes};

    #[test]
    fn latin1_text_stays_literal() {
        let Object::String(bytes, _) = encode_text("Zoë") else {
            unreachable!("text encodes to a string object");
        };
        assert_eq!(bytes, vec![b'Z', b'o', 0xEB]);
        assert_eq!(decode_text(&bytes), "Zoë");
    }

    #[test]
    fn wide_text_uses_utf16_with_bom() {
        let Object::String(bytes, _) = encode_text("東京") else {
            unreachable!("text encodes to a string object");
        };
        assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
        assert_eq!(decode_text(&bytes), "東京");
    }

    #[test]
    fn win_ansi_replaces_unsupported_characters() {
        assert_eq!(win_ansi_bytes("A€東"), vec![b'A', 0x80, b'?']);
    }

    #[test]
    fn names_keep_their_slash() {
        assert_eq!(
            value_to_string(&Object::Name(b"Yes".to_vec())),
            Some("/Yes".to_owned())
        );
        assert_eq!(value_to_string(&Object::Null), None);
    }
}
