//! Decoding of bound payloads back into row values.
//!
//! Used when stored rows are read back (result display, test transports).
//! Character payloads are decoded lossily: invalid sequences become U+FFFD
//! rather than failing the whole result set.

use bytes::Buf;

use crate::binding::ColumnBinding;
use crate::bound::BoundValue;
use crate::error::TypeError;
use crate::value::Value;

/// UTF-16LE byte order mark.
const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];

/// Decode a bound payload for `column` into a [`Value`].
pub fn decode(bound: &BoundValue, column: &ColumnBinding) -> Result<Value, TypeError> {
    let data = match bound {
        BoundValue::Null => return Ok(Value::Null),
        BoundValue::Data(data) => data,
    };
    let ty = column.wire_type;
    let mut buf = data.as_ref();

    let width_error = || TypeError::InvalidPayload {
        target: ty.name(),
        reason: "payload length does not match column width",
    };

    if ty.is_integer() {
        let n = match buf.len() {
            1 => i64::from(buf.get_u8()),
            2 => i64::from(buf.get_i16_le()),
            4 => i64::from(buf.get_i32_le()),
            8 => buf.get_i64_le(),
            _ => return Err(width_error()),
        };
        return Ok(Value::Int(n));
    }

    if ty.is_float() {
        let f = match buf.len() {
            4 => f64::from(buf.get_f32_le()),
            8 => buf.get_f64_le(),
            _ => return Err(width_error()),
        };
        return Ok(Value::Float(f));
    }

    if ty.is_unicode() {
        return Ok(Value::Text(decode_utf16(buf)));
    }

    if ty.is_character() {
        return Ok(Value::Text(String::from_utf8_lossy(buf).into_owned()));
    }

    if ty.is_plp() {
        // XML documents are stored as the client sent them
        return Ok(Value::Text(match buf.strip_prefix(&UTF16_LE_BOM) {
            Some(rest) => decode_utf16(rest),
            None => String::from_utf8_lossy(buf).into_owned(),
        }));
    }

    Ok(Value::Bytes(data.clone()))
}

/// Decode UTF-16LE bytes into a string, replacing invalid sequences.
pub fn decode_utf16(bytes: &[u8]) -> String {
    let (text, _) = encoding_rs::UTF_16LE.decode_without_bom_handling(bytes);
    text.into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::encode::TypeCoercer;
    use crate::wire::{MAX_WIDTH_MARKER, WireType};
    use bytes::Bytes;

    #[test]
    fn test_decode_numbers() {
        let c = TypeCoercer::default();
        let tiny = ColumnBinding::new(1, "t", WireType::IntN, 1);
        let bound = c.coerce(&Value::Int(200), &tiny).unwrap();
        assert_eq!(decode(&bound, &tiny).unwrap(), Value::Int(200));

        let real = ColumnBinding::new(2, "r", WireType::FloatN, 4);
        let bound = c.coerce(&Value::Float(0.5), &real).unwrap();
        assert_eq!(decode(&bound, &real).unwrap(), Value::Float(0.5));
    }

    #[test]
    fn test_decode_text() {
        let c = TypeCoercer::default();
        let n = ColumnBinding::new(1, "n", WireType::NVarChar, 40);
        let bound = c.coerce(&Value::from("héllo"), &n).unwrap();
        assert_eq!(decode(&bound, &n).unwrap(), Value::from("héllo"));
    }

    #[test]
    fn test_decode_xml_with_bom() {
        let xml = ColumnBinding::new(3, "xmldata", WireType::Xml, MAX_WIDTH_MARKER);
        let mut doc = vec![0xFF, 0xFE];
        for unit in "<a/>".encode_utf16() {
            doc.extend_from_slice(&unit.to_le_bytes());
        }
        let bound = BoundValue::Data(Bytes::from(doc));
        assert_eq!(decode(&bound, &xml).unwrap(), Value::from("<a/>"));
    }

    #[test]
    fn test_decode_utf16_replaces_malformed_units() {
        // Lone high surrogate, then 'a'
        assert_eq!(decode_utf16(&[0x00, 0xD8, 0x61, 0x00]), "\u{FFFD}a");
        // Dangling odd byte
        assert_eq!(decode_utf16(&[0x61, 0x00, 0x62]), "a\u{FFFD}");
        // A leading BOM is text here; XML strips it before decoding
        assert_eq!(decode_utf16(&[0xFF, 0xFE, 0x61, 0x00]), "\u{FEFF}a");
    }

    #[test]
    fn test_decode_rejects_bad_width() {
        let col = ColumnBinding::new(1, "i", WireType::Int4, 4);
        let bound = BoundValue::Data(Bytes::from_static(&[1, 2, 3]));
        assert!(matches!(
            decode(&bound, &col),
            Err(TypeError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_decode_null_and_binary() {
        let bin = ColumnBinding::new(1, "b", WireType::BigVarBinary, 8);
        assert_eq!(decode(&BoundValue::Null, &bin).unwrap(), Value::Null);
        let bound = BoundValue::Data(Bytes::from_static(&[1, 2]));
        assert_eq!(decode(&bound, &bin).unwrap(), Value::from(vec![1u8, 2]));
    }
}
