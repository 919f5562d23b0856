//! Coercion of row values into column wire payloads.
//!
//! The coercer dispatches on the [`Value`] variant and the column's
//! [`WireType`]. It never rounds beyond what the wire type's precision
//! allows and never truncates: a value that does not fit is rejected with
//! [`TypeError::ValueTooLarge`].
//!
//! | Column class | Accepts |
//! |--------------|---------|
//! | integer (`INT*`) | integers, integer text; integral floats when enabled |
//! | float (`REAL`/`FLOAT`) | floats, integers, numeric text |
//! | character (`[N]VARCHAR`, `[N]CHAR`) | text, integers, floats |
//! | binary (`VARBINARY`, `BINARY`, `XML`) | bytes, text (sent as-is) |
//!
//! Binary and XML payloads are opaque: any charset transformation (e.g.
//! UTF-16 for an XML document) is up to the caller.

use bytes::{BufMut, Bytes, BytesMut};

use crate::binding::ColumnBinding;
use crate::bound::BoundValue;
use crate::error::TypeError;
use crate::value::Value;
use crate::wire::WireType;

/// Default byte limit for `MAX` columns (16 MiB).
pub const DEFAULT_TEXT_SIZE: u32 = 16_777_216;

/// Options that widen what the coercer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoercionOptions {
    /// Accept floats without a fractional part in integer columns.
    ///
    /// Default: false (a float targeting an integer column is a type
    /// mismatch).
    pub integral_floats: bool,

    /// Byte limit applied to `MAX` columns.
    ///
    /// Default: 16 MiB.
    pub text_size: u32,
}

impl Default for CoercionOptions {
    fn default() -> Self {
        Self {
            integral_floats: false,
            text_size: DEFAULT_TEXT_SIZE,
        }
    }
}

/// Converts row values into bound column payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeCoercer {
    options: CoercionOptions,
}

impl TypeCoercer {
    /// Create a coercer with the given options.
    #[must_use]
    pub fn new(options: CoercionOptions) -> Self {
        Self { options }
    }

    /// Get the coercion options.
    #[must_use]
    pub fn options(&self) -> &CoercionOptions {
        &self.options
    }

    /// Coerce one value into the payload for `column`.
    pub fn coerce(&self, value: &Value, column: &ColumnBinding) -> Result<BoundValue, TypeError> {
        let ty = column.wire_type;

        if value.is_null() {
            return if column.nullable {
                Ok(BoundValue::Null)
            } else {
                Err(TypeError::UnexpectedNull { target: ty.name() })
            };
        }

        let payload = if ty.is_integer() {
            self.coerce_integer(value, column)?
        } else if ty.is_float() {
            coerce_float(value, column)?
        } else if ty.is_character() {
            coerce_character(value, column)
                .ok_or_else(|| mismatch(ty, value))?
        } else {
            coerce_binary(value).ok_or_else(|| mismatch(ty, value))?
        };

        let limit = column.byte_limit(self.options.text_size);
        if payload.len() > limit {
            return Err(TypeError::ValueTooLarge {
                target: ty.name(),
                size: payload.len(),
                max: limit,
            });
        }

        Ok(BoundValue::Data(payload))
    }

    fn coerce_integer(&self, value: &Value, column: &ColumnBinding) -> Result<Bytes, TypeError> {
        let ty = column.wire_type;
        let n: i64 = match value {
            Value::Int(n) => *n,
            Value::Text(s) => parse_integer(s, ty, self.options.integral_floats)?,
            Value::Float(f) if self.options.integral_floats => {
                integral(*f).ok_or_else(|| mismatch(ty, value))?
            }
            _ => return Err(mismatch(ty, value)),
        };
        encode_integer(n, column)
    }
}

fn mismatch(ty: WireType, value: &Value) -> TypeError {
    TypeError::TypeMismatch {
        expected: ty.name(),
        actual: value.type_name(),
    }
}

/// Get the integer a float represents exactly, if any.
fn integral(f: f64) -> Option<i64> {
    // 2^63 is the first float past i64::MAX
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_finite() && f.fract() == 0.0 && f >= -LIMIT && f < LIMIT {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_integer(text: &str, ty: WireType, integral_floats: bool) -> Result<i64, TypeError> {
    let trimmed = text.trim();
    if let Ok(wide) = trimmed.parse::<i128>() {
        return i64::try_from(wide).map_err(|_| TypeError::ValueTooLarge {
            target: ty.name(),
            size: 16,
            max: 8,
        });
    }
    if integral_floats {
        if let Some(n) = trimmed.parse::<f64>().ok().and_then(integral) {
            return Ok(n);
        }
    }
    Err(TypeError::InvalidNumber {
        target: ty.name(),
        text: text.to_string(),
    })
}

/// Smallest integer width that holds `n`.
fn required_width(n: i64) -> usize {
    if (0..=i64::from(u8::MAX)).contains(&n) {
        1
    } else if i16::try_from(n).is_ok() {
        2
    } else if i32::try_from(n).is_ok() {
        4
    } else {
        8
    }
}

fn encode_integer(n: i64, column: &ColumnBinding) -> Result<Bytes, TypeError> {
    let ty = column.wire_type;
    let width = ty.fixed_width().unwrap_or(column.max_width);
    let too_large = || TypeError::ValueTooLarge {
        target: ty.name(),
        size: required_width(n),
        max: width as usize,
    };

    let mut buf = BytesMut::with_capacity(width as usize);
    match width {
        // TINYINT is unsigned
        1 => buf.put_u8(u8::try_from(n).map_err(|_| too_large())?),
        2 => buf.put_i16_le(i16::try_from(n).map_err(|_| too_large())?),
        4 => buf.put_i32_le(i32::try_from(n).map_err(|_| too_large())?),
        8 => buf.put_i64_le(n),
        _ => {
            return Err(TypeError::InvalidWidth {
                target: ty.name(),
                width,
            });
        }
    }
    Ok(buf.freeze())
}

fn coerce_float(value: &Value, column: &ColumnBinding) -> Result<Bytes, TypeError> {
    let ty = column.wire_type;
    let f = match value {
        Value::Float(f) => *f,
        Value::Int(n) => *n as f64,
        Value::Text(s) => s.trim().parse::<f64>().map_err(|_| TypeError::InvalidNumber {
            target: ty.name(),
            text: s.clone(),
        })?,
        _ => return Err(mismatch(ty, value)),
    };

    if !f.is_finite() {
        return Err(TypeError::InvalidNumber {
            target: ty.name(),
            text: f.to_string(),
        });
    }

    let width = ty.fixed_width().unwrap_or(column.max_width);
    let mut buf = BytesMut::with_capacity(width as usize);
    match width {
        4 => {
            if f.abs() > f64::from(f32::MAX) {
                return Err(TypeError::ValueTooLarge {
                    target: ty.name(),
                    size: 8,
                    max: 4,
                });
            }
            buf.put_f32_le(f as f32);
        }
        8 => buf.put_f64_le(f),
        _ => {
            return Err(TypeError::InvalidWidth {
                target: ty.name(),
                width,
            });
        }
    }
    Ok(buf.freeze())
}

fn coerce_character(value: &Value, column: &ColumnBinding) -> Option<Bytes> {
    let text = match value {
        Value::Text(s) => std::borrow::Cow::Borrowed(s.as_str()),
        Value::Int(n) => std::borrow::Cow::Owned(n.to_string()),
        Value::Float(f) => std::borrow::Cow::Owned(f.to_string()),
        Value::Null | Value::Bytes(_) => return None,
    };

    if column.wire_type.is_unicode() {
        let mut buf = BytesMut::with_capacity(text.len() * 2);
        encode_utf16_string(&text, &mut buf);
        Some(buf.freeze())
    } else {
        Some(Bytes::copy_from_slice(text.as_bytes()))
    }
}

fn coerce_binary(value: &Value) -> Option<Bytes> {
    match value {
        Value::Bytes(b) => Some(b.clone()),
        Value::Text(s) => Some(Bytes::copy_from_slice(s.as_bytes())),
        Value::Null | Value::Int(_) | Value::Float(_) => None,
    }
}

/// Encode a string as UTF-16LE.
pub fn encode_utf16_string(s: &str, buf: &mut BytesMut) {
    for code_unit in s.encode_utf16() {
        buf.put_u16_le(code_unit);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::wire::MAX_WIDTH_MARKER;

    fn data(bound: BoundValue) -> Vec<u8> {
        bound.payload().unwrap().to_vec()
    }

    #[test]
    fn test_integer_widths() {
        let c = TypeCoercer::default();
        let tiny = ColumnBinding::new(1, "t", WireType::Int1, 1);
        assert_eq!(data(c.coerce(&Value::Int(255), &tiny).unwrap()), vec![255]);
        assert!(c.coerce(&Value::Int(-1), &tiny).unwrap_err().is_too_large());

        let small = ColumnBinding::new(1, "s", WireType::IntN, 2);
        assert_eq!(
            data(c.coerce(&Value::Int(-2), &small).unwrap()),
            (-2i16).to_le_bytes().to_vec()
        );
        assert_eq!(
            c.coerce(&Value::Int(70_000), &small).unwrap_err(),
            TypeError::ValueTooLarge {
                target: "INTN",
                size: 4,
                max: 2
            }
        );
    }

    #[test]
    fn test_integer_from_text() {
        let c = TypeCoercer::default();
        let col = ColumnBinding::new(1, "n", WireType::Int4, 4);
        assert_eq!(
            data(c.coerce(&Value::from(" 42 "), &col).unwrap()),
            42i32.to_le_bytes().to_vec()
        );
        assert!(matches!(
            c.coerce(&Value::from("4.5"), &col),
            Err(TypeError::InvalidNumber { .. })
        ));
        assert!(
            c.coerce(&Value::from("99999999999999999999"), &col)
                .unwrap_err()
                .is_too_large()
        );
    }

    #[test]
    fn test_float_to_integer_is_opt_in() {
        let col = ColumnBinding::new(1, "n", WireType::Int8, 8);
        let strict = TypeCoercer::default();
        assert_eq!(
            strict.coerce(&Value::Float(3.0), &col).unwrap_err(),
            TypeError::TypeMismatch {
                expected: "BIGINT",
                actual: "float"
            }
        );

        let lenient = TypeCoercer::new(CoercionOptions {
            integral_floats: true,
            ..CoercionOptions::default()
        });
        assert_eq!(
            data(lenient.coerce(&Value::Float(3.0), &col).unwrap()),
            3i64.to_le_bytes().to_vec()
        );
        // No rounding even when lenient
        assert!(lenient.coerce(&Value::Float(3.5), &col).is_err());
    }

    #[test]
    fn test_float_columns() {
        let c = TypeCoercer::default();
        let real = ColumnBinding::new(1, "r", WireType::Float4, 4);
        assert_eq!(
            data(c.coerce(&Value::Float(1.5), &real).unwrap()),
            1.5f32.to_le_bytes().to_vec()
        );
        assert!(c.coerce(&Value::Float(1e300), &real).unwrap_err().is_too_large());

        let float = ColumnBinding::new(2, "age", WireType::FloatN, 8);
        assert_eq!(
            data(c.coerce(&Value::Int(2), &float).unwrap()),
            2.0f64.to_le_bytes().to_vec()
        );
        assert_eq!(
            data(c.coerce(&Value::from("12.177"), &float).unwrap()),
            12.177f64.to_le_bytes().to_vec()
        );
        assert!(matches!(
            c.coerce(&Value::Float(f64::NAN), &float),
            Err(TypeError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_character_columns() {
        let c = TypeCoercer::default();
        let varchar = ColumnBinding::new(1, "name", WireType::BigVarChar, 4);
        assert_eq!(data(c.coerce(&Value::from("me"), &varchar).unwrap()), b"me");
        assert_eq!(data(c.coerce(&Value::Int(12), &varchar).unwrap()), b"12");
        assert_eq!(
            c.coerce(&Value::from("toolong"), &varchar).unwrap_err(),
            TypeError::ValueTooLarge {
                target: "VARCHAR",
                size: 7,
                max: 4
            }
        );
        assert!(matches!(
            c.coerce(&Value::from(vec![1u8]), &varchar),
            Err(TypeError::TypeMismatch { .. })
        ));

        let nvarchar = ColumnBinding::new(2, "n", WireType::NVarChar, 20);
        assert_eq!(
            data(c.coerce(&Value::from("ab"), &nvarchar).unwrap()),
            vec![b'a', 0, b'b', 0]
        );
    }

    #[test]
    fn test_binary_is_opaque() {
        let c = TypeCoercer::default();
        let xml = ColumnBinding::new(3, "xmldata", WireType::Xml, MAX_WIDTH_MARKER);
        let doc = vec![0xFF, 0xFE, b'<', 0];
        assert_eq!(data(c.coerce(&Value::from(doc.clone()), &xml).unwrap()), doc);
        assert_eq!(data(c.coerce(&Value::from(""), &xml).unwrap()), b"");
        assert!(matches!(
            c.coerce(&Value::Int(1), &xml),
            Err(TypeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_text_size_bounds_max_columns() {
        let c = TypeCoercer::new(CoercionOptions {
            text_size: 4,
            ..CoercionOptions::default()
        });
        let blob = ColumnBinding::new(1, "b", WireType::BigVarBinary, MAX_WIDTH_MARKER);
        assert!(c.coerce(&Value::from(vec![0u8; 4]), &blob).is_ok());
        assert!(
            c.coerce(&Value::from(vec![0u8; 5]), &blob)
                .unwrap_err()
                .is_too_large()
        );
    }

    #[test]
    fn test_null_handling() {
        let c = TypeCoercer::default();
        let nullable = ColumnBinding::new(1, "a", WireType::FloatN, 8);
        assert_eq!(c.coerce(&Value::Null, &nullable).unwrap(), BoundValue::Null);

        let required = ColumnBinding::new(1, "a", WireType::BigVarChar, 8).with_nullable(false);
        assert_eq!(
            c.coerce(&Value::Null, &required).unwrap_err(),
            TypeError::UnexpectedNull { target: "VARCHAR" }
        );
    }
}
