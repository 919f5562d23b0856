//! Bound column payloads and their TDS row framing.
//!
//! A [`BoundValue`] is the coercer's output: either the null indicator or
//! the exact payload bytes for one column. Framing (length prefixes, null
//! markers, PLP chunks) is applied when a bound row is written into a ROW
//! token with [`BoundColumn::write_to`].

use bytes::{BufMut, Bytes, BytesMut};

use crate::binding::ColumnBinding;
use crate::error::TypeError;

/// PLP total-length value marking NULL.
pub const PLP_NULL: u64 = 0xFFFF_FFFF_FFFF_FFFF;

/// Two-byte length value marking NULL in short variable-length columns.
pub const SHORT_NULL: u16 = 0xFFFF;

/// The coerced form of one column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundValue {
    /// Null indicator; no payload bytes are transmitted.
    Null,
    /// Payload bytes, possibly zero-length.
    Data(Bytes),
}

impl BoundValue {
    /// Check if this is the null indicator.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the payload length; `None` for the null indicator.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Null => None,
            Self::Data(b) => Some(b.len()),
        }
    }

    /// Get the payload bytes, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Self::Null => None,
            Self::Data(b) => Some(b),
        }
    }
}

/// One bound column of a row, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundColumn {
    /// Column position, starting at 1.
    pub ordinal: u16,
    /// Null indicator or payload.
    pub value: BoundValue,
}

impl BoundColumn {
    /// Create a bound column.
    #[must_use]
    pub fn new(ordinal: u16, value: BoundValue) -> Self {
        Self { ordinal, value }
    }

    /// Write this column as it appears inside a TDS ROW token.
    pub fn write_to(&self, binding: &ColumnBinding, buf: &mut BytesMut) -> Result<(), TypeError> {
        let ty = binding.wire_type;

        match &self.value {
            BoundValue::Null => {
                if binding.is_plp() {
                    buf.put_u64_le(PLP_NULL);
                } else if ty.is_nullable_variant() {
                    buf.put_u8(0);
                } else if ty.is_fixed_length() {
                    return Err(TypeError::UnexpectedNull { target: ty.name() });
                } else {
                    buf.put_u16_le(SHORT_NULL);
                }
            }
            BoundValue::Data(data) => {
                if binding.is_plp() {
                    encode_plp(data, buf);
                } else if ty.is_nullable_variant() {
                    buf.put_u8(data.len() as u8);
                    buf.put_slice(data);
                } else if let Some(width) = ty.fixed_width() {
                    if data.len() != width as usize {
                        return Err(TypeError::InvalidPayload {
                            target: ty.name(),
                            reason: "payload does not match fixed width",
                        });
                    }
                    buf.put_slice(data);
                } else {
                    if data.len() > u16::MAX as usize - 1 {
                        return Err(TypeError::ValueTooLarge {
                            target: ty.name(),
                            size: data.len(),
                            max: u16::MAX as usize - 1,
                        });
                    }
                    buf.put_u16_le(data.len() as u16);
                    buf.put_slice(data);
                }
            }
        }

        Ok(())
    }
}

/// Encode bytes using PLP (Partially Length-Prefixed) format.
///
/// PLP format (per MS-TDS specification):
/// - 8 bytes: total length in bytes (little-endian)
/// - Chunks: 4-byte chunk length + data, repeated
/// - Terminator: 4 bytes of zero
///
/// The whole value is sent as a single chunk.
pub fn encode_plp(data: &[u8], buf: &mut BytesMut) {
    buf.put_u64_le(data.len() as u64);

    if !data.is_empty() {
        buf.put_u32_le(data.len() as u32);
        buf.put_slice(data);
    }

    // Terminator chunk (length = 0)
    buf.put_u32_le(0);
}
