//! TDS wire type tags for bulk-copy columns.
//!
//! These are the type bytes a TDS server reports in column metadata. The set
//! is closed: a column whose tag is not listed here cannot be bound, and the
//! session reports it instead of guessing an encoding.

/// Width marker used by variable-length columns declared as `MAX`.
pub const MAX_WIDTH_MARKER: u32 = 0xFFFF;

/// Largest non-`MAX` width of a variable-length column, in bytes.
pub const MAX_SHORT_WIDTH: u32 = 8000;

/// TDS data type identifiers a bulk-copy column can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    // Fixed-length numeric types (never NULL)
    /// 8-bit unsigned integer (TINYINT).
    Int1 = 0x30,
    /// 16-bit signed integer (SMALLINT).
    Int2 = 0x34,
    /// 32-bit signed integer (INT).
    Int4 = 0x38,
    /// 64-bit signed integer (BIGINT).
    Int8 = 0x7F,
    /// 32-bit floating point (REAL).
    Float4 = 0x3B,
    /// 64-bit floating point (FLOAT).
    Float8 = 0x3E,

    // Null-capable numeric variants
    /// Nullable integer; width 1, 2, 4 or 8.
    IntN = 0x26,
    /// Nullable float; width 4 or 8.
    FloatN = 0x6D,

    // Variable-length character
    /// Single-byte character data (VARCHAR).
    BigVarChar = 0xA7,
    /// Fixed single-byte character data (CHAR).
    BigChar = 0xAF,
    /// UTF-16 character data (NVARCHAR).
    NVarChar = 0xE7,
    /// Fixed UTF-16 character data (NCHAR).
    NChar = 0xEF,

    // Variable-length binary
    /// Binary data (VARBINARY).
    BigVarBinary = 0xA5,
    /// Fixed binary data (BINARY).
    BigBinary = 0xAD,
    /// XML document, always partially length-prefixed.
    Xml = 0xF1,
}

impl WireType {
    /// Create a wire type from a raw tag byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x30 => Some(Self::Int1),
            0x34 => Some(Self::Int2),
            0x38 => Some(Self::Int4),
            0x7F => Some(Self::Int8),
            0x3B => Some(Self::Float4),
            0x3E => Some(Self::Float8),
            0x26 => Some(Self::IntN),
            0x6D => Some(Self::FloatN),
            0xA7 => Some(Self::BigVarChar),
            0xAF => Some(Self::BigChar),
            0xE7 => Some(Self::NVarChar),
            0xEF => Some(Self::NChar),
            0xA5 => Some(Self::BigVarBinary),
            0xAD => Some(Self::BigBinary),
            0xF1 => Some(Self::Xml),
            _ => None,
        }
    }

    /// Get the raw tag byte.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check if this is a fixed-length type (no length prefix, no NULL).
    #[must_use]
    pub const fn is_fixed_length(&self) -> bool {
        matches!(
            self,
            Self::Int1 | Self::Int2 | Self::Int4 | Self::Int8 | Self::Float4 | Self::Float8
        )
    }

    /// Check if this is one of the null-capable numeric variants.
    #[must_use]
    pub const fn is_nullable_variant(&self) -> bool {
        matches!(self, Self::IntN | Self::FloatN)
    }

    /// Check if this type carries integers.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Int1 | Self::Int2 | Self::Int4 | Self::Int8 | Self::IntN
        )
    }

    /// Check if this type carries floating point numbers.
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float4 | Self::Float8 | Self::FloatN)
    }

    /// Check if this is a character type.
    #[must_use]
    pub const fn is_character(&self) -> bool {
        matches!(
            self,
            Self::BigVarChar | Self::BigChar | Self::NVarChar | Self::NChar
        )
    }

    /// Check if this is a UTF-16 character type.
    #[must_use]
    pub const fn is_unicode(&self) -> bool {
        matches!(self, Self::NVarChar | Self::NChar)
    }

    /// Check if this type carries opaque bytes.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Self::BigVarBinary | Self::BigBinary | Self::Xml)
    }

    /// Check if this type always uses PLP (Partially Length-Prefixed) framing.
    ///
    /// Character and binary columns declared `MAX` use PLP as well; see
    /// [`crate::ColumnBinding::is_plp`].
    #[must_use]
    pub const fn is_plp(&self) -> bool {
        matches!(self, Self::Xml)
    }

    /// Get the width of a fixed-length type in bytes.
    #[must_use]
    pub const fn fixed_width(&self) -> Option<u32> {
        match self {
            Self::Int1 => Some(1),
            Self::Int2 => Some(2),
            Self::Int4 | Self::Float4 => Some(4),
            Self::Int8 | Self::Float8 => Some(8),
            _ => None,
        }
    }

    /// Get the SQL name used in error messages and display.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Int1 => "TINYINT",
            Self::Int2 => "SMALLINT",
            Self::Int4 => "INT",
            Self::Int8 => "BIGINT",
            Self::Float4 => "REAL",
            Self::Float8 => "FLOAT",
            Self::IntN => "INTN",
            Self::FloatN => "FLOATN",
            Self::BigVarChar => "VARCHAR",
            Self::BigChar => "CHAR",
            Self::NVarChar => "NVARCHAR",
            Self::NChar => "NCHAR",
            Self::BigVarBinary => "VARBINARY",
            Self::BigBinary => "BINARY",
            Self::Xml => "XML",
        }
    }
}

impl std::fmt::Display for WireType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [WireType; 15] = [
        WireType::Int1,
        WireType::Int2,
        WireType::Int4,
        WireType::Int8,
        WireType::Float4,
        WireType::Float8,
        WireType::IntN,
        WireType::FloatN,
        WireType::BigVarChar,
        WireType::BigChar,
        WireType::NVarChar,
        WireType::NChar,
        WireType::BigVarBinary,
        WireType::BigBinary,
        WireType::Xml,
    ];

    #[test]
    fn test_tag_roundtrip() {
        for ty in ALL {
            assert_eq!(WireType::from_u8(ty.as_u8()), Some(ty));
        }
        assert_eq!(WireType::from_u8(0x00), None);
        // DATETIME2 is a real TDS tag but not bindable here
        assert_eq!(WireType::from_u8(0x2A), None);
    }

    #[test]
    fn test_classes_are_disjoint() {
        for ty in ALL {
            let classes = [
                ty.is_fixed_length(),
                ty.is_nullable_variant(),
                ty.is_character(),
                ty.is_binary(),
            ];
            assert_eq!(classes.iter().filter(|c| **c).count(), 1, "{ty}");
        }
    }

    #[test]
    fn test_fixed_width() {
        assert_eq!(WireType::Int1.fixed_width(), Some(1));
        assert_eq!(WireType::Float8.fixed_width(), Some(8));
        assert_eq!(WireType::IntN.fixed_width(), None);
    }
}
