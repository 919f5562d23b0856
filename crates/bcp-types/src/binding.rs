//! Destination column descriptions.
//!
//! A [`ColumnMetadata`] is what the transport reports for one column of the
//! destination table. A [`ColumnBinding`] is the validated, normalized form
//! the session binds rows against: 1-based ordinal, a known wire type and a
//! concrete byte width.

use crate::error::TypeError;
use crate::wire::{MAX_SHORT_WIDTH, MAX_WIDTH_MARKER, WireType};

/// Raw column metadata as reported by schema introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Column name.
    pub name: String,
    /// TDS type tag byte.
    pub type_id: u8,
    /// Declared maximum length in bytes (`0xFFFF` for `MAX`).
    pub max_length: u32,
    /// Whether the column allows NULL values.
    pub nullable: bool,
}

impl ColumnMetadata {
    /// Create column metadata.
    pub fn new(name: impl Into<String>, type_id: u8, max_length: u32, nullable: bool) -> Self {
        Self {
            name: name.into(),
            type_id,
            max_length,
            nullable,
        }
    }
}

/// One destination column as bound by a bulk-copy session.
///
/// Bindings are created once per session and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBinding {
    /// Position in the destination table, starting at 1.
    pub ordinal: u16,
    /// Column name.
    pub name: String,
    /// Wire type tag.
    pub wire_type: WireType,
    /// Maximum width in bytes, or [`MAX_WIDTH_MARKER`] for `MAX` columns.
    pub max_width: u32,
    /// Whether the column allows NULL values.
    pub nullable: bool,
}

impl ColumnBinding {
    /// Create a binding directly, without validation.
    pub fn new(ordinal: u16, name: impl Into<String>, wire_type: WireType, max_width: u32) -> Self {
        Self {
            ordinal,
            name: name.into(),
            wire_type,
            max_width,
            nullable: wire_type.is_nullable_variant() || !wire_type.is_fixed_length(),
        }
    }

    /// Set whether this column allows NULL values.
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Build a binding from reported metadata.
    ///
    /// Widths are normalized per wire type: fixed types take their natural
    /// width, XML is always `MAX`, and a nullable fixed numeric column is
    /// promoted to its null-capable variant so NULL has a representation.
    pub fn from_metadata(ordinal: u16, meta: &ColumnMetadata) -> Result<Self, TypeError> {
        let wire_type =
            WireType::from_u8(meta.type_id).ok_or(TypeError::UnsupportedType(meta.type_id))?;

        let (wire_type, max_width) = match wire_type {
            WireType::Int1 | WireType::Int2 | WireType::Int4 | WireType::Int8 => {
                let width = wire_type.fixed_width().unwrap_or(4);
                if meta.nullable {
                    (WireType::IntN, width)
                } else {
                    (wire_type, width)
                }
            }
            WireType::Float4 | WireType::Float8 => {
                let width = wire_type.fixed_width().unwrap_or(8);
                if meta.nullable {
                    (WireType::FloatN, width)
                } else {
                    (wire_type, width)
                }
            }
            WireType::IntN => match meta.max_length {
                1 | 2 | 4 | 8 => (wire_type, meta.max_length),
                width => {
                    return Err(TypeError::InvalidWidth {
                        target: wire_type.name(),
                        width,
                    });
                }
            },
            WireType::FloatN => match meta.max_length {
                4 | 8 => (wire_type, meta.max_length),
                width => {
                    return Err(TypeError::InvalidWidth {
                        target: wire_type.name(),
                        width,
                    });
                }
            },
            WireType::Xml => (wire_type, MAX_WIDTH_MARKER),
            _ => match meta.max_length {
                MAX_WIDTH_MARKER => (wire_type, MAX_WIDTH_MARKER),
                width if (1..=MAX_SHORT_WIDTH).contains(&width) => (wire_type, width),
                width => {
                    return Err(TypeError::InvalidWidth {
                        target: wire_type.name(),
                        width,
                    });
                }
            },
        };

        Ok(Self {
            ordinal,
            name: meta.name.clone(),
            wire_type,
            max_width,
            nullable: meta.nullable,
        })
    }

    /// Check if values of this column use PLP framing.
    #[must_use]
    pub fn is_plp(&self) -> bool {
        self.wire_type.is_plp()
            || (self.max_width == MAX_WIDTH_MARKER
                && (self.wire_type.is_character() || self.wire_type.is_binary()))
    }

    /// Get the byte limit for a value of this column.
    ///
    /// `MAX` columns are bounded by the session's text size instead of their
    /// declared width.
    #[must_use]
    pub fn byte_limit(&self, text_size: u32) -> usize {
        if self.is_plp() {
            text_size as usize
        } else {
            self.max_width as usize
        }
    }
}

/// A parsed SQL column type declaration such as `varchar(256) null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlType {
    /// Wire type the declaration maps to.
    pub wire_type: WireType,
    /// Width in bytes, or [`MAX_WIDTH_MARKER`].
    pub max_width: u32,
    /// Whether the declaration allows NULL.
    pub nullable: bool,
}

impl SqlType {
    /// Parse a column type declaration.
    ///
    /// A trailing `NULL` / `NOT NULL` sets nullability; without one the
    /// column is nullable.
    pub fn parse(decl: &str) -> Result<Self, TypeError> {
        let upper = decl.trim().to_uppercase();

        let (type_part, nullable) = if let Some(rest) = upper.strip_suffix("NOT NULL") {
            (rest.trim_end(), false)
        } else if let Some(rest) = upper.strip_suffix("NULL") {
            (rest.trim_end(), true)
        } else {
            (upper.as_str(), true)
        };

        // Extract base type and parameters
        let (base, params) = if let Some(paren_pos) = type_part.find('(') {
            let base = type_part[..paren_pos].trim();
            let params_str = type_part[paren_pos + 1..].trim_end_matches(')').trim();
            (base, Some(params_str))
        } else {
            (type_part, None)
        };

        let unknown = || TypeError::UnknownSqlType(decl.trim().to_string());
        let length = |default: u32| -> Result<u32, TypeError> {
            match params {
                None => Ok(default),
                Some("MAX") => Ok(MAX_WIDTH_MARKER),
                Some(p) => p.parse().map_err(|_| unknown()),
            }
        };

        let (wire_type, max_width) = match base {
            "TINYINT" => (WireType::Int1, 1),
            "SMALLINT" => (WireType::Int2, 2),
            "INT" | "INTEGER" => (WireType::Int4, 4),
            "BIGINT" => (WireType::Int8, 8),
            "REAL" => (WireType::Float4, 4),
            "FLOAT" | "DOUBLE PRECISION" => {
                // FLOAT(n) with n <= 24 is stored as REAL
                let bits: u32 = match params {
                    Some(p) => p.parse().map_err(|_| unknown())?,
                    None => 53,
                };
                if bits <= 24 {
                    (WireType::Float4, 4)
                } else {
                    (WireType::Float8, 8)
                }
            }
            "VARCHAR" => (WireType::BigVarChar, length(1)?),
            "CHAR" => (WireType::BigChar, length(1)?),
            "NVARCHAR" | "NCHAR" => {
                let wire_type = if base == "NVARCHAR" {
                    WireType::NVarChar
                } else {
                    WireType::NChar
                };
                match length(1)? {
                    // MAX types use 0xFFFF marker (not doubled)
                    MAX_WIDTH_MARKER => (wire_type, MAX_WIDTH_MARKER),
                    // Normal lengths are in characters, double for UTF-16 byte length
                    chars => (wire_type, chars * 2),
                }
            }
            "VARBINARY" => (WireType::BigVarBinary, length(1)?),
            "BINARY" => (WireType::BigBinary, length(1)?),
            "XML" => (WireType::Xml, MAX_WIDTH_MARKER),
            "TEXT" => (WireType::BigVarChar, MAX_WIDTH_MARKER),
            "NTEXT" => (WireType::NVarChar, MAX_WIDTH_MARKER),
            "IMAGE" => (WireType::BigVarBinary, MAX_WIDTH_MARKER),
            _ => return Err(unknown()),
        };

        if max_width == 0 || (max_width > MAX_SHORT_WIDTH && max_width != MAX_WIDTH_MARKER) {
            return Err(TypeError::InvalidWidth {
                target: wire_type.name(),
                width: max_width,
            });
        }

        Ok(Self {
            wire_type,
            max_width,
            nullable,
        })
    }

    /// Describe a column of this type as schema introspection would.
    #[must_use]
    pub fn to_metadata(&self, name: impl Into<String>) -> ColumnMetadata {
        ColumnMetadata::new(name, self.wire_type.as_u8(), self.max_width, self.nullable)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sql_type() {
        let ty = SqlType::parse("INT").unwrap();
        assert_eq!(ty.wire_type, WireType::Int4);
        assert!(ty.nullable);

        let ty = SqlType::parse("nvarchar(100)").unwrap();
        assert_eq!(ty.wire_type, WireType::NVarChar);
        assert_eq!(ty.max_width, 200); // UTF-16 doubles

        let ty = SqlType::parse("varchar(256) not null").unwrap();
        assert_eq!(ty.wire_type, WireType::BigVarChar);
        assert_eq!(ty.max_width, 256);
        assert!(!ty.nullable);

        let ty = SqlType::parse("float null").unwrap();
        assert_eq!(ty.wire_type, WireType::Float8);
        assert!(ty.nullable);

        let ty = SqlType::parse("FLOAT(10)").unwrap();
        assert_eq!(ty.wire_type, WireType::Float4);
    }

    #[test]
    fn test_parse_sql_type_max() {
        let ty = SqlType::parse("NVARCHAR(MAX)").unwrap();
        assert_eq!(ty.max_width, MAX_WIDTH_MARKER);

        let ty = SqlType::parse("VARBINARY(MAX)").unwrap();
        assert_eq!(ty.wire_type, WireType::BigVarBinary);
        assert_eq!(ty.max_width, MAX_WIDTH_MARKER);

        let ty = SqlType::parse("xml null").unwrap();
        assert_eq!(ty.wire_type, WireType::Xml);

        let ty = SqlType::parse("image").unwrap();
        assert_eq!(ty.wire_type, WireType::BigVarBinary);
        assert_eq!(ty.max_width, MAX_WIDTH_MARKER);
    }

    #[test]
    fn test_parse_sql_type_rejects() {
        assert!(matches!(
            SqlType::parse("DATETIME2"),
            Err(TypeError::UnknownSqlType(_))
        ));
        assert!(matches!(
            SqlType::parse("VARCHAR(9000)"),
            Err(TypeError::InvalidWidth { .. })
        ));
        assert!(SqlType::parse("VARCHAR(abc)").is_err());
    }

    #[test]
    fn test_nullable_fixed_is_promoted() {
        let meta = SqlType::parse("int null").unwrap().to_metadata("age");
        let binding = ColumnBinding::from_metadata(2, &meta).unwrap();
        assert_eq!(binding.wire_type, WireType::IntN);
        assert_eq!(binding.max_width, 4);
        assert_eq!(binding.ordinal, 2);

        let meta = SqlType::parse("int not null").unwrap().to_metadata("age");
        let binding = ColumnBinding::from_metadata(2, &meta).unwrap();
        assert_eq!(binding.wire_type, WireType::Int4);
        assert!(!binding.nullable);
    }

    #[test]
    fn test_from_metadata_rejects_bad_widths() {
        let meta = ColumnMetadata::new("n", WireType::IntN.as_u8(), 3, true);
        assert!(matches!(
            ColumnBinding::from_metadata(1, &meta),
            Err(TypeError::InvalidWidth { width: 3, .. })
        ));

        let meta = ColumnMetadata::new("s", WireType::BigVarChar.as_u8(), 0, true);
        assert!(ColumnBinding::from_metadata(1, &meta).is_err());

        let meta = ColumnMetadata::new("d", 0x2A, 8, true);
        assert_eq!(
            ColumnBinding::from_metadata(1, &meta),
            Err(TypeError::UnsupportedType(0x2A))
        );
    }

    #[test]
    fn test_plp_and_limits() {
        let short = ColumnBinding::new(1, "s", WireType::BigVarChar, 32);
        assert!(!short.is_plp());
        assert_eq!(short.byte_limit(1024), 32);

        let max = ColumnBinding::new(2, "m", WireType::BigVarBinary, MAX_WIDTH_MARKER);
        assert!(max.is_plp());
        assert_eq!(max.byte_limit(1024), 1024);

        let xml = ColumnBinding::new(3, "x", WireType::Xml, MAX_WIDTH_MARKER);
        assert!(xml.is_plp());
    }
}
