//! # bcp-types
//!
//! Row values, TDS wire type tags and bulk-copy type coercion.
//!
//! A bulk-copy row is a fixed-arity slice of [`Value`]s, one per destination
//! column. Each column is described by a [`ColumnBinding`]; the
//! [`TypeCoercer`] turns a value into a [`BoundValue`] (null indicator or
//! exact payload bytes), and [`BoundColumn::write_to`] applies the TDS row
//! framing.
//!
//! ## Type Mappings
//!
//! | SQL type | Wire type | Accepted values |
//! |----------|-----------|-----------------|
//! | `TINYINT` | `Int1` / `IntN(1)` | integer, integer text |
//! | `SMALLINT` | `Int2` / `IntN(2)` | integer, integer text |
//! | `INT` | `Int4` / `IntN(4)` | integer, integer text |
//! | `BIGINT` | `Int8` / `IntN(8)` | integer, integer text |
//! | `REAL` | `Float4` / `FloatN(4)` | float, integer, numeric text |
//! | `FLOAT` | `Float8` / `FloatN(8)` | float, integer, numeric text |
//! | `[N]VARCHAR`, `[N]CHAR` | `BigVarChar`, `BigChar`, `NVarChar`, `NChar` | text, integer, float |
//! | `VARBINARY`, `BINARY` | `BigVarBinary`, `BigBinary` | bytes, text |
//! | `XML` | `Xml` | bytes, text |
//!
//! NULL is accepted by every nullable column.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod binding;
pub mod bound;
pub mod decode;
pub mod encode;
pub mod error;
pub mod value;
pub mod wire;

pub use binding::{ColumnBinding, ColumnMetadata, SqlType};
pub use bound::{BoundColumn, BoundValue, encode_plp};
pub use decode::{decode, decode_utf16};
pub use encode::{CoercionOptions, DEFAULT_TEXT_SIZE, TypeCoercer, encode_utf16_string};
pub use error::TypeError;
pub use value::Value;
pub use wire::{MAX_SHORT_WIDTH, MAX_WIDTH_MARKER, WireType};
