/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Field values.
//!
//! This module provides:
//! - [`ValueType`]: the kind of a field, used for dictionary type checks
//! - [`FieldValue`]: an immutable, cheaply clonable field value
//!
//! Cloning a [`FieldValue`] never copies string, byte or nested field set
//! contents; they are shared behind `Arc`/`Bytes`.

use crate::decimal::Decimal;
use crate::field_set::{FieldSet, Sequence};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The primitive kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 64-bit integer.
    UInt64,
    /// Scaled decimal.
    Decimal,
    /// 7-bit ASCII string.
    Ascii,
    /// UTF-8 string, length-prefixed on the wire.
    Unicode,
    /// Raw bytes, length-prefixed on the wire.
    ByteVector,
    /// Nested field set.
    Group,
    /// Repeated nested field sets.
    Sequence,
}

impl ValueType {
    /// Returns the FAST template name of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::UInt32 => "uInt32",
            Self::Int64 => "int64",
            Self::UInt64 => "uInt64",
            Self::Decimal => "decimal",
            Self::Ascii => "ascii",
            Self::Unicode => "unicode",
            Self::ByteVector => "byteVector",
            Self::Group => "group",
            Self::Sequence => "sequence",
        }
    }

    /// Returns true for the four integer types.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Int32 | Self::UInt32 | Self::Int64 | Self::UInt64)
    }

    /// Returns true for the types carried as a run of bytes.
    #[must_use]
    pub const fn is_byte_like(&self) -> bool {
        matches!(self, Self::Ascii | Self::Unicode | Self::ByteVector)
    }

    /// Returns true for groups and sequences.
    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(self, Self::Group | Self::Sequence)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Signed 32-bit integer.
    Int32(i32),
    /// Unsigned 32-bit integer.
    UInt32(u32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// Scaled decimal.
    Decimal(Decimal),
    /// ASCII string.
    Ascii(Arc<str>),
    /// Unicode string.
    Unicode(Arc<str>),
    /// Byte vector.
    ByteVector(Bytes),
    /// Group contents.
    Group(Arc<FieldSet>),
    /// Sequence entries.
    Sequence(Arc<Sequence>),
}

impl FieldValue {
    /// Creates an ASCII string value.
    #[must_use]
    pub fn ascii(value: &str) -> Self {
        Self::Ascii(Arc::from(value))
    }

    /// Creates a Unicode string value.
    #[must_use]
    pub fn unicode(value: &str) -> Self {
        Self::Unicode(Arc::from(value))
    }

    /// Creates a byte vector value.
    #[must_use]
    pub fn bytes(value: impl Into<Bytes>) -> Self {
        Self::ByteVector(value.into())
    }

    /// Creates a group value.
    #[must_use]
    pub fn group(fields: FieldSet) -> Self {
        Self::Group(Arc::new(fields))
    }

    /// Creates a sequence value.
    #[must_use]
    pub fn sequence(sequence: Sequence) -> Self {
        Self::Sequence(Arc::new(sequence))
    }

    /// Returns the type of the value.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Int32(_) => ValueType::Int32,
            Self::UInt32(_) => ValueType::UInt32,
            Self::Int64(_) => ValueType::Int64,
            Self::UInt64(_) => ValueType::UInt64,
            Self::Decimal(_) => ValueType::Decimal,
            Self::Ascii(_) => ValueType::Ascii,
            Self::Unicode(_) => ValueType::Unicode,
            Self::ByteVector(_) => ValueType::ByteVector,
            Self::Group(_) => ValueType::Group,
            Self::Sequence(_) => ValueType::Sequence,
        }
    }

    /// Returns true if the value has the given type.
    #[inline]
    #[must_use]
    pub fn is_type(&self, value_type: ValueType) -> bool {
        self.value_type() == value_type
    }

    /// Returns an integer value widened to `i128`.
    #[must_use]
    pub const fn as_i128(&self) -> Option<i128> {
        match self {
            Self::Int32(v) => Some(*v as i128),
            Self::UInt32(v) => Some(*v as i128),
            Self::Int64(v) => Some(*v as i128),
            Self::UInt64(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Returns the value as a u32, if it is a `UInt32`.
    #[must_use]
    pub const fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UInt32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a u64, if it is a `UInt64`.
    #[must_use]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an i32, if it is an `Int32`.
    #[must_use]
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an i64, if it is an `Int64`.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a decimal.
    #[must_use]
    pub const fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns string contents for ASCII and Unicode values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Ascii(s) | Self::Unicode(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the raw bytes of string and byte vector values.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Ascii(s) | Self::Unicode(s) => Some(s.as_bytes()),
            Self::ByteVector(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the nested field set of a group.
    #[must_use]
    pub fn as_group(&self) -> Option<&FieldSet> {
        match self {
            Self::Group(g) => Some(g),
            _ => None,
        }
    }

    /// Returns the entries of a sequence.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Self::Sequence(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int32(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Ascii(s) | Self::Unicode(s) => f.write_str(s),
            Self::ByteVector(b) => {
                for byte in b.iter() {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Self::Group(g) => write!(f, "{{{} fields}}", g.len()),
            Self::Sequence(s) => write!(f, "[{} entries]", s.len()),
        }
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::UInt32(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::UInt64(v)
    }
}

impl From<Decimal> for FieldValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type() {
        assert_eq!(FieldValue::UInt32(1).value_type(), ValueType::UInt32);
        assert_eq!(FieldValue::ascii("x").value_type(), ValueType::Ascii);
        assert!(FieldValue::Decimal(Decimal::new(1, 0)).is_type(ValueType::Decimal));
        assert!(ValueType::Int64.is_integer());
        assert!(ValueType::Unicode.is_byte_like());
        assert!(!ValueType::Decimal.is_byte_like());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(FieldValue::UInt32(7).as_u32(), Some(7));
        assert_eq!(FieldValue::UInt32(7).as_u64(), None);
        assert_eq!(FieldValue::Int64(-3).as_i128(), Some(-3));
        assert_eq!(FieldValue::ascii("IBM").as_bytes(), Some(&b"IBM"[..]));
        assert_eq!(FieldValue::unicode("é").as_str(), Some("é"));
    }

    #[test]
    fn test_clone_shares_contents() {
        let v = FieldValue::ascii("shared");
        let w = v.clone();
        match (&v, &w) {
            (FieldValue::Ascii(a), FieldValue::Ascii(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::bytes(vec![0xde, 0xad]).to_string(), "dead");
        assert_eq!(FieldValue::Decimal(Decimal::new(125, -1)).to_string(), "12.5");
    }
}
