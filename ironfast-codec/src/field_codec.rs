/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Wire representation of scalar field values.
//!
//! [`Scalar`] binds a value type to its nullability and knows how to read and
//! write plain values, delta values and tails of that type. The operator logic
//! in [`crate::instruction`] decides *when* bytes are read or written; this
//! module decides *what* they look like.

use bytes::Bytes;
use ironfast_core::decimal::{Decimal, MAX_EXPONENT, MIN_EXPONENT};
use ironfast_core::error::EncodingError;
use ironfast_core::value::{FieldValue, ValueType};
use tracing::warn;

use crate::destination::DataDestination;
use crate::primitives::{
    decode_ascii, decode_byte_vector, decode_signed, decode_signed_raw, decode_unsigned,
    encode_ascii, encode_byte_vector, encode_nullable_unsigned,
    encode_signed, encode_unsigned, NULL_BYTE,
};
use crate::source::DataSource;

/// How one scalar field appears on the wire.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scalar<'a> {
    /// Qualified field name, for error messages.
    pub name: &'a str,
    /// Declared type.
    pub value_type: ValueType,
    /// True for optional fields; selects the nullable encodings.
    pub nullable: bool,
    /// Strict conformance checks.
    pub strict: bool,
    /// Largest byte vector length accepted on read.
    pub max_length: usize,
}

impl Scalar<'_> {
    /// Reads a plain value. `None` is the null sentinel.
    pub fn read<S: DataSource>(&self, source: &mut S) -> Result<Option<FieldValue>, EncodingError> {
        let value = match self.value_type {
            ValueType::Int32 => decode_signed(source, self.nullable)?
                .map(|v| int_value(ValueType::Int32, v))
                .transpose()?,
            ValueType::Int64 => decode_signed(source, self.nullable)?
                .map(|v| int_value(ValueType::Int64, v))
                .transpose()?,
            ValueType::UInt32 => decode_unsigned(source, self.nullable)?
                .map(|v| int_value(ValueType::UInt32, i128::from(v)))
                .transpose()?,
            ValueType::UInt64 => decode_unsigned(source, self.nullable)?.map(FieldValue::UInt64),
            ValueType::Decimal => {
                let Some(exponent) = decode_signed(source, self.nullable)? else {
                    return Ok(None);
                };
                Some(self.decimal(exponent, decode_signed_raw(source)?)?)
            }
            ValueType::Ascii => decode_ascii(source, self.nullable)?
                .map(|bytes| self.bytes_value(&bytes))
                .transpose()?,
            ValueType::Unicode | ValueType::ByteVector => self
                .read_byte_vector(source, self.nullable)?
                .map(|bytes| self.bytes_value(&bytes))
                .transpose()?,
            ValueType::Group | ValueType::Sequence => return Err(self.not_scalar()),
        };
        Ok(value)
    }

    /// Writes a plain value, or the null sentinel for `None`.
    ///
    /// The value must already have this scalar's type (see [`Scalar::coerce`]).
    pub fn write<D: DataDestination>(
        &self,
        dest: &mut D,
        value: Option<&FieldValue>,
    ) -> Result<(), EncodingError> {
        let Some(value) = value else {
            dest.put_byte(NULL_BYTE);
            return Ok(());
        };
        match value {
            FieldValue::Int32(v) => encode_signed(dest, i128::from(*v), self.nullable),
            FieldValue::Int64(v) => encode_signed(dest, i128::from(*v), self.nullable),
            FieldValue::UInt32(v) => self.write_unsigned(dest, u64::from(*v)),
            FieldValue::UInt64(v) => self.write_unsigned(dest, *v),
            FieldValue::Decimal(d) => {
                self.check_wire_decimal(*d)?;
                encode_signed(dest, i128::from(d.exponent()), self.nullable);
                encode_signed(dest, i128::from(d.mantissa()), false);
            }
            FieldValue::Ascii(s) => {
                self.check_ascii(s.as_bytes())?;
                encode_ascii(dest, Some(s.as_bytes()), self.nullable);
            }
            FieldValue::Unicode(s) => encode_byte_vector(dest, Some(s.as_bytes()), self.nullable),
            FieldValue::ByteVector(b) => encode_byte_vector(dest, Some(b.as_ref()), self.nullable),
            FieldValue::Group(_) | FieldValue::Sequence(_) => return Err(self.not_scalar()),
        }
        Ok(())
    }

    fn write_unsigned<D: DataDestination>(&self, dest: &mut D, value: u64) {
        if self.nullable {
            encode_nullable_unsigned(dest, Some(value));
        } else {
            encode_unsigned(dest, value);
        }
    }

    /// Reads a delta and applies it to `base`. `None` means the field is absent.
    pub fn read_delta<S: DataSource>(
        &self,
        source: &mut S,
        base: &FieldValue,
    ) -> Result<Option<FieldValue>, EncodingError> {
        let Some(delta) = decode_signed(source, self.nullable)? else {
            return Ok(None);
        };
        let value = match base {
            FieldValue::Decimal(d) => {
                let mantissa = decode_signed_raw(source)?;
                self.decimal(
                    i128::from(d.exponent()) + delta,
                    i128::from(d.mantissa()) + mantissa,
                )?
            }
            FieldValue::Ascii(_) | FieldValue::Unicode(_) | FieldValue::ByteVector(_) => {
                let literal = self.read_literal(source)?;
                let base = base.as_bytes().unwrap_or_default();
                self.bytes_value(&apply_subtraction(self.name, base, delta, &literal)?)?
            }
            other => {
                let base = other.as_i128().ok_or_else(|| self.not_scalar())?;
                int_value(self.value_type, base + delta)?
            }
        };
        Ok(Some(value))
    }

    /// Writes `value` as a delta against `base`; `None` writes the null sentinel.
    pub fn write_delta<D: DataDestination>(
        &self,
        dest: &mut D,
        value: Option<&FieldValue>,
        base: &FieldValue,
    ) -> Result<(), EncodingError> {
        let Some(value) = value else {
            dest.put_byte(NULL_BYTE);
            return Ok(());
        };
        match (value, base) {
            (FieldValue::Decimal(v), FieldValue::Decimal(b)) => {
                self.check_wire_decimal(*v)?;
                let exponent = i128::from(v.exponent()) - i128::from(b.exponent());
                let mantissa = i128::from(v.mantissa()) - i128::from(b.mantissa());
                encode_signed(dest, exponent, self.nullable);
                encode_signed(dest, mantissa, false);
            }
            (FieldValue::Ascii(_) | FieldValue::Unicode(_) | FieldValue::ByteVector(_), _) => {
                let value = value.as_bytes().unwrap_or_default();
                let base = base.as_bytes().unwrap_or_default();
                if self.value_type == ValueType::Ascii {
                    self.check_ascii(value)?;
                }
                let (subtraction, literal) = string_delta(base, value);
                encode_signed(dest, subtraction, self.nullable);
                self.write_literal(dest, literal);
            }
            _ => {
                let (Some(v), Some(b)) = (value.as_i128(), base.as_i128()) else {
                    return Err(self.mismatch(value));
                };
                encode_signed(dest, v - b, self.nullable);
            }
        }
        Ok(())
    }

    /// Reads a tail and merges it into `base`. `None` means the field is absent.
    pub fn read_tail<S: DataSource>(
        &self,
        source: &mut S,
        base: &FieldValue,
    ) -> Result<Option<FieldValue>, EncodingError> {
        let tail = match self.value_type {
            ValueType::Ascii => decode_ascii(source, self.nullable)?.map(|b| b.to_vec()),
            _ => self.read_byte_vector(source, self.nullable)?.map(|b| b.to_vec()),
        };
        let Some(tail) = tail else {
            return Ok(None);
        };
        let base = base.as_bytes().unwrap_or_default();
        if tail.len() >= base.len() {
            return self.bytes_value(&tail).map(Some);
        }
        let mut merged = base[..base.len() - tail.len()].to_vec();
        merged.extend_from_slice(&tail);
        self.bytes_value(&merged).map(Some)
    }

    /// Writes the shortest tail turning `base` into `value`.
    ///
    /// # Errors
    /// Returns `NotTailEncodable` if `value` is shorter than `base`.
    pub fn write_tail<D: DataDestination>(
        &self,
        dest: &mut D,
        value: Option<&FieldValue>,
        base: &FieldValue,
    ) -> Result<(), EncodingError> {
        let Some(value) = value else {
            dest.put_byte(NULL_BYTE);
            return Ok(());
        };
        let bytes = value.as_bytes().ok_or_else(|| self.mismatch(value))?;
        let base = base.as_bytes().unwrap_or_default();
        if bytes.len() < base.len() {
            return Err(EncodingError::NotTailEncodable {
                name: self.name.to_string(),
            });
        }
        let tail = if bytes.len() > base.len() {
            bytes
        } else {
            &bytes[common_prefix(base, bytes)..]
        };
        if self.value_type == ValueType::Ascii {
            self.check_ascii(tail)?;
            encode_ascii(dest, Some(tail), self.nullable);
        } else {
            encode_byte_vector(dest, Some(tail), self.nullable);
        }
        Ok(())
    }

    /// Converts application data to this scalar's type.
    ///
    /// Strict mode accepts only the exact type. Otherwise integers convert
    /// between widths when the value fits, and ascii and unicode strings are
    /// interchangeable.
    pub fn coerce(&self, value: &FieldValue) -> Result<FieldValue, EncodingError> {
        if value.is_type(self.value_type) {
            return Ok(value.clone());
        }
        if self.strict {
            return Err(self.mismatch(value));
        }
        let converted = match (value, self.value_type) {
            (FieldValue::Unicode(s), ValueType::Ascii) => FieldValue::Ascii(s.clone()),
            (FieldValue::Ascii(s), ValueType::Unicode) => FieldValue::Unicode(s.clone()),
            _ if value.value_type().is_integer() && self.value_type.is_integer() => value
                .as_i128()
                .and_then(|v| int_value(self.value_type, v).ok())
                .ok_or_else(|| self.mismatch(value))?,
            _ => return Err(self.mismatch(value)),
        };
        warn!(
            field = self.name,
            from = %value.value_type(),
            to = %self.value_type,
            "converted application value"
        );
        Ok(converted)
    }

    fn read_literal<S: DataSource>(&self, source: &mut S) -> Result<Vec<u8>, EncodingError> {
        if self.value_type == ValueType::Ascii {
            Ok(decode_ascii(source, false)?.map(|b| b.to_vec()).unwrap_or_default())
        } else {
            Ok(self.read_byte_vector(source, false)?.map(|b| b.to_vec()).unwrap_or_default())
        }
    }

    fn read_byte_vector<S: DataSource>(
        &self,
        source: &mut S,
        nullable: bool,
    ) -> Result<Option<Bytes>, EncodingError> {
        decode_byte_vector(source, nullable, self.max_length).map_err(|err| match err {
            EncodingError::LengthTooLarge { length, .. } => EncodingError::LengthTooLarge {
                name: self.name.to_string(),
                length,
            },
            other => other,
        })
    }

    fn write_literal<D: DataDestination>(&self, dest: &mut D, literal: &[u8]) {
        if self.value_type == ValueType::Ascii {
            encode_ascii(dest, Some(literal), false);
        } else {
            encode_byte_vector(dest, Some(literal), false);
        }
    }

    fn bytes_value(&self, bytes: &[u8]) -> Result<FieldValue, EncodingError> {
        let text = || {
            std::str::from_utf8(bytes).map_err(|_| EncodingError::InvalidString {
                name: self.name.to_string(),
            })
        };
        match self.value_type {
            ValueType::Ascii => text().map(FieldValue::ascii),
            ValueType::Unicode => text().map(FieldValue::unicode),
            _ => Ok(FieldValue::ByteVector(Bytes::copy_from_slice(bytes))),
        }
    }

    /// Builds a decimal from wide components, checking both ranges.
    pub fn decimal(&self, exponent: i128, mantissa: i128) -> Result<FieldValue, EncodingError> {
        let exponent = self.check_exponent(exponent)?;
        let mantissa = i64::try_from(mantissa).map_err(|_| overflow(ValueType::Int64))?;
        Ok(FieldValue::Decimal(Decimal::new(mantissa, exponent)))
    }

    fn check_exponent(&self, exponent: i128) -> Result<i8, EncodingError> {
        let out_of_range = || EncodingError::ExponentOutOfRange {
            name: self.name.to_string(),
            exponent: i64::try_from(exponent).unwrap_or(i64::MAX),
        };
        let exponent8 = i8::try_from(exponent).map_err(|_| out_of_range())?;
        if (MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent8) {
            return Ok(exponent8);
        }
        if self.strict {
            return Err(out_of_range());
        }
        warn!(field = self.name, exponent, "decimal exponent outside wire range");
        Ok(exponent8)
    }

    /// Rejects decimals whose exponent cannot be sent.
    pub fn check_wire_decimal(&self, value: Decimal) -> Result<(), EncodingError> {
        self.check_exponent(i128::from(value.exponent())).map(|_| ())
    }

    fn check_ascii(&self, bytes: &[u8]) -> Result<(), EncodingError> {
        if bytes.is_ascii() {
            Ok(())
        } else {
            Err(EncodingError::InvalidString {
                name: self.name.to_string(),
            })
        }
    }

    fn mismatch(&self, value: &FieldValue) -> EncodingError {
        EncodingError::TypeMismatch {
            name: self.name.to_string(),
            expected: self.value_type,
            actual: value.value_type(),
        }
    }

    fn not_scalar(&self) -> EncodingError {
        EncodingError::TypeMismatch {
            name: self.name.to_string(),
            expected: self.value_type,
            actual: self.value_type,
        }
    }
}

/// Returns the base value an operator starts from when neither the
/// dictionary nor the template supplies one.
#[must_use]
pub(crate) fn zero_value(value_type: ValueType) -> FieldValue {
    match value_type {
        ValueType::Int32 => FieldValue::Int32(0),
        ValueType::UInt32 => FieldValue::UInt32(0),
        ValueType::Int64 => FieldValue::Int64(0),
        ValueType::UInt64 => FieldValue::UInt64(0),
        ValueType::Decimal => FieldValue::Decimal(Decimal::default()),
        ValueType::Ascii => FieldValue::ascii(""),
        ValueType::Unicode => FieldValue::unicode(""),
        _ => FieldValue::ByteVector(Bytes::new()),
    }
}

/// Adds one to an integer value, wrapping at the type's bounds.
#[must_use]
pub(crate) fn increment(value: &FieldValue) -> Option<FieldValue> {
    match value {
        FieldValue::Int32(v) => Some(FieldValue::Int32(v.wrapping_add(1))),
        FieldValue::UInt32(v) => Some(FieldValue::UInt32(v.wrapping_add(1))),
        FieldValue::Int64(v) => Some(FieldValue::Int64(v.wrapping_add(1))),
        FieldValue::UInt64(v) => Some(FieldValue::UInt64(v.wrapping_add(1))),
        _ => None,
    }
}

/// Narrows a wide integer to the given integer type.
pub(crate) fn int_value(value_type: ValueType, value: i128) -> Result<FieldValue, EncodingError> {
    let converted = match value_type {
        ValueType::Int32 => i32::try_from(value).ok().map(FieldValue::Int32),
        ValueType::UInt32 => u32::try_from(value).ok().map(FieldValue::UInt32),
        ValueType::Int64 => i64::try_from(value).ok().map(FieldValue::Int64),
        ValueType::UInt64 => u64::try_from(value).ok().map(FieldValue::UInt64),
        _ => None,
    };
    converted.ok_or_else(|| overflow(value_type))
}

fn overflow(value_type: ValueType) -> EncodingError {
    EncodingError::IntegerOverflow {
        type_name: value_type.as_str(),
    }
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[u8], b: &[u8]) -> usize {
    a.iter().rev().zip(b.iter().rev()).take_while(|(x, y)| x == y).count()
}

/// Chooses between appending to the kept front of `base` and prepending to
/// its kept back, whichever sends the shorter literal.
///
/// A non-negative subtraction length removes bytes from the back; a negative
/// one removes `-(len + 1)` bytes from the front.
fn string_delta<'v>(base: &[u8], value: &'v [u8]) -> (i128, &'v [u8]) {
    let prefix = common_prefix(base, value);
    let suffix = common_suffix(base, value);
    let append = (as_i128(base.len() - prefix), &value[prefix..]);
    let prepend = (
        -as_i128(base.len() - suffix) - 1,
        &value[..value.len() - suffix],
    );
    if prepend.1.len() < append.1.len() {
        prepend
    } else {
        append
    }
}

fn apply_subtraction(
    name: &str,
    base: &[u8],
    subtraction: i128,
    literal: &[u8],
) -> Result<Vec<u8>, EncodingError> {
    let (front, count) = if subtraction < 0 {
        (true, -(subtraction + 1))
    } else {
        (false, subtraction)
    };
    let count = usize::try_from(count)
        .ok()
        .filter(|&c| c <= base.len())
        .ok_or_else(|| EncodingError::LengthTooLarge {
            name: name.to_string(),
            length: usize::try_from(count).unwrap_or(usize::MAX),
        })?;
    let mut value = Vec::with_capacity(base.len() - count + literal.len());
    if front {
        value.extend_from_slice(literal);
        value.extend_from_slice(&base[count..]);
    } else {
        value.extend_from_slice(&base[..base.len() - count]);
        value.extend_from_slice(literal);
    }
    Ok(value)
}

#[inline]
fn as_i128(len: usize) -> i128 {
    i128::try_from(len).unwrap_or(i128::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SliceSource;

    fn scalar(value_type: ValueType, nullable: bool) -> Scalar<'static> {
        Scalar {
            name: "f",
            value_type,
            nullable,
            strict: true,
            max_length: 1024,
        }
    }

    fn written(s: &Scalar<'_>, value: Option<&FieldValue>) -> Vec<u8> {
        let mut out = Vec::new();
        s.write(&mut out, value).unwrap();
        out
    }

    #[test]
    fn test_read_integer_widths() {
        let mut source = SliceSource::new(&[0x81, 0xFF, 0x82]);
        assert_eq!(
            scalar(ValueType::UInt32, false).read(&mut source).unwrap(),
            Some(FieldValue::UInt32(1))
        );
        assert_eq!(
            scalar(ValueType::Int64, false).read(&mut source).unwrap(),
            Some(FieldValue::Int64(-1))
        );
        assert_eq!(
            scalar(ValueType::Int32, true).read(&mut source).unwrap(),
            Some(FieldValue::Int32(1))
        );
    }

    #[test]
    fn test_read_uint32_overflow() {
        // 2^32 = 0x10 0x00 0x00 0x00 0x00 in 7-bit groups
        let mut source = SliceSource::new(&[0x10, 0x00, 0x00, 0x00, 0x80]);
        assert!(matches!(
            scalar(ValueType::UInt32, false).read(&mut source),
            Err(EncodingError::IntegerOverflow { type_name: "uInt32" })
        ));
    }

    #[test]
    fn test_decimal_wire_format() {
        let s = scalar(ValueType::Decimal, true);
        let value = FieldValue::Decimal(Decimal::new(150, -2));
        let bytes = written(&s, Some(&value));
        // exponent -2 (not biased), mantissa 150 = 0x01 0x16
        assert_eq!(bytes, vec![0xFE, 0x01, 0x96]);

        let mut source = SliceSource::new(&bytes);
        assert_eq!(s.read(&mut source).unwrap(), Some(value));

        let mut null = SliceSource::new(&[0x80]);
        assert_eq!(s.read(&mut null).unwrap(), None);
        assert!(null.is_exhausted());
    }

    #[test]
    fn test_decimal_exponent_range() {
        // exponent 64 = 0x00 0xC0
        let data = [0x00, 0xC0, 0x81];
        let mut source = SliceSource::new(&data);
        assert!(matches!(
            scalar(ValueType::Decimal, false).read(&mut source),
            Err(EncodingError::ExponentOutOfRange { exponent: 64, .. })
        ));

        let mut lenient = scalar(ValueType::Decimal, false);
        lenient.strict = false;
        let mut source = SliceSource::new(&data);
        assert_eq!(
            lenient.read(&mut source).unwrap(),
            Some(FieldValue::Decimal(Decimal::new(1, 64)))
        );
    }

    #[test]
    fn test_unicode_and_bytes() {
        let s = scalar(ValueType::Unicode, false);
        let bytes = written(&s, Some(&FieldValue::unicode("é")));
        assert_eq!(bytes, vec![0x82, 0xC3, 0xA9]);
        let mut source = SliceSource::new(&bytes);
        assert_eq!(s.read(&mut source).unwrap(), Some(FieldValue::unicode("é")));

        let mut bad = SliceSource::new(&[0x81, 0xFF]);
        assert!(matches!(s.read(&mut bad), Err(EncodingError::InvalidString { .. })));
    }

    #[test]
    fn test_write_non_ascii_rejected() {
        let s = scalar(ValueType::Ascii, false);
        let mut out = Vec::new();
        assert!(matches!(
            s.write(&mut out, Some(&FieldValue::ascii("é"))),
            Err(EncodingError::InvalidString { .. })
        ));
    }

    #[test]
    fn test_integer_delta() {
        let s = scalar(ValueType::UInt32, false);
        let base = FieldValue::UInt32(100);
        let mut out = Vec::new();
        s.write_delta(&mut out, Some(&FieldValue::UInt32(98)), &base).unwrap();
        assert_eq!(out, vec![0xFE]);

        let mut source = SliceSource::new(&out);
        assert_eq!(s.read_delta(&mut source, &base).unwrap(), Some(FieldValue::UInt32(98)));

        let mut negative = SliceSource::new(&[0xFE]);
        assert!(matches!(
            s.read_delta(&mut negative, &FieldValue::UInt32(1)),
            Err(EncodingError::IntegerOverflow { .. })
        ));
    }

    #[test]
    fn test_decimal_delta_nullable_exponent() {
        let s = scalar(ValueType::Decimal, true);
        let base = FieldValue::Decimal(Decimal::default());
        // exponent delta 0 biased to 1, mantissa delta 150
        let mut source = SliceSource::new(&[0x81, 0x01, 0x96]);
        assert_eq!(
            s.read_delta(&mut source, &base).unwrap(),
            Some(FieldValue::Decimal(Decimal::new(150, 0)))
        );

        let mut null = SliceSource::new(&[0x80, 0x81]);
        assert_eq!(s.read_delta(&mut null, &base).unwrap(), None);
        assert_eq!(null.position(), 1);
    }

    #[test]
    fn test_string_delta_append_and_prepend() {
        assert_eq!(string_delta(b"ABCD", b"ABXY"), (2, &b"XY"[..]));
        assert_eq!(string_delta(b"ABCD", b"XCD"), (-3, &b"X"[..]));
        assert_eq!(string_delta(b"", b"AB"), (0, &b"AB"[..]));

        assert_eq!(apply_subtraction("f", b"ABCD", 2, b"XY").unwrap(), b"ABXY");
        assert_eq!(apply_subtraction("f", b"ABCD", -3, b"X").unwrap(), b"XCD");
        assert!(matches!(
            apply_subtraction("f", b"AB", 3, b""),
            Err(EncodingError::LengthTooLarge { length: 3, .. })
        ));
    }

    #[test]
    fn test_ascii_delta_round_trip() {
        let s = scalar(ValueType::Ascii, true);
        let base = FieldValue::ascii("GEH6");
        let value = FieldValue::ascii("GEM6");
        let mut out = Vec::new();
        s.write_delta(&mut out, Some(&value), &base).unwrap();
        let mut source = SliceSource::new(&out);
        assert_eq!(s.read_delta(&mut source, &base).unwrap(), Some(value));
        assert!(source.is_exhausted());
    }

    #[test]
    fn test_tail() {
        let s = scalar(ValueType::Ascii, false);
        let base = FieldValue::ascii("ABCD");
        let mut out = Vec::new();
        s.write_tail(&mut out, Some(&FieldValue::ascii("ABXY")), &base).unwrap();
        assert_eq!(out, vec![b'X', b'Y' | 0x80]);

        let mut source = SliceSource::new(&out);
        assert_eq!(s.read_tail(&mut source, &base).unwrap(), Some(FieldValue::ascii("ABXY")));

        let mut longer = SliceSource::new(&[b'Z', b'Z', b'Z', b'Z', b'Z' | 0x80]);
        assert_eq!(
            s.read_tail(&mut longer, &base).unwrap(),
            Some(FieldValue::ascii("ZZZZZ"))
        );

        let mut out = Vec::new();
        assert!(matches!(
            s.write_tail(&mut out, Some(&FieldValue::ascii("AB")), &base),
            Err(EncodingError::NotTailEncodable { .. })
        ));
    }

    #[test]
    fn test_coerce() {
        let strict = scalar(ValueType::UInt32, false);
        assert!(matches!(
            strict.coerce(&FieldValue::Int64(5)),
            Err(EncodingError::TypeMismatch { .. })
        ));

        let mut lenient = strict;
        lenient.strict = false;
        assert_eq!(lenient.coerce(&FieldValue::Int64(5)).unwrap(), FieldValue::UInt32(5));
        assert!(lenient.coerce(&FieldValue::Int64(-5)).is_err());

        let mut text = scalar(ValueType::Ascii, false);
        text.strict = false;
        assert_eq!(
            text.coerce(&FieldValue::unicode("IBM")).unwrap(),
            FieldValue::ascii("IBM")
        );
    }

    #[test]
    fn test_increment_wraps() {
        assert_eq!(increment(&FieldValue::UInt32(u32::MAX)), Some(FieldValue::UInt32(0)));
        assert_eq!(increment(&FieldValue::Int64(5)), Some(FieldValue::Int64(6)));
        assert_eq!(increment(&FieldValue::ascii("x")), None);
    }
}
