/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Stop-bit primitive encodings.
//!
//! Every FAST primitive is a run of bytes whose high bit marks the last byte
//! of the run. Integers carry 7 data bits per byte, most significant group
//! first; signed integers are two's complement with the sign taken from bit
//! 6 of the first byte. Nullable encodings shift non-negative values up by
//! one so that a zero (the single byte `0x80`) can stand for null.

use bytes::Bytes;
use ironfast_core::error::EncodingError;
use smallvec::SmallVec;

use crate::destination::DataDestination;
use crate::source::DataSource;

/// High bit marking the last byte of a stop-bit encoded run.
pub const STOP_BIT: u8 = 0x80;

/// Mask for the 7 data bits of each byte.
pub const DATA_BITS: u8 = 0x7F;

/// Sign bit of the first byte of a signed integer.
pub const SIGN_BIT: u8 = 0x40;

/// Encoding of null for every nullable type.
pub const NULL_BYTE: u8 = 0x80;

/// Largest raw unsigned magnitude the decoder accepts (nullable `u64::MAX`).
const UNSIGNED_LIMIT: u128 = 1 << 64;

/// Largest raw signed magnitude the decoder accepts (`u64` deltas).
const SIGNED_LIMIT: i128 = 1 << 64;

/// Inline buffer for string bytes; short strings never touch the heap.
pub type ByteBuf = SmallVec<[u8; 32]>;

#[inline]
fn next_byte<S: DataSource>(source: &mut S, context: &'static str) -> Result<u8, EncodingError> {
    source
        .get_byte()
        .ok_or(EncodingError::UnexpectedEof { context })
}

/// Decodes a raw stop-bit unsigned integer.
///
/// # Errors
/// Returns `UnexpectedEof` if the run is truncated and `IntegerOverflow` if
/// the value exceeds 2^64.
pub fn decode_unsigned_raw<S: DataSource>(source: &mut S) -> Result<u128, EncodingError> {
    let mut result: u128 = 0;
    loop {
        let byte = next_byte(source, "unsigned integer")?;
        result = (result << 7) | u128::from(byte & DATA_BITS);
        if result > UNSIGNED_LIMIT {
            return Err(EncodingError::IntegerOverflow {
                type_name: "unsigned integer",
            });
        }
        if byte & STOP_BIT != 0 {
            return Ok(result);
        }
    }
}

/// Decodes a raw stop-bit signed integer.
///
/// # Errors
/// Returns `UnexpectedEof` if the run is truncated and `IntegerOverflow` if
/// the magnitude exceeds 2^64.
pub fn decode_signed_raw<S: DataSource>(source: &mut S) -> Result<i128, EncodingError> {
    let first = next_byte(source, "signed integer")?;
    let mut result: i128 = if first & SIGN_BIT != 0 { -1 } else { 0 };
    let mut byte = first;
    loop {
        result = (result << 7) | i128::from(byte & DATA_BITS);
        if !(-SIGNED_LIMIT..=SIGNED_LIMIT).contains(&result) {
            return Err(EncodingError::IntegerOverflow {
                type_name: "signed integer",
            });
        }
        if byte & STOP_BIT != 0 {
            return Ok(result);
        }
        byte = next_byte(source, "signed integer")?;
    }
}

/// Decodes an unsigned integer, treating zero as null when `nullable`.
///
/// # Errors
/// Propagates [`decode_unsigned_raw`] errors; `IntegerOverflow` if the
/// unbiased value does not fit a `u64`.
pub fn decode_unsigned<S: DataSource>(
    source: &mut S,
    nullable: bool,
) -> Result<Option<u64>, EncodingError> {
    let raw = decode_unsigned_raw(source)?;
    let value = if nullable {
        if raw == 0 {
            return Ok(None);
        }
        raw - 1
    } else {
        raw
    };
    u64::try_from(value)
        .map(Some)
        .map_err(|_| EncodingError::IntegerOverflow { type_name: "uInt64" })
}

/// Decodes a signed integer, treating zero as null when `nullable`.
///
/// The result is widened so callers can apply it as a delta to any width.
///
/// # Errors
/// Propagates [`decode_signed_raw`] errors.
pub fn decode_signed<S: DataSource>(
    source: &mut S,
    nullable: bool,
) -> Result<Option<i128>, EncodingError> {
    let raw = decode_signed_raw(source)?;
    if nullable {
        match raw {
            0 => Ok(None),
            v if v > 0 => Ok(Some(v - 1)),
            v => Ok(Some(v)),
        }
    } else {
        Ok(Some(raw))
    }
}

/// Encodes a raw unsigned integer.
pub fn encode_unsigned_raw<D: DataDestination>(dest: &mut D, value: u128) {
    let mut groups = [0u8; 10];
    let mut count = 0;
    let mut v = value;
    loop {
        groups[count] = (v & u128::from(DATA_BITS)) as u8;
        count += 1;
        v >>= 7;
        if v == 0 || count == groups.len() {
            break;
        }
    }
    write_groups(dest, &groups[..count]);
}

/// Encodes a raw signed integer.
pub fn encode_signed_raw<D: DataDestination>(dest: &mut D, value: i128) {
    let mut groups = [0u8; 10];
    let mut count = 0;
    let mut v = value;
    loop {
        let group = (v & i128::from(DATA_BITS)) as u8;
        groups[count] = group;
        count += 1;
        v >>= 7;
        let done = (v == 0 && group & SIGN_BIT == 0) || (v == -1 && group & SIGN_BIT != 0);
        if done || count == groups.len() {
            break;
        }
    }
    write_groups(dest, &groups[..count]);
}

/// Writes little-endian collected groups most significant first, with the
/// stop bit on the last byte.
#[inline]
fn write_groups<D: DataDestination>(dest: &mut D, groups: &[u8]) {
    for (i, &group) in groups.iter().enumerate().rev() {
        dest.put_byte(if i == 0 { group | STOP_BIT } else { group });
    }
}

/// Encodes an unsigned integer.
#[inline]
pub fn encode_unsigned<D: DataDestination>(dest: &mut D, value: u64) {
    encode_unsigned_raw(dest, u128::from(value));
}

/// Encodes a nullable unsigned integer.
pub fn encode_nullable_unsigned<D: DataDestination>(dest: &mut D, value: Option<u64>) {
    match value {
        Some(v) => encode_unsigned_raw(dest, u128::from(v) + 1),
        None => dest.put_byte(NULL_BYTE),
    }
}

/// Encodes a signed integer, biasing non-negative values when `nullable`.
pub fn encode_signed<D: DataDestination>(dest: &mut D, value: i128, nullable: bool) {
    if nullable && value >= 0 {
        encode_signed_raw(dest, value + 1);
    } else {
        encode_signed_raw(dest, value);
    }
}

/// Decodes an ASCII string.
///
/// A run consisting only of zero bytes is the escape for empty, null and
/// NUL-only strings: for mandatory fields `n` zero bytes stand for `n - 1`
/// NULs; for nullable fields a single zero byte is null and `n` zero bytes
/// stand for `n - 2` NULs.
///
/// # Errors
/// Returns `UnexpectedEof` if the run is truncated.
pub fn decode_ascii<S: DataSource>(
    source: &mut S,
    nullable: bool,
) -> Result<Option<ByteBuf>, EncodingError> {
    let mut buf = ByteBuf::new();
    loop {
        let byte = next_byte(source, "ascii string")?;
        buf.push(byte & DATA_BITS);
        if byte & STOP_BIT != 0 {
            break;
        }
    }

    if buf.iter().all(|&b| b == 0) {
        let zeros = buf.len();
        let escape = if nullable { 2 } else { 1 };
        if zeros < escape {
            return Ok(None);
        }
        buf.truncate(zeros - escape);
    }
    Ok(Some(buf))
}

/// Encodes an ASCII string; `None` writes null.
///
/// The caller guarantees every byte is 7-bit.
pub fn encode_ascii<D: DataDestination>(dest: &mut D, value: Option<&[u8]>, nullable: bool) {
    let Some(bytes) = value else {
        dest.put_byte(NULL_BYTE);
        return;
    };

    if bytes.iter().all(|&b| b == 0) {
        let escape = if nullable { 2 } else { 1 };
        let zeros = bytes.len() + escape;
        for _ in 1..zeros {
            dest.put_byte(0);
        }
        dest.put_byte(STOP_BIT);
        return;
    }

    let Some((last, head)) = bytes.split_last() else {
        return;
    };
    dest.put_slice(head);
    dest.put_byte(last | STOP_BIT);
}

/// Decodes a length-prefixed byte vector; the length is nullable when
/// `nullable`.
///
/// # Errors
/// Returns `LengthTooLarge` if the length exceeds `max_length` and
/// `UnexpectedEof` if the vector is truncated.
pub fn decode_byte_vector<S: DataSource>(
    source: &mut S,
    nullable: bool,
    max_length: usize,
) -> Result<Option<Bytes>, EncodingError> {
    let Some(length) = decode_unsigned(source, nullable)? else {
        return Ok(None);
    };
    let length = usize::try_from(length)
        .map_err(|_| EncodingError::IntegerOverflow { type_name: "length" })?;
    if length > max_length {
        return Err(EncodingError::LengthTooLarge {
            name: "byte vector".to_string(),
            length,
        });
    }

    let mut bytes = Vec::with_capacity(length.min(64 * 1024));
    for _ in 0..length {
        bytes.push(next_byte(source, "byte vector")?);
    }
    Ok(Some(Bytes::from(bytes)))
}

/// Encodes a length-prefixed byte vector; `None` writes null.
pub fn encode_byte_vector<D: DataDestination>(dest: &mut D, value: Option<&[u8]>, nullable: bool) {
    match value {
        Some(bytes) if nullable => encode_nullable_unsigned(dest, Some(bytes.len() as u64)),
        Some(bytes) => encode_unsigned(dest, bytes.len() as u64),
        None => dest.put_byte(NULL_BYTE),
    }
    if let Some(bytes) = value {
        dest.put_slice(bytes);
    }
}
