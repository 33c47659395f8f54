/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Byte sources consumed by the decoder.
//!
//! The decoder pulls one byte at a time. End of data is reported as `None`
//! rather than an error so that the decoder can tell a clean end of stream
//! at a message boundary from truncation inside a message.

use bytes::{Buf, Bytes};
use tracing::trace;

/// A pull-based source of FAST-encoded bytes.
pub trait DataSource {
    /// Called before each top-level message is decoded.
    fn begin_message(&mut self) {}

    /// Called before each field is decoded. Diagnostic hook only.
    fn begin_field(&mut self, _name: &str) {}

    /// Returns the next byte, or `None` at end of data.
    fn get_byte(&mut self) -> Option<u8>;
}

/// A [`DataSource`] over a byte slice.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> SliceSource<'a> {
    /// Creates a source positioned at the start of `data`.
    #[inline]
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Returns the number of bytes consumed so far.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.offset
    }

    /// Returns the unconsumed bytes.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    /// Returns true if every byte has been consumed.
    #[inline]
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.offset >= self.data.len()
    }
}

impl DataSource for SliceSource<'_> {
    fn begin_message(&mut self) {
        trace!(offset = self.offset, "begin message");
    }

    fn begin_field(&mut self, name: &str) {
        trace!(offset = self.offset, field = name, "begin field");
    }

    #[inline]
    fn get_byte(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.offset)?;
        self.offset += 1;
        Some(byte)
    }
}

impl DataSource for Bytes {
    #[inline]
    fn get_byte(&mut self) -> Option<u8> {
        self.has_remaining().then(|| self.get_u8())
    }
}
