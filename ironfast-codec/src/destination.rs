/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Byte destinations written by the encoder.

use bytes::{BufMut, BytesMut};

/// A push-based sink for FAST-encoded bytes.
pub trait DataDestination {
    /// Appends one byte.
    fn put_byte(&mut self, byte: u8);

    /// Appends a run of bytes.
    fn put_slice(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.put_byte(b);
        }
    }
}

impl DataDestination for Vec<u8> {
    #[inline]
    fn put_byte(&mut self, byte: u8) {
        self.push(byte);
    }

    #[inline]
    fn put_slice(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

impl DataDestination for BytesMut {
    #[inline]
    fn put_byte(&mut self, byte: u8) {
        self.put_u8(byte);
    }

    #[inline]
    fn put_slice(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_destination() {
        let mut out = Vec::new();
        out.put_byte(0x80);
        DataDestination::put_slice(&mut out, &[1, 2]);
        assert_eq!(out, vec![0x80, 1, 2]);
    }

    #[test]
    fn test_bytes_mut_destination() {
        let mut out = BytesMut::new();
        DataDestination::put_byte(&mut out, 0x81);
        DataDestination::put_slice(&mut out, &[3]);
        assert_eq!(&out[..], &[0x81, 3]);
    }
}
