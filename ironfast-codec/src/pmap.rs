/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FAST presence map handling.
//!
//! The presence map (PMAP) is a bitmap that indicates which fields of a
//! segment are present in the stream. It uses stop-bit encoding where the
//! high bit of each byte marks the last byte and the other 7 bits are map
//! bits, most significant first. Bits beyond the end of the transmitted map
//! are implicitly zero.

use crate::destination::DataDestination;
use crate::primitives::{DATA_BITS, STOP_BIT};
use crate::source::DataSource;
use smallvec::SmallVec;
use tracing::debug;

const BITS_PER_BYTE: usize = 7;

/// FAST presence map.
///
/// On decode the bits are consumed in order with [`check_next_field`];
/// on encode they are appended in order with [`set_next_field`]. The cursor
/// only moves forward.
///
/// [`check_next_field`]: PresenceMap::check_next_field
/// [`set_next_field`]: PresenceMap::set_next_field
#[derive(Debug, Clone, Default)]
pub struct PresenceMap {
    /// 7-bit groups, first map bit in bit 6 of the first group.
    groups: SmallVec<[u8; 8]>,
    /// Number of bits the owning segment declares.
    capacity: usize,
    /// Read or write cursor, in bits.
    position: usize,
}

impl PresenceMap {
    /// Creates an empty presence map for a segment using `capacity` bits.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            groups: SmallVec::with_capacity(capacity.div_ceil(BITS_PER_BYTE)),
            capacity,
            position: 0,
        }
    }

    /// Creates a presence map holding the given bits, cursor at the start.
    #[must_use]
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut pmap = Self::new(bits.len());
        for &bit in bits {
            pmap.set_next_field(bit);
        }
        pmap.position = 0;
        pmap
    }

    /// Reads a presence map from the source, replacing the current bits.
    ///
    /// # Returns
    /// `false` if the source ended before a byte with the stop bit was read.
    /// At a message boundary that is the normal end of input.
    pub fn decode<S: DataSource>(&mut self, source: &mut S) -> bool {
        self.groups.clear();
        self.position = 0;
        loop {
            let Some(byte) = source.get_byte() else {
                return false;
            };
            self.groups.push(byte & DATA_BITS);
            if byte & STOP_BIT != 0 {
                return true;
            }
        }
    }

    /// Writes the presence map, omitting trailing all-zero bytes.
    pub fn encode<D: DataDestination>(&self, dest: &mut D) {
        let used = self
            .groups
            .iter()
            .rposition(|&g| g != 0)
            .map_or(1, |last| last + 1);
        for i in 0..used {
            let group = self.groups.get(i).copied().unwrap_or(0);
            dest.put_byte(if i + 1 == used { group | STOP_BIT } else { group });
        }
    }

    /// Consumes the next bit.
    ///
    /// # Returns
    /// `true` if the field governed by this bit is present. Bits past the
    /// segment capacity always read as absent.
    #[inline]
    pub fn check_next_field(&mut self) -> bool {
        let position = self.position;
        self.position += 1;
        if position >= self.capacity {
            debug!(
                position,
                capacity = self.capacity,
                "presence map read past segment capacity"
            );
            return false;
        }
        self.bit(position)
    }

    /// Appends the next bit.
    #[inline]
    pub fn set_next_field(&mut self, present: bool) {
        let index = self.position / BITS_PER_BYTE;
        if index >= self.groups.len() {
            self.groups.push(0);
        }
        if present {
            self.groups[index] |= 0x40 >> (self.position % BITS_PER_BYTE);
        }
        self.position += 1;
    }

    /// Returns the bit at `index` without consuming it.
    #[must_use]
    pub fn bit(&self, index: usize) -> bool {
        self.groups
            .get(index / BITS_PER_BYTE)
            .is_some_and(|g| g & (0x40 >> (index % BITS_PER_BYTE)) != 0)
    }

    /// Returns the number of bits carried by the decoded bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len() * BITS_PER_BYTE
    }

    /// Returns true if no bytes have been decoded or written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the number of bits the owning segment declares.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the cursor position in bits.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns the position of the last set bit plus one.
    #[must_use]
    pub fn significant_bits(&self) -> usize {
        (0..self.len()).rev().find(|&i| self.bit(i)).map_or(0, |i| i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SliceSource;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_presence_map_decode_single_byte() {
        // stop bit set, map bits 100_0000
        let data = [0b1100_0000];
        let mut source = SliceSource::new(&data);
        let mut pmap = PresenceMap::new(3);
        assert!(pmap.decode(&mut source));

        assert_eq!(source.position(), 1);
        assert_eq!(pmap.len(), 7);
        assert!(pmap.bit(0));
        assert!(!pmap.bit(1));
        assert!(!pmap.bit(2));
    }

    #[test]
    fn test_presence_map_decode_multi_byte() {
        let data = [0b0100_0000, 0b1000_0001];
        let mut source = SliceSource::new(&data);
        let mut pmap = PresenceMap::new(14);
        assert!(pmap.decode(&mut source));

        assert_eq!(source.position(), 2);
        assert_eq!(pmap.len(), 14);
        assert!(pmap.bit(0));
        assert!(pmap.bit(13));
        assert_eq!(pmap.significant_bits(), 14);
    }

    #[test]
    fn test_presence_map_decode_eof() {
        let data = [0b0100_0000];
        let mut source = SliceSource::new(&data);
        let mut pmap = PresenceMap::new(7);
        assert!(!pmap.decode(&mut source));

        let mut empty = SliceSource::new(&[]);
        assert!(!pmap.decode(&mut empty));
    }

    #[test]
    fn test_presence_map_check_next_field() {
        let mut pmap = PresenceMap::from_bits(&[true, false, true]);

        assert!(pmap.check_next_field());
        assert!(!pmap.check_next_field());
        assert!(pmap.check_next_field());
        assert!(!pmap.check_next_field());
        assert_eq!(pmap.position(), 4);
    }

    #[test]
    fn test_presence_map_bits_past_capacity_read_absent() {
        let mut source = SliceSource::new(&[0b1110_0000]);
        let mut pmap = PresenceMap::new(1);
        assert!(pmap.decode(&mut source));

        assert!(pmap.check_next_field());
        assert!(!pmap.check_next_field());
        assert!(pmap.bit(1));
        assert_eq!(pmap.significant_bits(), 2);
    }

    #[test]
    fn test_presence_map_encode() {
        let pmap = PresenceMap::from_bits(&[true, true, false, false, false, false, false]);
        let mut out = Vec::new();
        pmap.encode(&mut out);
        assert_eq!(out, vec![0b1110_0000]);
    }

    #[test]
    fn test_presence_map_encode_trims_trailing_zero_bytes() {
        let mut bits = vec![true];
        bits.extend([false; 12]);
        let pmap = PresenceMap::from_bits(&bits);
        let mut out = Vec::new();
        pmap.encode(&mut out);
        assert_eq!(out, vec![0b1100_0000]);
    }

    #[test]
    fn test_presence_map_encode_empty() {
        let mut out = Vec::new();
        PresenceMap::new(0).encode(&mut out);
        assert_eq!(out, vec![0x80]);
    }

    #[quickcheck]
    fn prop_presence_map_round_trip(bits: Vec<bool>) -> bool {
        let mut out = Vec::new();
        PresenceMap::from_bits(&bits).encode(&mut out);

        let mut source = SliceSource::new(&out);
        let mut decoded = PresenceMap::new(bits.len());
        decoded.decode(&mut source)
            && source.is_exhausted()
            && bits.iter().all(|&b| decoded.check_next_field() == b)
    }
}
