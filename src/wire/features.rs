//! Raw feature vectors.
//!
//! Feature vectors advertise protocol capabilities as a bit field. Bit
//! `0` is the least significant bit of the *last* byte, so appending
//! higher feature bits grows the vector at the front. On the wire the
//! field is a 2-byte big-endian bit count followed by `ceil(bits / 8)`
//! bytes.
//!
//! The vector stores set bits only; serialization always emits the
//! minimal byte string covering the highest set bit.

use std::collections::BTreeSet;
use std::io::{Read, Write};

use super::codec::{read_u16, write_all, write_u16};
use super::WireError;

/// A set of feature bits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawFeatureVector {
    bits: BTreeSet<u16>,
}

impl RawFeatureVector {
    /// An empty vector. Encodes as a zero bit count and no data bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a feature bit.
    pub fn set(&mut self, bit: u16) -> &mut Self {
        self.bits.insert(bit);
        self
    }

    /// Clears a feature bit.
    pub fn unset(&mut self, bit: u16) {
        self.bits.remove(&bit);
    }

    /// Whether a feature bit is set.
    pub fn is_set(&self, bit: u16) -> bool {
        self.bits.contains(&bit)
    }

    /// The number of set bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether no bits are set.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The serialized bit count: one past the highest set bit.
    pub fn bit_len(&self) -> usize {
        self.bits
            .iter()
            .next_back()
            .map(|&b| b as usize + 1)
            .unwrap_or(0)
    }

    /// The minimal data bytes, without any length prefix.
    pub fn to_bytes(&self) -> Vec<u8> {
        let n_bytes = self.bit_len().div_ceil(8);
        let mut bytes = vec![0u8; n_bytes];
        for &bit in &self.bits {
            let byte = n_bytes - 1 - (bit as usize) / 8;
            bytes[byte] |= 1 << (bit % 8);
        }
        bytes
    }

    /// Rebuilds a vector from raw data bytes (as found inside a TLV
    /// record, where the record length already bounds the field).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut vector = Self::new();
        let n_bytes = bytes.len();
        for (i, &byte) in bytes.iter().enumerate() {
            for bit_in_byte in 0..8u16 {
                if byte & (1 << bit_in_byte) != 0 {
                    let bit = ((n_bytes - 1 - i) as u16) * 8 + bit_in_byte;
                    vector.set(bit);
                }
            }
        }
        vector
    }

    /// Writes the bit-count prefix and data bytes.
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        let bit_len = self.bit_len();
        if bit_len > u16::MAX as usize {
            return Err(WireError::BodyTooLarge(bit_len.div_ceil(8)));
        }
        write_u16(w, bit_len as u16)?;
        write_all(w, &self.to_bytes())
    }

    /// Reads a bit-count prefix and the data bytes it implies.
    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        let bit_len = read_u16(r, "feature bit count")? as usize;
        let n_bytes = bit_len.div_ceil(8);
        let mut bytes = vec![0u8; n_bytes];
        r.read_exact(&mut bytes).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                WireError::TruncatedField(format!("feature vector: {} bits declared", bit_len))
            } else {
                WireError::Io(e)
            }
        })?;
        Ok(Self::from_bytes(&bytes))
    }
}
