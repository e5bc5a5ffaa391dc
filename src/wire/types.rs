//! Identity and value types shared across wire messages.
//!
//! These are validated newtypes: construction checks shape (lengths,
//! compression prefixes, index bounds), after which access is infallible.
//! None of them interpret their contents; the codec treats keys, hashes,
//! and signatures as opaque fixed-width byte strings.

use std::fmt;
use std::io::{Read, Write};

use super::codec::{read_array, read_u16, write_all, write_u16};
use super::WireError;

/// A 33-byte compressed secp256k1 public key.
///
/// Doubles as the node identifier on the peer wire and in the admission
/// controller; the key bytes are never deserialized into curve points
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; 33]);

/// A peer's identity key.
pub type NodeId = PublicKey;

impl PublicKey {
    /// Wraps raw key bytes, checking the compression prefix.
    pub fn from_bytes(bytes: [u8; 33]) -> Result<Self, WireError> {
        if bytes[0] != 0x02 && bytes[0] != 0x03 {
            return Err(WireError::InvalidPublicKey(format!(
                "invalid compression prefix 0x{:02x}",
                bytes[0]
            )));
        }
        Ok(Self(bytes))
    }

    /// The serialized compressed form.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        write_all(w, &self.0)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        let bytes = read_array::<33, _>(r, "public key")?;
        Self::from_bytes(bytes)
    }
}

impl Default for PublicKey {
    /// The all-zero key under an even-parity prefix. A placeholder for
    /// freshly constructed empty messages, never a usable key.
    fn default() -> Self {
        let mut bytes = [0u8; 33];
        bytes[0] = 0x02;
        Self(bytes)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A 64-byte ECDSA signature in compact `R ‖ S` form.
///
/// The wire always carries the compact form; [`Signature::to_der`] and
/// [`Signature::from_der`] convert at the boundary to code that expects
/// DER.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 64]);

impl Signature {
    /// Wraps a compact signature.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// The compact form.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Serializes to DER: `SEQUENCE { INTEGER r, INTEGER s }` with
    /// minimal integer encodings.
    pub fn to_der(&self) -> Vec<u8> {
        fn push_int(out: &mut Vec<u8>, bytes: &[u8]) {
            let mut start = 0;
            while start < bytes.len() - 1 && bytes[start] == 0 {
                start += 1;
            }
            let trimmed = &bytes[start..];
            let pad = trimmed[0] & 0x80 != 0;

            out.push(0x02);
            out.push((trimmed.len() + usize::from(pad)) as u8);
            if pad {
                out.push(0x00);
            }
            out.extend_from_slice(trimmed);
        }

        let mut body = Vec::with_capacity(72);
        push_int(&mut body, &self.0[..32]);
        push_int(&mut body, &self.0[32..]);

        let mut der = Vec::with_capacity(body.len() + 2);
        der.push(0x30);
        der.push(body.len() as u8);
        der.extend_from_slice(&body);
        der
    }

    /// Parses a DER signature into compact form.
    pub fn from_der(der: &[u8]) -> Result<Self, WireError> {
        fn parse_int<'a>(bytes: &'a [u8], what: &str) -> Result<(&'a [u8], &'a [u8]), WireError> {
            if bytes.len() < 2 || bytes[0] != 0x02 {
                return Err(WireError::InvalidSignature(format!(
                    "{}: missing INTEGER tag",
                    what
                )));
            }
            let len = bytes[1] as usize;
            if bytes.len() < 2 + len || len == 0 {
                return Err(WireError::InvalidSignature(format!(
                    "{}: bad INTEGER length {}",
                    what, len
                )));
            }
            Ok((&bytes[2..2 + len], &bytes[2 + len..]))
        }

        fn left_pad(out: &mut [u8], bytes: &[u8], what: &str) -> Result<(), WireError> {
            let bytes = if bytes.len() > 1 && bytes[0] == 0 {
                &bytes[1..]
            } else {
                bytes
            };
            if bytes.len() > out.len() {
                return Err(WireError::InvalidSignature(format!(
                    "{}: {} bytes exceeds scalar width",
                    what,
                    bytes.len()
                )));
            }
            let start = out.len() - bytes.len();
            out[start..].copy_from_slice(bytes);
            Ok(())
        }

        if der.len() < 2 || der[0] != 0x30 || der[1] as usize != der.len() - 2 {
            return Err(WireError::InvalidSignature(
                "not a DER SEQUENCE".to_string(),
            ));
        }

        let (r, rest) = parse_int(&der[2..], "r")?;
        let (s, rest) = parse_int(rest, "s")?;
        if !rest.is_empty() {
            return Err(WireError::InvalidSignature(
                "trailing bytes after s".to_string(),
            ));
        }

        let mut compact = [0u8; 64];
        let (r_out, s_out) = compact.split_at_mut(32);
        left_pad(r_out, r, "r")?;
        left_pad(s_out, s, "s")?;
        Ok(Self(compact))
    }

    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        write_all(w, &self.0)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self(read_array::<64, _>(r, "signature")?))
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; 64])
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}

/// A 32-byte channel identifier.
///
/// Derived from the funding outpoint: the txid with its lowest two bytes
/// XORed with the big-endian output index, which keeps the id unique per
/// output of a funding transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChannelId(pub [u8; 32]);

impl ChannelId {
    /// Derives the channel id of a funding outpoint.
    ///
    /// # Errors
    ///
    /// The outpoint index must fit the wire's 16 bits.
    pub fn from_outpoint(outpoint: &OutPoint) -> Result<Self, WireError> {
        if outpoint.index > u16::MAX as u32 {
            return Err(WireError::IndexOverflow(outpoint.index));
        }
        let mut id = outpoint.txid;
        let index = outpoint.index as u16;
        id[30] ^= (index >> 8) as u8;
        id[31] ^= (index & 0xff) as u8;
        Ok(Self(id))
    }

    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        write_all(w, &self.0)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self(read_array::<32, _>(r, "channel id")?))
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A channel's on-chain locator: block height, transaction index within
/// the block, and output index within the transaction, packed into a u64
/// on the wire (3 + 3 + 2 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ShortChannelId {
    /// Block the funding transaction confirmed in (24 bits used).
    pub block_height: u32,
    /// Index of the transaction within that block (24 bits used).
    pub tx_index: u32,
    /// Funding output index within the transaction.
    pub output_index: u16,
}

impl ShortChannelId {
    /// Packs into the wire's u64 form.
    pub fn to_u64(self) -> u64 {
        ((self.block_height as u64 & 0xff_ffff) << 40)
            | ((self.tx_index as u64 & 0xff_ffff) << 16)
            | self.output_index as u64
    }

    /// Unpacks from the wire's u64 form.
    pub fn from_u64(value: u64) -> Self {
        Self {
            block_height: ((value >> 40) & 0xff_ffff) as u32,
            tx_index: ((value >> 16) & 0xff_ffff) as u32,
            output_index: (value & 0xffff) as u16,
        }
    }

    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        super::codec::write_u64(w, self.to_u64())
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self::from_u64(super::codec::read_u64(r, "short channel id")?))
    }
}

impl fmt::Display for ShortChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.block_height, self.tx_index, self.output_index
        )
    }
}

/// A node's 32-byte display alias, UTF-8, zero-padded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeAlias(pub [u8; 32]);

impl NodeAlias {
    /// Builds an alias from a string of at most 32 bytes.
    pub fn from_str_checked(s: &str) -> Result<Self, WireError> {
        if s.len() > 32 {
            return Err(WireError::InvalidAlias(s.len()));
        }
        let mut alias = [0u8; 32];
        alias[..s.len()].copy_from_slice(s.as_bytes());
        Ok(Self(alias))
    }

    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        write_all(w, &self.0)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self(read_array::<32, _>(r, "node alias")?))
    }
}

impl fmt::Display for NodeAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self
            .0
            .iter()
            .rposition(|&b| b != 0)
            .map(|i| i + 1)
            .unwrap_or(0);
        write!(f, "{}", String::from_utf8_lossy(&self.0[..end]))
    }
}

/// A funding transaction outpoint.
///
/// On the wire the output index is truncated to 16 bits: the 32-byte
/// txid is followed by a 2-byte big-endian index. Indices above 0xFFFF
/// are unrepresentable and refused at encode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OutPoint {
    /// The funding transaction id.
    pub txid: [u8; 32],
    /// The output index; only values up to 0xFFFF survive encoding.
    pub index: u32,
}

impl OutPoint {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        if self.index > u16::MAX as u32 {
            return Err(WireError::IndexOverflow(self.index));
        }
        write_all(w, &self.txid)?;
        write_u16(w, self.index as u16)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        let txid = read_array::<32, _>(r, "outpoint txid")?;
        let index = read_u16(r, "outpoint index")? as u32;
        Ok(Self { txid, index })
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(self.txid), self.index)
    }
}
