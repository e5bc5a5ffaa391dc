//! Connection-level messages: feature negotiation, diagnostics, and
//! keepalives.

use std::io::{Read, Write};

use super::codec::{read_bytes_u16, read_u16, write_bytes_u16, write_u16};
use super::features::RawFeatureVector;
use super::tlv::{decode_stream, ExtraOpaqueData};
use super::types::ChannelId;
use super::WireError;

/// The first message on a fresh connection: the features each side
/// supports or requires.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Init {
    /// Features carried over from the legacy global namespace.
    pub global_features: RawFeatureVector,
    /// The node's feature vector.
    pub features: RawFeatureVector,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl Init {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.global_features.encode(w)?;
        self.features.encode(w)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            global_features: RawFeatureVector::decode(r)?,
            features: RawFeatureVector::decode(r)?,
            extra_data: read_trailer(r)?,
        })
    }
}

/// Tells a peer that something is incorrect; a zeroed channel id refers
/// to all channels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorMessage {
    /// The channel the error concerns.
    pub channel_id: ChannelId,
    /// Error details, either printable or binary.
    pub data: Vec<u8>,
}

impl ErrorMessage {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        write_bytes_u16(w, &self.data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            channel_id: ChannelId::decode(r)?,
            data: read_bytes_u16(r, "error data")?,
        })
    }
}

/// A non-fatal counterpart of [`ErrorMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Warning {
    /// The channel the warning concerns, zeroed for connection-wide.
    pub channel_id: ChannelId,
    /// Warning details.
    pub data: Vec<u8>,
}

impl Warning {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        write_bytes_u16(w, &self.data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            channel_id: ChannelId::decode(r)?,
            data: read_bytes_u16(r, "warning data")?,
        })
    }
}

/// Keepalive probe. The padding obfuscates traffic patterns; the peer
/// answers with a [`Pong`] of the requested size.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ping {
    /// How many bytes of padding the pong should carry.
    pub num_pong_bytes: u16,
    /// Padding sent along with the ping.
    pub padding_bytes: Vec<u8>,
}

impl Ping {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        write_u16(w, self.num_pong_bytes)?;
        write_bytes_u16(w, &self.padding_bytes)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            num_pong_bytes: read_u16(r, "num pong bytes")?,
            padding_bytes: read_bytes_u16(r, "ping padding")?,
        })
    }
}

/// Keepalive response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pong {
    /// Padding of the length the ping asked for.
    pub pong_bytes: Vec<u8>,
}

impl Pong {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        write_bytes_u16(w, &self.pong_bytes)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            pong_bytes: read_bytes_u16(r, "pong padding")?,
        })
    }
}

/// Quiescence request: asks the peer to stop initiating channel updates
/// so a cooperative protocol can run on a settled channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stfu {
    /// The channel to quiesce.
    pub channel_id: ChannelId,
    /// Whether the sender claims the initiator role.
    pub initiator: bool,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl Stfu {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        super::codec::write_u8(w, u8::from(self.initiator))?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            channel_id: ChannelId::decode(r)?,
            initiator: super::codec::read_u8(r, "stfu initiator")? != 0,
            extra_data: read_trailer(r)?,
        })
    }
}

/// Writes an opaque trailer verbatim.
pub(crate) fn write_trailer<W: Write>(
    w: &mut W,
    extra_data: &ExtraOpaqueData,
) -> Result<(), WireError> {
    w.write_all(&extra_data.0).map_err(WireError::Io)
}

/// Reads the remainder of a body as an opaque trailer, validating that
/// it is a well-formed TLV stream.
pub(crate) fn read_trailer<R: Read>(r: &mut R) -> Result<ExtraOpaqueData, WireError> {
    let mut bytes = Vec::new();
    r.read_to_end(&mut bytes).map_err(WireError::Io)?;
    decode_stream(&bytes)?;
    Ok(ExtraOpaqueData(bytes))
}
