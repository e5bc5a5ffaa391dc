//! Gossip messages: channel and node announcements, channel updates, and
//! the gossip query protocol.

use std::io::{Read, Write};

use super::address::{decode_address_list, encode_address_list, NetAddress};
use super::codec::{
    read_array, read_u16, read_u32, read_u64, write_all, write_u16, write_u32, write_u64, write_u8,
};
use super::features::RawFeatureVector;
use super::setup::{read_trailer, write_trailer};
use super::tlv::ExtraOpaqueData;
use super::types::{ChannelId, NodeAlias, PublicKey, ShortChannelId, Signature};
use super::WireError;

/// The only short-channel-id encoding this implementation emits or
/// accepts: a bare concatenation of 8-byte ids.
pub const SCID_ENCODING_UNCOMPRESSED: u8 = 0;

/// Exchanges the signatures both peers need to assemble a
/// [`ChannelAnnouncement`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnnounceSignatures {
    /// The channel being announced.
    pub channel_id: ChannelId,
    /// The channel's confirmed on-chain locator.
    pub short_channel_id: ShortChannelId,
    /// Signature by the sender's node key.
    pub node_signature: Signature,
    /// Signature by the sender's funding key.
    pub bitcoin_signature: Signature,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl AnnounceSignatures {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        self.short_channel_id.encode(w)?;
        self.node_signature.encode(w)?;
        self.bitcoin_signature.encode(w)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            channel_id: ChannelId::decode(r)?,
            short_channel_id: ShortChannelId::decode(r)?,
            node_signature: Signature::decode(r)?,
            bitcoin_signature: Signature::decode(r)?,
            extra_data: read_trailer(r)?,
        })
    }
}

/// Proves a channel's existence to the network: four signatures binding
/// two node keys and two funding keys to one on-chain output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelAnnouncement {
    /// First node's signature over the announcement.
    pub node_sig_1: Signature,
    /// Second node's signature.
    pub node_sig_2: Signature,
    /// First node's funding-key signature.
    pub bitcoin_sig_1: Signature,
    /// Second node's funding-key signature.
    pub bitcoin_sig_2: Signature,
    /// Channel-level feature bits.
    pub features: RawFeatureVector,
    /// Genesis hash of the channel's chain.
    pub chain_hash: [u8; 32],
    /// The channel's on-chain locator.
    pub short_channel_id: ShortChannelId,
    /// Lexicographically lesser node key.
    pub node_id_1: PublicKey,
    /// Lexicographically greater node key.
    pub node_id_2: PublicKey,
    /// First node's funding key.
    pub bitcoin_key_1: PublicKey,
    /// Second node's funding key.
    pub bitcoin_key_2: PublicKey,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl ChannelAnnouncement {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.node_sig_1.encode(w)?;
        self.node_sig_2.encode(w)?;
        self.bitcoin_sig_1.encode(w)?;
        self.bitcoin_sig_2.encode(w)?;
        self.features.encode(w)?;
        write_all(w, &self.chain_hash)?;
        self.short_channel_id.encode(w)?;
        self.node_id_1.encode(w)?;
        self.node_id_2.encode(w)?;
        self.bitcoin_key_1.encode(w)?;
        self.bitcoin_key_2.encode(w)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            node_sig_1: Signature::decode(r)?,
            node_sig_2: Signature::decode(r)?,
            bitcoin_sig_1: Signature::decode(r)?,
            bitcoin_sig_2: Signature::decode(r)?,
            features: RawFeatureVector::decode(r)?,
            chain_hash: read_array::<32, _>(r, "chain hash")?,
            short_channel_id: ShortChannelId::decode(r)?,
            node_id_1: PublicKey::decode(r)?,
            node_id_2: PublicKey::decode(r)?,
            bitcoin_key_1: PublicKey::decode(r)?,
            bitcoin_key_2: PublicKey::decode(r)?,
            extra_data: read_trailer(r)?,
        })
    }
}

/// Advertises a node's presence, contact addresses, and features.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeAnnouncement {
    /// Signature over the announcement by the node key.
    pub signature: Signature,
    /// Node-level feature bits.
    pub features: RawFeatureVector,
    /// Unix timestamp; later timestamps supersede earlier ones.
    pub timestamp: u32,
    /// The announcing node.
    pub node_id: PublicKey,
    /// Display color.
    pub rgb_color: [u8; 3],
    /// Display alias.
    pub alias: NodeAlias,
    /// Reachable addresses, most preferred first.
    pub addresses: Vec<NetAddress>,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl NodeAnnouncement {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.signature.encode(w)?;
        self.features.encode(w)?;
        write_u32(w, self.timestamp)?;
        self.node_id.encode(w)?;
        write_all(w, &self.rgb_color)?;
        self.alias.encode(w)?;
        encode_address_list(w, &self.addresses)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            signature: Signature::decode(r)?,
            features: RawFeatureVector::decode(r)?,
            timestamp: read_u32(r, "timestamp")?,
            node_id: PublicKey::decode(r)?,
            rgb_color: read_array::<3, _>(r, "rgb color")?,
            alias: NodeAlias::decode(r)?,
            addresses: decode_address_list(r)?,
            extra_data: read_trailer(r)?,
        })
    }
}

/// Updates the forwarding policy of one direction of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelUpdate {
    /// Signature over the update by the advertising node.
    pub signature: Signature,
    /// Genesis hash of the channel's chain.
    pub chain_hash: [u8; 32],
    /// The channel being updated.
    pub short_channel_id: ShortChannelId,
    /// Unix timestamp; later timestamps supersede earlier ones.
    pub timestamp: u32,
    /// Bit 0 signals the htlc-maximum field is present.
    pub message_flags: u8,
    /// Bit 0 names the direction, bit 1 disables the edge.
    pub channel_flags: u8,
    /// Blocks to add to an HTLC's expiry when forwarding.
    pub time_lock_delta: u16,
    /// Smallest HTLC forwarded, in millisatoshis.
    pub htlc_minimum_msat: u64,
    /// Flat forwarding fee, in millisatoshis.
    pub base_fee: u32,
    /// Proportional forwarding fee, in millionths.
    pub fee_rate: u32,
    /// Largest HTLC forwarded; on the wire only when `message_flags`
    /// bit 0 is set.
    pub htlc_maximum_msat: u64,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl ChannelUpdate {
    fn has_max_htlc(&self) -> bool {
        self.message_flags & 1 != 0
    }

    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.signature.encode(w)?;
        write_all(w, &self.chain_hash)?;
        self.short_channel_id.encode(w)?;
        write_u32(w, self.timestamp)?;
        write_u8(w, self.message_flags)?;
        write_u8(w, self.channel_flags)?;
        write_u16(w, self.time_lock_delta)?;
        write_u64(w, self.htlc_minimum_msat)?;
        write_u32(w, self.base_fee)?;
        write_u32(w, self.fee_rate)?;
        if self.has_max_htlc() {
            write_u64(w, self.htlc_maximum_msat)?;
        }
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        let signature = Signature::decode(r)?;
        let chain_hash = read_array::<32, _>(r, "chain hash")?;
        let short_channel_id = ShortChannelId::decode(r)?;
        let timestamp = read_u32(r, "timestamp")?;
        let message_flags = super::codec::read_u8(r, "message flags")?;
        let channel_flags = super::codec::read_u8(r, "channel flags")?;
        let time_lock_delta = read_u16(r, "time lock delta")?;
        let htlc_minimum_msat = read_u64(r, "htlc minimum")?;
        let base_fee = read_u32(r, "base fee")?;
        let fee_rate = read_u32(r, "fee rate")?;
        let htlc_maximum_msat = if message_flags & 1 != 0 {
            read_u64(r, "htlc maximum")?
        } else {
            0
        };

        Ok(Self {
            signature,
            chain_hash,
            short_channel_id,
            timestamp,
            message_flags,
            channel_flags,
            time_lock_delta,
            htlc_minimum_msat,
            base_fee,
            fee_rate,
            htlc_maximum_msat,
            extra_data: read_trailer(r)?,
        })
    }
}

/// Short-channel-id query block shared by [`QueryShortChanIds`] and
/// [`ReplyChannelRange`]: a 2-byte length, an encoding byte, then the
/// ids.
fn encode_scid_block<W: Write>(w: &mut W, ids: &[ShortChannelId]) -> Result<(), WireError> {
    let len = 1 + ids.len() * 8;
    if len > u16::MAX as usize {
        return Err(WireError::BodyTooLarge(len));
    }
    write_u16(w, len as u16)?;
    write_u8(w, SCID_ENCODING_UNCOMPRESSED)?;
    for id in ids {
        id.encode(w)?;
    }
    Ok(())
}

fn decode_scid_block<R: Read>(r: &mut R) -> Result<Vec<ShortChannelId>, WireError> {
    let len = read_u16(r, "scid block length")? as usize;
    if len == 0 {
        return Ok(Vec::new());
    }

    let mut block = vec![0u8; len];
    r.read_exact(&mut block).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            WireError::TruncatedField(format!("scid block: {} bytes declared", len))
        } else {
            WireError::Io(e)
        }
    })?;

    let encoding = block[0];
    if encoding != SCID_ENCODING_UNCOMPRESSED {
        return Err(WireError::UnknownScidEncoding(encoding));
    }
    if (block.len() - 1) % 8 != 0 {
        return Err(WireError::TruncatedField(format!(
            "scid block of {} data bytes is not a multiple of 8",
            block.len() - 1
        )));
    }

    let ids = block[1..]
        .chunks_exact(8)
        .map(|chunk| {
            let bytes: [u8; 8] = chunk.try_into().expect("chunks_exact yields 8 bytes");
            ShortChannelId::from_u64(u64::from_be_bytes(bytes))
        })
        .collect();
    Ok(ids)
}

/// Asks a peer for the announcements behind specific channels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryShortChanIds {
    /// Chain the queried channels live on.
    pub chain_hash: [u8; 32],
    /// The channels being queried.
    pub short_chan_ids: Vec<ShortChannelId>,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl QueryShortChanIds {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        write_all(w, &self.chain_hash)?;
        encode_scid_block(w, &self.short_chan_ids)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            chain_hash: read_array::<32, _>(r, "chain hash")?,
            short_chan_ids: decode_scid_block(r)?,
            extra_data: read_trailer(r)?,
        })
    }
}

/// Signals the end of the announcements for a [`QueryShortChanIds`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplyShortChanIdsEnd {
    /// Chain the query concerned.
    pub chain_hash: [u8; 32],
    /// Nonzero when the sender maintains up-to-date information for the
    /// chain.
    pub complete: u8,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl ReplyShortChanIdsEnd {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        write_all(w, &self.chain_hash)?;
        write_u8(w, self.complete)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            chain_hash: read_array::<32, _>(r, "chain hash")?,
            complete: super::codec::read_u8(r, "complete flag")?,
            extra_data: read_trailer(r)?,
        })
    }
}

/// Asks a peer for all channels funded within a block range.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryChannelRange {
    /// Chain being queried.
    pub chain_hash: [u8; 32],
    /// First block of the range.
    pub first_block_height: u32,
    /// Number of blocks covered.
    pub num_blocks: u32,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl QueryChannelRange {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        write_all(w, &self.chain_hash)?;
        write_u32(w, self.first_block_height)?;
        write_u32(w, self.num_blocks)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            chain_hash: read_array::<32, _>(r, "chain hash")?,
            first_block_height: read_u32(r, "first block")?,
            num_blocks: read_u32(r, "num blocks")?,
            extra_data: read_trailer(r)?,
        })
    }
}

/// One page of the channels matching a [`QueryChannelRange`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplyChannelRange {
    /// Chain the reply concerns.
    pub chain_hash: [u8; 32],
    /// First block the reply covers.
    pub first_block_height: u32,
    /// Number of blocks the reply covers.
    pub num_blocks: u32,
    /// Nonzero on the final page.
    pub complete: u8,
    /// Channels funded in the covered range.
    pub short_chan_ids: Vec<ShortChannelId>,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl ReplyChannelRange {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        write_all(w, &self.chain_hash)?;
        write_u32(w, self.first_block_height)?;
        write_u32(w, self.num_blocks)?;
        write_u8(w, self.complete)?;
        encode_scid_block(w, &self.short_chan_ids)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            chain_hash: read_array::<32, _>(r, "chain hash")?,
            first_block_height: read_u32(r, "first block")?,
            num_blocks: read_u32(r, "num blocks")?,
            complete: super::codec::read_u8(r, "complete flag")?,
            short_chan_ids: decode_scid_block(r)?,
            extra_data: read_trailer(r)?,
        })
    }
}

/// Restricts future gossip from a peer to a timestamp window.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GossipTimestampRange {
    /// Chain the filter applies to.
    pub chain_hash: [u8; 32],
    /// Earliest timestamp of interest.
    pub first_timestamp: u32,
    /// Width of the window, in seconds.
    pub timestamp_range: u32,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl GossipTimestampRange {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        write_all(w, &self.chain_hash)?;
        write_u32(w, self.first_timestamp)?;
        write_u32(w, self.timestamp_range)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            chain_hash: read_array::<32, _>(r, "chain hash")?,
            first_timestamp: read_u32(r, "first timestamp")?,
            timestamp_range: read_u32(r, "timestamp range")?,
            extra_data: read_trailer(r)?,
        })
    }
}
