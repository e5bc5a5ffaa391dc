//! The peer-wire message codec.
//!
//! Every message on the peer wire is a 2-byte big-endian type tag
//! followed by a typed body of at most [`MAX_MSG_BODY`] bytes. Bodies are
//! fixed tuples of primitives (big-endian integers, 33-byte compressed
//! keys, 32-byte hashes, 64-byte compact signatures, length-prefixed byte
//! strings) closed by an extensible TLV trailer; see [`tlv`] for the
//! trailer rules.
//!
//! # Type space
//!
//! Tags below [`CUSTOM_TYPE_START`] are protocol-assigned; decoding an
//! unregistered tag in that range is [`WireError::UnknownMessageType`].
//! Tags at or above it belong to applications and round-trip as opaque
//! [`CustomMessage`] bodies.
//!
//! # Round-trip guarantees
//!
//! For every registered message `m`, `read_message(write_message(m))`
//! reconstructs `m`, including unknown TLV records and unknown address
//! types byte-for-byte. The codec is stateless; the only failure surface
//! is malformed input or an over-length body, and either tears down the
//! peer connection at the framing layer above.

mod codec;

pub mod address;
pub mod channel;
pub mod custom;
pub mod features;
pub mod gossip;
pub mod htlc;
pub mod setup;
pub mod tlv;
pub mod types;

use std::fmt;
use std::io::{Read, Write};

use thiserror::Error;

pub use address::{NetAddress, OnionAddr, OpaqueAddrs};
pub use channel::{
    AcceptChannel, ChannelReady, ChannelTlvs, ClosingSigned, FundingCreated, FundingSigned,
    OpenChannel, Shutdown,
};
pub use custom::CustomMessage;
pub use features::RawFeatureVector;
pub use gossip::{
    AnnounceSignatures, ChannelAnnouncement, ChannelUpdate, GossipTimestampRange,
    NodeAnnouncement, QueryChannelRange, QueryShortChanIds, ReplyChannelRange,
    ReplyShortChanIdsEnd,
};
pub use htlc::{
    ChannelReestablish, CommitSig, RevokeAndAck, UpdateAddHtlc, UpdateFailHtlc,
    UpdateFailMalformedHtlc, UpdateFee, UpdateFulfillHtlc,
};
pub use setup::{ErrorMessage, Init, Ping, Pong, Stfu, Warning};
pub use tlv::{CustomRecords, ExtraOpaqueData};
pub use types::{
    ChannelId, NodeAlias, NodeId, OutPoint, PublicKey, ShortChannelId, Signature,
};

/// Largest legal message body, excluding the 2-byte type tag.
pub const MAX_MSG_BODY: usize = 65533;

/// First type tag of the application-defined range.
pub const CUSTOM_TYPE_START: u16 = 32768;

/// Smallest TLV type usable for application records inside messages that
/// carry [`CustomRecords`].
pub const MIN_CUSTOM_RECORDS_TLV_TYPE: u64 = 65536;

/// Errors surfaced by the codec. All of them are terminal for the frame:
/// the layer above is expected to drop the peer rather than resynchronize.
#[derive(Debug, Error)]
pub enum WireError {
    /// Underlying reader or writer failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A protocol-range type tag with no registered decoder.
    #[error("unknown message type: {0}")]
    UnknownMessageType(MessageType),

    /// A body over [`MAX_MSG_BODY`] bytes.
    #[error("message body of {0} bytes exceeds maximum of 65533")]
    BodyTooLarge(usize),

    /// A TLV stream that is truncated, non-canonical, non-monotone, or
    /// carries a record where it must not.
    #[error("malformed tlv stream: {0}")]
    MalformedTlv(String),

    /// An outpoint index that does not fit the wire's 16 bits.
    #[error("outpoint index {0} exceeds 16 bits")]
    IndexOverflow(u32),

    /// Input ended in the middle of a fixed-width field.
    #[error("short read: {0}")]
    ShortRead(String),

    /// A length prefix that promises more bytes than the frame holds.
    #[error("truncated field: {0}")]
    TruncatedField(String),

    /// A 33-byte key without a valid compression prefix.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// A DER signature that does not parse.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// An address that cannot be serialized (bad onion id, say).
    #[error("invalid network address: {0}")]
    InvalidAddress(String),

    /// A node alias longer than its 32-byte field.
    #[error("node alias of {0} bytes exceeds 32")]
    InvalidAlias(usize),

    /// A short-channel-id block in an encoding we do not speak.
    #[error("unknown short channel id encoding: 0x{0:02x}")]
    UnknownScidEncoding(u8),
}

/// A message's 16-bit type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageType(pub u16);

impl MessageType {
    pub const WARNING: MessageType = MessageType(1);
    pub const STFU: MessageType = MessageType(2);
    pub const INIT: MessageType = MessageType(16);
    pub const ERROR: MessageType = MessageType(17);
    pub const PING: MessageType = MessageType(18);
    pub const PONG: MessageType = MessageType(19);
    pub const OPEN_CHANNEL: MessageType = MessageType(32);
    pub const ACCEPT_CHANNEL: MessageType = MessageType(33);
    pub const FUNDING_CREATED: MessageType = MessageType(34);
    pub const FUNDING_SIGNED: MessageType = MessageType(35);
    pub const CHANNEL_READY: MessageType = MessageType(36);
    pub const SHUTDOWN: MessageType = MessageType(38);
    pub const CLOSING_SIGNED: MessageType = MessageType(39);
    pub const UPDATE_ADD_HTLC: MessageType = MessageType(128);
    pub const UPDATE_FULFILL_HTLC: MessageType = MessageType(130);
    pub const UPDATE_FAIL_HTLC: MessageType = MessageType(131);
    pub const COMMIT_SIG: MessageType = MessageType(132);
    pub const REVOKE_AND_ACK: MessageType = MessageType(133);
    pub const UPDATE_FEE: MessageType = MessageType(134);
    pub const UPDATE_FAIL_MALFORMED_HTLC: MessageType = MessageType(135);
    pub const CHANNEL_REESTABLISH: MessageType = MessageType(136);
    pub const CHANNEL_ANNOUNCEMENT: MessageType = MessageType(256);
    pub const NODE_ANNOUNCEMENT: MessageType = MessageType(257);
    pub const CHANNEL_UPDATE: MessageType = MessageType(258);
    pub const ANNOUNCE_SIGNATURES: MessageType = MessageType(259);
    pub const QUERY_SHORT_CHAN_IDS: MessageType = MessageType(261);
    pub const REPLY_SHORT_CHAN_IDS_END: MessageType = MessageType(262);
    pub const QUERY_CHANNEL_RANGE: MessageType = MessageType(263);
    pub const REPLY_CHANNEL_RANGE: MessageType = MessageType(264);
    pub const GOSSIP_TIMESTAMP_RANGE: MessageType = MessageType(265);

    /// Whether this tag sits in the application-defined range.
    pub fn is_custom(&self) -> bool {
        self.0 >= CUSTOM_TYPE_START
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            MessageType::WARNING => "Warning",
            MessageType::STFU => "Stfu",
            MessageType::INIT => "Init",
            MessageType::ERROR => "Error",
            MessageType::PING => "Ping",
            MessageType::PONG => "Pong",
            MessageType::OPEN_CHANNEL => "OpenChannel",
            MessageType::ACCEPT_CHANNEL => "AcceptChannel",
            MessageType::FUNDING_CREATED => "FundingCreated",
            MessageType::FUNDING_SIGNED => "FundingSigned",
            MessageType::CHANNEL_READY => "ChannelReady",
            MessageType::SHUTDOWN => "Shutdown",
            MessageType::CLOSING_SIGNED => "ClosingSigned",
            MessageType::UPDATE_ADD_HTLC => "UpdateAddHtlc",
            MessageType::UPDATE_FULFILL_HTLC => "UpdateFulfillHtlc",
            MessageType::UPDATE_FAIL_HTLC => "UpdateFailHtlc",
            MessageType::COMMIT_SIG => "CommitSig",
            MessageType::REVOKE_AND_ACK => "RevokeAndAck",
            MessageType::UPDATE_FEE => "UpdateFee",
            MessageType::UPDATE_FAIL_MALFORMED_HTLC => "UpdateFailMalformedHtlc",
            MessageType::CHANNEL_REESTABLISH => "ChannelReestablish",
            MessageType::CHANNEL_ANNOUNCEMENT => "ChannelAnnouncement",
            MessageType::NODE_ANNOUNCEMENT => "NodeAnnouncement",
            MessageType::CHANNEL_UPDATE => "ChannelUpdate",
            MessageType::ANNOUNCE_SIGNATURES => "AnnounceSignatures",
            MessageType::QUERY_SHORT_CHAN_IDS => "QueryShortChanIds",
            MessageType::REPLY_SHORT_CHAN_IDS_END => "ReplyShortChanIdsEnd",
            MessageType::QUERY_CHANNEL_RANGE => "QueryChannelRange",
            MessageType::REPLY_CHANNEL_RANGE => "ReplyChannelRange",
            MessageType::GOSSIP_TIMESTAMP_RANGE => "GossipTimestampRange",
            other if other.is_custom() => return write!(f, "Custom({})", other.0),
            other => return write!(f, "Unknown({})", other.0),
        };
        write!(f, "{}", name)
    }
}

/// A typed peer-wire message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Warning(Warning),
    Stfu(Stfu),
    Init(Init),
    Error(ErrorMessage),
    Ping(Ping),
    Pong(Pong),
    OpenChannel(OpenChannel),
    AcceptChannel(AcceptChannel),
    FundingCreated(FundingCreated),
    FundingSigned(FundingSigned),
    ChannelReady(ChannelReady),
    Shutdown(Shutdown),
    ClosingSigned(ClosingSigned),
    UpdateAddHtlc(UpdateAddHtlc),
    UpdateFulfillHtlc(UpdateFulfillHtlc),
    UpdateFailHtlc(UpdateFailHtlc),
    CommitSig(CommitSig),
    RevokeAndAck(RevokeAndAck),
    UpdateFee(UpdateFee),
    UpdateFailMalformedHtlc(UpdateFailMalformedHtlc),
    ChannelReestablish(ChannelReestablish),
    ChannelAnnouncement(ChannelAnnouncement),
    NodeAnnouncement(NodeAnnouncement),
    ChannelUpdate(ChannelUpdate),
    AnnounceSignatures(AnnounceSignatures),
    QueryShortChanIds(QueryShortChanIds),
    ReplyShortChanIdsEnd(ReplyShortChanIdsEnd),
    QueryChannelRange(QueryChannelRange),
    ReplyChannelRange(ReplyChannelRange),
    GossipTimestampRange(GossipTimestampRange),
    Custom(CustomMessage),
}

impl Message {
    /// The message's type tag.
    pub fn msg_type(&self) -> MessageType {
        match self {
            Message::Warning(_) => MessageType::WARNING,
            Message::Stfu(_) => MessageType::STFU,
            Message::Init(_) => MessageType::INIT,
            Message::Error(_) => MessageType::ERROR,
            Message::Ping(_) => MessageType::PING,
            Message::Pong(_) => MessageType::PONG,
            Message::OpenChannel(_) => MessageType::OPEN_CHANNEL,
            Message::AcceptChannel(_) => MessageType::ACCEPT_CHANNEL,
            Message::FundingCreated(_) => MessageType::FUNDING_CREATED,
            Message::FundingSigned(_) => MessageType::FUNDING_SIGNED,
            Message::ChannelReady(_) => MessageType::CHANNEL_READY,
            Message::Shutdown(_) => MessageType::SHUTDOWN,
            Message::ClosingSigned(_) => MessageType::CLOSING_SIGNED,
            Message::UpdateAddHtlc(_) => MessageType::UPDATE_ADD_HTLC,
            Message::UpdateFulfillHtlc(_) => MessageType::UPDATE_FULFILL_HTLC,
            Message::UpdateFailHtlc(_) => MessageType::UPDATE_FAIL_HTLC,
            Message::CommitSig(_) => MessageType::COMMIT_SIG,
            Message::RevokeAndAck(_) => MessageType::REVOKE_AND_ACK,
            Message::UpdateFee(_) => MessageType::UPDATE_FEE,
            Message::UpdateFailMalformedHtlc(_) => MessageType::UPDATE_FAIL_MALFORMED_HTLC,
            Message::ChannelReestablish(_) => MessageType::CHANNEL_REESTABLISH,
            Message::ChannelAnnouncement(_) => MessageType::CHANNEL_ANNOUNCEMENT,
            Message::NodeAnnouncement(_) => MessageType::NODE_ANNOUNCEMENT,
            Message::ChannelUpdate(_) => MessageType::CHANNEL_UPDATE,
            Message::AnnounceSignatures(_) => MessageType::ANNOUNCE_SIGNATURES,
            Message::QueryShortChanIds(_) => MessageType::QUERY_SHORT_CHAN_IDS,
            Message::ReplyShortChanIdsEnd(_) => MessageType::REPLY_SHORT_CHAN_IDS_END,
            Message::QueryChannelRange(_) => MessageType::QUERY_CHANNEL_RANGE,
            Message::ReplyChannelRange(_) => MessageType::REPLY_CHANNEL_RANGE,
            Message::GossipTimestampRange(_) => MessageType::GOSSIP_TIMESTAMP_RANGE,
            Message::Custom(msg) => msg.msg_type,
        }
    }

    /// The registry: constructs an empty message for a type tag.
    ///
    /// Custom-range tags yield an empty [`CustomMessage`]; protocol-range
    /// tags without a registered message fail with
    /// [`WireError::UnknownMessageType`].
    pub fn empty(msg_type: MessageType) -> Result<Message, WireError> {
        let msg = match msg_type {
            MessageType::WARNING => Message::Warning(Warning::default()),
            MessageType::STFU => Message::Stfu(Stfu::default()),
            MessageType::INIT => Message::Init(Init::default()),
            MessageType::ERROR => Message::Error(ErrorMessage::default()),
            MessageType::PING => Message::Ping(Ping::default()),
            MessageType::PONG => Message::Pong(Pong::default()),
            MessageType::OPEN_CHANNEL => Message::OpenChannel(OpenChannel::default()),
            MessageType::ACCEPT_CHANNEL => Message::AcceptChannel(AcceptChannel::default()),
            MessageType::FUNDING_CREATED => Message::FundingCreated(FundingCreated::default()),
            MessageType::FUNDING_SIGNED => Message::FundingSigned(FundingSigned::default()),
            MessageType::CHANNEL_READY => Message::ChannelReady(ChannelReady::default()),
            MessageType::SHUTDOWN => Message::Shutdown(Shutdown::default()),
            MessageType::CLOSING_SIGNED => Message::ClosingSigned(ClosingSigned::default()),
            MessageType::UPDATE_ADD_HTLC => Message::UpdateAddHtlc(UpdateAddHtlc::default()),
            MessageType::UPDATE_FULFILL_HTLC => {
                Message::UpdateFulfillHtlc(UpdateFulfillHtlc::default())
            }
            MessageType::UPDATE_FAIL_HTLC => Message::UpdateFailHtlc(UpdateFailHtlc::default()),
            MessageType::COMMIT_SIG => Message::CommitSig(CommitSig::default()),
            MessageType::REVOKE_AND_ACK => Message::RevokeAndAck(RevokeAndAck::default()),
            MessageType::UPDATE_FEE => Message::UpdateFee(UpdateFee::default()),
            MessageType::UPDATE_FAIL_MALFORMED_HTLC => {
                Message::UpdateFailMalformedHtlc(UpdateFailMalformedHtlc::default())
            }
            MessageType::CHANNEL_REESTABLISH => {
                Message::ChannelReestablish(ChannelReestablish::default())
            }
            MessageType::CHANNEL_ANNOUNCEMENT => {
                Message::ChannelAnnouncement(ChannelAnnouncement::default())
            }
            MessageType::NODE_ANNOUNCEMENT => {
                Message::NodeAnnouncement(NodeAnnouncement::default())
            }
            MessageType::CHANNEL_UPDATE => Message::ChannelUpdate(ChannelUpdate::default()),
            MessageType::ANNOUNCE_SIGNATURES => {
                Message::AnnounceSignatures(AnnounceSignatures::default())
            }
            MessageType::QUERY_SHORT_CHAN_IDS => {
                Message::QueryShortChanIds(QueryShortChanIds::default())
            }
            MessageType::REPLY_SHORT_CHAN_IDS_END => {
                Message::ReplyShortChanIdsEnd(ReplyShortChanIdsEnd::default())
            }
            MessageType::QUERY_CHANNEL_RANGE => {
                Message::QueryChannelRange(QueryChannelRange::default())
            }
            MessageType::REPLY_CHANNEL_RANGE => {
                Message::ReplyChannelRange(ReplyChannelRange::default())
            }
            MessageType::GOSSIP_TIMESTAMP_RANGE => {
                Message::GossipTimestampRange(GossipTimestampRange::default())
            }
            other if other.is_custom() => Message::Custom(CustomMessage {
                msg_type: other,
                data: Vec::new(),
            }),
            other => return Err(WireError::UnknownMessageType(other)),
        };
        Ok(msg)
    }

    /// Encodes the body, without the leading type tag.
    pub fn encode_body<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        match self {
            Message::Warning(msg) => msg.encode(w),
            Message::Stfu(msg) => msg.encode(w),
            Message::Init(msg) => msg.encode(w),
            Message::Error(msg) => msg.encode(w),
            Message::Ping(msg) => msg.encode(w),
            Message::Pong(msg) => msg.encode(w),
            Message::OpenChannel(msg) => msg.encode(w),
            Message::AcceptChannel(msg) => msg.encode(w),
            Message::FundingCreated(msg) => msg.encode(w),
            Message::FundingSigned(msg) => msg.encode(w),
            Message::ChannelReady(msg) => msg.encode(w),
            Message::Shutdown(msg) => msg.encode(w),
            Message::ClosingSigned(msg) => msg.encode(w),
            Message::UpdateAddHtlc(msg) => msg.encode(w),
            Message::UpdateFulfillHtlc(msg) => msg.encode(w),
            Message::UpdateFailHtlc(msg) => msg.encode(w),
            Message::CommitSig(msg) => msg.encode(w),
            Message::RevokeAndAck(msg) => msg.encode(w),
            Message::UpdateFee(msg) => msg.encode(w),
            Message::UpdateFailMalformedHtlc(msg) => msg.encode(w),
            Message::ChannelReestablish(msg) => msg.encode(w),
            Message::ChannelAnnouncement(msg) => msg.encode(w),
            Message::NodeAnnouncement(msg) => msg.encode(w),
            Message::ChannelUpdate(msg) => msg.encode(w),
            Message::AnnounceSignatures(msg) => msg.encode(w),
            Message::QueryShortChanIds(msg) => msg.encode(w),
            Message::ReplyShortChanIdsEnd(msg) => msg.encode(w),
            Message::QueryChannelRange(msg) => msg.encode(w),
            Message::ReplyChannelRange(msg) => msg.encode(w),
            Message::GossipTimestampRange(msg) => msg.encode(w),
            Message::Custom(msg) => msg.encode(w),
        }
    }

    /// Decodes a body of the given type. The reader must be bounded to
    /// the frame: trailer decoding consumes everything left.
    pub fn decode_body<R: Read>(msg_type: MessageType, r: &mut R) -> Result<Message, WireError> {
        let msg = match msg_type {
            MessageType::WARNING => Message::Warning(Warning::decode(r)?),
            MessageType::STFU => Message::Stfu(Stfu::decode(r)?),
            MessageType::INIT => Message::Init(Init::decode(r)?),
            MessageType::ERROR => Message::Error(ErrorMessage::decode(r)?),
            MessageType::PING => Message::Ping(Ping::decode(r)?),
            MessageType::PONG => Message::Pong(Pong::decode(r)?),
            MessageType::OPEN_CHANNEL => Message::OpenChannel(OpenChannel::decode(r)?),
            MessageType::ACCEPT_CHANNEL => Message::AcceptChannel(AcceptChannel::decode(r)?),
            MessageType::FUNDING_CREATED => Message::FundingCreated(FundingCreated::decode(r)?),
            MessageType::FUNDING_SIGNED => Message::FundingSigned(FundingSigned::decode(r)?),
            MessageType::CHANNEL_READY => Message::ChannelReady(ChannelReady::decode(r)?),
            MessageType::SHUTDOWN => Message::Shutdown(Shutdown::decode(r)?),
            MessageType::CLOSING_SIGNED => Message::ClosingSigned(ClosingSigned::decode(r)?),
            MessageType::UPDATE_ADD_HTLC => Message::UpdateAddHtlc(UpdateAddHtlc::decode(r)?),
            MessageType::UPDATE_FULFILL_HTLC => {
                Message::UpdateFulfillHtlc(UpdateFulfillHtlc::decode(r)?)
            }
            MessageType::UPDATE_FAIL_HTLC => Message::UpdateFailHtlc(UpdateFailHtlc::decode(r)?),
            MessageType::COMMIT_SIG => Message::CommitSig(CommitSig::decode(r)?),
            MessageType::REVOKE_AND_ACK => Message::RevokeAndAck(RevokeAndAck::decode(r)?),
            MessageType::UPDATE_FEE => Message::UpdateFee(UpdateFee::decode(r)?),
            MessageType::UPDATE_FAIL_MALFORMED_HTLC => {
                Message::UpdateFailMalformedHtlc(UpdateFailMalformedHtlc::decode(r)?)
            }
            MessageType::CHANNEL_REESTABLISH => {
                Message::ChannelReestablish(ChannelReestablish::decode(r)?)
            }
            MessageType::CHANNEL_ANNOUNCEMENT => {
                Message::ChannelAnnouncement(ChannelAnnouncement::decode(r)?)
            }
            MessageType::NODE_ANNOUNCEMENT => {
                Message::NodeAnnouncement(NodeAnnouncement::decode(r)?)
            }
            MessageType::CHANNEL_UPDATE => Message::ChannelUpdate(ChannelUpdate::decode(r)?),
            MessageType::ANNOUNCE_SIGNATURES => {
                Message::AnnounceSignatures(AnnounceSignatures::decode(r)?)
            }
            MessageType::QUERY_SHORT_CHAN_IDS => {
                Message::QueryShortChanIds(QueryShortChanIds::decode(r)?)
            }
            MessageType::REPLY_SHORT_CHAN_IDS_END => {
                Message::ReplyShortChanIdsEnd(ReplyShortChanIdsEnd::decode(r)?)
            }
            MessageType::QUERY_CHANNEL_RANGE => {
                Message::QueryChannelRange(QueryChannelRange::decode(r)?)
            }
            MessageType::REPLY_CHANNEL_RANGE => {
                Message::ReplyChannelRange(ReplyChannelRange::decode(r)?)
            }
            MessageType::GOSSIP_TIMESTAMP_RANGE => {
                Message::GossipTimestampRange(GossipTimestampRange::decode(r)?)
            }
            other if other.is_custom() => Message::Custom(CustomMessage::decode(other, r)?),
            other => return Err(WireError::UnknownMessageType(other)),
        };
        Ok(msg)
    }
}

/// Writes a framed message: 2-byte type tag, then the body.
///
/// `pver` names the peer protocol version; it is threaded through for
/// future message revisions, and every current message encodes
/// identically at all versions.
///
/// Returns the total bytes written. Fails with
/// [`WireError::BodyTooLarge`] before writing anything when the body
/// exceeds [`MAX_MSG_BODY`]; a frame is never truncated.
pub fn write_message<W: Write>(w: &mut W, msg: &Message, _pver: u32) -> Result<usize, WireError> {
    let mut body = Vec::new();
    msg.encode_body(&mut body)?;

    if body.len() > MAX_MSG_BODY {
        return Err(WireError::BodyTooLarge(body.len()));
    }

    codec::write_u16(w, msg.msg_type().0)?;
    codec::write_all(w, &body)?;
    Ok(2 + body.len())
}

/// Reads one framed message. The reader must span exactly one frame;
/// everything after the type tag is the body. `pver` mirrors
/// [`write_message`].
pub fn read_message<R: Read>(r: &mut R, _pver: u32) -> Result<Message, WireError> {
    let msg_type = MessageType(codec::read_u16(r, "message type")?);

    let mut body = Vec::new();
    r.read_to_end(&mut body).map_err(WireError::Io)?;
    if body.len() > MAX_MSG_BODY {
        return Err(WireError::BodyTooLarge(body.len()));
    }

    Message::decode_body(msg_type, &mut body.as_slice())
}
