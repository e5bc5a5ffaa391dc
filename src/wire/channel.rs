//! Channel establishment and teardown messages.

use std::io::{Read, Write};

use super::codec::{
    read_array, read_bytes_u16, read_u16, read_u32, read_u64, write_all, write_bytes_u16,
    write_u16, write_u32, write_u64, write_u8,
};
use super::features::RawFeatureVector;
use super::setup::write_trailer;
use super::tlv::{decode_stream, CustomRecords, ExtraOpaqueData, Record};
use super::types::{ChannelId, OutPoint, PublicKey, ShortChannelId, Signature};
use super::WireError;

const TLV_UPFRONT_SHUTDOWN: u64 = 0;
const TLV_CHANNEL_TYPE: u64 = 1;
const TLV_LEASE_EXPIRY: u64 = 2;

const TLV_ALIAS_SCID: u64 = 1;

/// The optional records shared by [`OpenChannel`] and [`AcceptChannel`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelTlvs {
    /// Script the funder commits to closing out to; empty when the
    /// sender makes no such commitment.
    pub upfront_shutdown_script: Vec<u8>,
    /// Explicitly negotiated channel type.
    pub channel_type: Option<RawFeatureVector>,
    /// Expiry height of a leased channel.
    pub lease_expiry: Option<u32>,
}

impl ChannelTlvs {
    fn known_records(&self) -> Vec<Record> {
        let mut records = Vec::new();
        if !self.upfront_shutdown_script.is_empty() {
            records.push(Record {
                record_type: TLV_UPFRONT_SHUTDOWN,
                value: self.upfront_shutdown_script.clone(),
            });
        }
        if let Some(channel_type) = &self.channel_type {
            records.push(Record {
                record_type: TLV_CHANNEL_TYPE,
                value: channel_type.to_bytes(),
            });
        }
        if let Some(expiry) = self.lease_expiry {
            records.push(Record {
                record_type: TLV_LEASE_EXPIRY,
                value: expiry.to_be_bytes().to_vec(),
            });
        }
        records
    }

    fn encode_with_trailer<W: Write>(
        &self,
        w: &mut W,
        extra_data: &ExtraOpaqueData,
    ) -> Result<(), WireError> {
        super::tlv::merge_and_encode(w, self.known_records(), &CustomRecords::new(), extra_data)
    }

    fn decode_with_trailer<R: Read>(r: &mut R) -> Result<(Self, ExtraOpaqueData), WireError> {
        let mut trailer = Vec::new();
        r.read_to_end(&mut trailer).map_err(WireError::Io)?;

        let mut tlvs = Self::default();
        let mut extra = Vec::new();
        for record in decode_stream(&trailer)? {
            match record.record_type {
                TLV_UPFRONT_SHUTDOWN => tlvs.upfront_shutdown_script = record.value,
                TLV_CHANNEL_TYPE => {
                    tlvs.channel_type = Some(RawFeatureVector::from_bytes(&record.value));
                }
                TLV_LEASE_EXPIRY => {
                    let bytes: [u8; 4] = record.value.as_slice().try_into().map_err(|_| {
                        WireError::MalformedTlv(format!(
                            "lease expiry of {} bytes",
                            record.value.len()
                        ))
                    })?;
                    tlvs.lease_expiry = Some(u32::from_be_bytes(bytes));
                }
                _ => extra.push(record),
            }
        }

        Ok((tlvs, ExtraOpaqueData::from_records(&extra)?))
    }
}

/// Proposes a new channel to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpenChannel {
    /// Genesis hash of the chain the channel lives on.
    pub chain_hash: [u8; 32],
    /// Funder-chosen id until the funding outpoint exists.
    pub pending_channel_id: [u8; 32],
    /// Total funding in satoshis.
    pub funding_satoshis: u64,
    /// Amount pushed to the acceptor, in millisatoshis.
    pub push_msat: u64,
    /// Dust threshold for the funder's commitment outputs.
    pub dust_limit_satoshis: u64,
    /// Cap on in-flight HTLC value, in millisatoshis.
    pub max_value_in_flight_msat: u64,
    /// Reserve the acceptor must keep, in satoshis.
    pub channel_reserve_satoshis: u64,
    /// Smallest HTLC the funder will accept, in millisatoshis.
    pub htlc_minimum_msat: u64,
    /// Initial commitment fee rate, satoshis per kiloweight.
    pub fee_per_kw: u32,
    /// Blocks the acceptor's to-self outputs are delayed.
    pub csv_delay: u16,
    /// Cap on concurrently offered HTLCs.
    pub max_accepted_htlcs: u16,
    /// Key the funding multisig output pays to.
    pub funding_pubkey: PublicKey,
    /// Revocation basepoint.
    pub revocation_basepoint: PublicKey,
    /// Payment basepoint.
    pub payment_basepoint: PublicKey,
    /// Delayed payment basepoint.
    pub delayed_payment_basepoint: PublicKey,
    /// HTLC basepoint.
    pub htlc_basepoint: PublicKey,
    /// First per-commitment point.
    pub first_per_commitment_point: PublicKey,
    /// Channel flags; bit 0 announces the channel.
    pub channel_flags: u8,
    /// Optional negotiated records.
    pub tlvs: ChannelTlvs,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl OpenChannel {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        write_all(w, &self.chain_hash)?;
        write_all(w, &self.pending_channel_id)?;
        write_u64(w, self.funding_satoshis)?;
        write_u64(w, self.push_msat)?;
        write_u64(w, self.dust_limit_satoshis)?;
        write_u64(w, self.max_value_in_flight_msat)?;
        write_u64(w, self.channel_reserve_satoshis)?;
        write_u64(w, self.htlc_minimum_msat)?;
        write_u32(w, self.fee_per_kw)?;
        write_u16(w, self.csv_delay)?;
        write_u16(w, self.max_accepted_htlcs)?;
        self.funding_pubkey.encode(w)?;
        self.revocation_basepoint.encode(w)?;
        self.payment_basepoint.encode(w)?;
        self.delayed_payment_basepoint.encode(w)?;
        self.htlc_basepoint.encode(w)?;
        self.first_per_commitment_point.encode(w)?;
        write_u8(w, self.channel_flags)?;
        self.tlvs.encode_with_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        let chain_hash = read_array::<32, _>(r, "chain hash")?;
        let pending_channel_id = read_array::<32, _>(r, "pending channel id")?;
        let funding_satoshis = read_u64(r, "funding amount")?;
        let push_msat = read_u64(r, "push amount")?;
        let dust_limit_satoshis = read_u64(r, "dust limit")?;
        let max_value_in_flight_msat = read_u64(r, "max value in flight")?;
        let channel_reserve_satoshis = read_u64(r, "channel reserve")?;
        let htlc_minimum_msat = read_u64(r, "htlc minimum")?;
        let fee_per_kw = read_u32(r, "fee per kw")?;
        let csv_delay = read_u16(r, "csv delay")?;
        let max_accepted_htlcs = read_u16(r, "max accepted htlcs")?;
        let funding_pubkey = PublicKey::decode(r)?;
        let revocation_basepoint = PublicKey::decode(r)?;
        let payment_basepoint = PublicKey::decode(r)?;
        let delayed_payment_basepoint = PublicKey::decode(r)?;
        let htlc_basepoint = PublicKey::decode(r)?;
        let first_per_commitment_point = PublicKey::decode(r)?;
        let channel_flags = super::codec::read_u8(r, "channel flags")?;
        let (tlvs, extra_data) = ChannelTlvs::decode_with_trailer(r)?;

        Ok(Self {
            chain_hash,
            pending_channel_id,
            funding_satoshis,
            push_msat,
            dust_limit_satoshis,
            max_value_in_flight_msat,
            channel_reserve_satoshis,
            htlc_minimum_msat,
            fee_per_kw,
            csv_delay,
            max_accepted_htlcs,
            funding_pubkey,
            revocation_basepoint,
            payment_basepoint,
            delayed_payment_basepoint,
            htlc_basepoint,
            first_per_commitment_point,
            channel_flags,
            tlvs,
            extra_data,
        })
    }
}

/// Accepts a proposed channel, stating the acceptor's constraints.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AcceptChannel {
    /// Mirrors the proposal's pending id.
    pub pending_channel_id: [u8; 32],
    /// Dust threshold for the acceptor's commitment outputs.
    pub dust_limit_satoshis: u64,
    /// Cap on in-flight HTLC value, in millisatoshis.
    pub max_value_in_flight_msat: u64,
    /// Reserve the funder must keep, in satoshis.
    pub channel_reserve_satoshis: u64,
    /// Smallest HTLC the acceptor will accept, in millisatoshis.
    pub htlc_minimum_msat: u64,
    /// Confirmations required before the channel is usable.
    pub min_accept_depth: u32,
    /// Blocks the funder's to-self outputs are delayed.
    pub csv_delay: u16,
    /// Cap on concurrently offered HTLCs.
    pub max_accepted_htlcs: u16,
    /// Key the funding multisig output pays to.
    pub funding_pubkey: PublicKey,
    /// Revocation basepoint.
    pub revocation_basepoint: PublicKey,
    /// Payment basepoint.
    pub payment_basepoint: PublicKey,
    /// Delayed payment basepoint.
    pub delayed_payment_basepoint: PublicKey,
    /// HTLC basepoint.
    pub htlc_basepoint: PublicKey,
    /// First per-commitment point.
    pub first_per_commitment_point: PublicKey,
    /// Optional negotiated records.
    pub tlvs: ChannelTlvs,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl AcceptChannel {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        write_all(w, &self.pending_channel_id)?;
        write_u64(w, self.dust_limit_satoshis)?;
        write_u64(w, self.max_value_in_flight_msat)?;
        write_u64(w, self.channel_reserve_satoshis)?;
        write_u64(w, self.htlc_minimum_msat)?;
        write_u32(w, self.min_accept_depth)?;
        write_u16(w, self.csv_delay)?;
        write_u16(w, self.max_accepted_htlcs)?;
        self.funding_pubkey.encode(w)?;
        self.revocation_basepoint.encode(w)?;
        self.payment_basepoint.encode(w)?;
        self.delayed_payment_basepoint.encode(w)?;
        self.htlc_basepoint.encode(w)?;
        self.first_per_commitment_point.encode(w)?;
        self.tlvs.encode_with_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        let pending_channel_id = read_array::<32, _>(r, "pending channel id")?;
        let dust_limit_satoshis = read_u64(r, "dust limit")?;
        let max_value_in_flight_msat = read_u64(r, "max value in flight")?;
        let channel_reserve_satoshis = read_u64(r, "channel reserve")?;
        let htlc_minimum_msat = read_u64(r, "htlc minimum")?;
        let min_accept_depth = read_u32(r, "min accept depth")?;
        let csv_delay = read_u16(r, "csv delay")?;
        let max_accepted_htlcs = read_u16(r, "max accepted htlcs")?;
        let funding_pubkey = PublicKey::decode(r)?;
        let revocation_basepoint = PublicKey::decode(r)?;
        let payment_basepoint = PublicKey::decode(r)?;
        let delayed_payment_basepoint = PublicKey::decode(r)?;
        let htlc_basepoint = PublicKey::decode(r)?;
        let first_per_commitment_point = PublicKey::decode(r)?;
        let (tlvs, extra_data) = ChannelTlvs::decode_with_trailer(r)?;

        Ok(Self {
            pending_channel_id,
            dust_limit_satoshis,
            max_value_in_flight_msat,
            channel_reserve_satoshis,
            htlc_minimum_msat,
            min_accept_depth,
            csv_delay,
            max_accepted_htlcs,
            funding_pubkey,
            revocation_basepoint,
            payment_basepoint,
            delayed_payment_basepoint,
            htlc_basepoint,
            first_per_commitment_point,
            tlvs,
            extra_data,
        })
    }
}

/// Names the funding outpoint and signs the acceptor's first commitment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FundingCreated {
    /// The proposal this funding belongs to.
    pub pending_channel_id: [u8; 32],
    /// Where the funding output landed.
    pub funding_point: OutPoint,
    /// Signature over the acceptor's initial commitment transaction.
    pub commit_sig: Signature,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl FundingCreated {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        write_all(w, &self.pending_channel_id)?;
        self.funding_point.encode(w)?;
        self.commit_sig.encode(w)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            pending_channel_id: read_array::<32, _>(r, "pending channel id")?,
            funding_point: OutPoint::decode(r)?,
            commit_sig: Signature::decode(r)?,
            extra_data: super::setup::read_trailer(r)?,
        })
    }
}

/// The funder's mirror of [`FundingCreated`], switching both sides to
/// the outpoint-derived channel id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FundingSigned {
    /// The channel id derived from the funding outpoint.
    pub channel_id: ChannelId,
    /// Signature over the funder's initial commitment transaction.
    pub commit_sig: Signature,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl FundingSigned {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        self.commit_sig.encode(w)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            channel_id: ChannelId::decode(r)?,
            commit_sig: Signature::decode(r)?,
            extra_data: super::setup::read_trailer(r)?,
        })
    }
}

/// Announces that the funding transaction has enough confirmations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelReady {
    /// The channel that is now usable.
    pub channel_id: ChannelId,
    /// Second per-commitment point for the commitment chain.
    pub next_per_commitment_point: PublicKey,
    /// Alias to use in invoices instead of the real short channel id.
    pub alias_scid: Option<ShortChannelId>,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl ChannelReady {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        self.next_per_commitment_point.encode(w)?;

        let mut known = Vec::new();
        if let Some(alias) = self.alias_scid {
            known.push(Record {
                record_type: TLV_ALIAS_SCID,
                value: alias.to_u64().to_be_bytes().to_vec(),
            });
        }
        super::tlv::merge_and_encode(w, known, &CustomRecords::new(), &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        let channel_id = ChannelId::decode(r)?;
        let next_per_commitment_point = PublicKey::decode(r)?;

        let mut trailer = Vec::new();
        r.read_to_end(&mut trailer).map_err(WireError::Io)?;

        let mut alias_scid = None;
        let mut extra = Vec::new();
        for record in decode_stream(&trailer)? {
            match record.record_type {
                TLV_ALIAS_SCID => {
                    let bytes: [u8; 8] = record.value.as_slice().try_into().map_err(|_| {
                        WireError::MalformedTlv(format!("alias of {} bytes", record.value.len()))
                    })?;
                    alias_scid = Some(ShortChannelId::from_u64(u64::from_be_bytes(bytes)));
                }
                _ => extra.push(record),
            }
        }

        Ok(Self {
            channel_id,
            next_per_commitment_point,
            alias_scid,
            extra_data: ExtraOpaqueData::from_records(&extra)?,
        })
    }
}

/// Begins cooperative close by naming the sender's delivery script.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Shutdown {
    /// The channel being closed.
    pub channel_id: ChannelId,
    /// Script the sender's funds should close out to.
    pub shutdown_script: Vec<u8>,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl Shutdown {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        write_bytes_u16(w, &self.shutdown_script)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            channel_id: ChannelId::decode(r)?,
            shutdown_script: read_bytes_u16(r, "shutdown script")?,
            extra_data: super::setup::read_trailer(r)?,
        })
    }
}

/// One round of cooperative-close fee negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClosingSigned {
    /// The channel being closed.
    pub channel_id: ChannelId,
    /// Fee the sender proposes for the closing transaction.
    pub fee_satoshis: u64,
    /// Signature over the closing transaction at that fee.
    pub signature: Signature,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl ClosingSigned {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        write_u64(w, self.fee_satoshis)?;
        self.signature.encode(w)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            channel_id: ChannelId::decode(r)?,
            fee_satoshis: read_u64(r, "closing fee")?,
            signature: Signature::decode(r)?,
            extra_data: super::setup::read_trailer(r)?,
        })
    }
}
