//! Commitment-update messages: HTLC lifecycle, fee updates, and
//! reconnection state.

use std::io::{Read, Write};

use super::codec::{
    read_array, read_bytes_u16, read_u16, read_u32, read_u64, write_all, write_bytes_u16,
    write_u16, write_u32, write_u64,
};
use super::setup::{read_trailer, write_trailer};
use super::tlv::{decode_stream, CustomRecords, ExtraOpaqueData, Record};
use super::types::{ChannelId, PublicKey, Signature};
use super::{WireError, MIN_CUSTOM_RECORDS_TLV_TYPE};

/// Size of the fixed onion routing packet carried by every HTLC add.
pub const ONION_PACKET_SIZE: usize = 1366;

const TLV_BLINDING_POINT: u64 = 0;

/// Offers an HTLC to the remote commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAddHtlc {
    /// The channel the HTLC rides on.
    pub channel_id: ChannelId,
    /// Sender-local HTLC counter.
    pub id: u64,
    /// Amount offered, in millisatoshis.
    pub amount_msat: u64,
    /// Hash whose preimage settles the HTLC.
    pub payment_hash: [u8; 32],
    /// Absolute block height the HTLC times out at.
    pub expiry: u32,
    /// The onion routing packet for the next hops.
    pub onion_blob: Box<[u8; ONION_PACKET_SIZE]>,
    /// Blinding point for route-blinded forwards.
    pub blinding_point: Option<PublicKey>,
    /// Application records attached to the HTLC.
    pub custom_records: CustomRecords,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl Default for UpdateAddHtlc {
    fn default() -> Self {
        Self {
            channel_id: ChannelId::default(),
            id: 0,
            amount_msat: 0,
            payment_hash: [0; 32],
            expiry: 0,
            onion_blob: Box::new([0; ONION_PACKET_SIZE]),
            blinding_point: None,
            custom_records: CustomRecords::new(),
            extra_data: ExtraOpaqueData::new(),
        }
    }
}

impl UpdateAddHtlc {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        write_u64(w, self.id)?;
        write_u64(w, self.amount_msat)?;
        write_all(w, &self.payment_hash)?;
        write_u32(w, self.expiry)?;
        write_all(w, &self.onion_blob[..])?;

        let mut known = Vec::new();
        if let Some(point) = &self.blinding_point {
            known.push(Record {
                record_type: TLV_BLINDING_POINT,
                value: point.as_bytes().to_vec(),
            });
        }
        super::tlv::merge_and_encode(w, known, &self.custom_records, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        let channel_id = ChannelId::decode(r)?;
        let id = read_u64(r, "htlc id")?;
        let amount_msat = read_u64(r, "htlc amount")?;
        let payment_hash = read_array::<32, _>(r, "payment hash")?;
        let expiry = read_u32(r, "htlc expiry")?;
        let onion_blob = Box::new(read_array::<ONION_PACKET_SIZE, _>(r, "onion blob")?);

        let mut trailer = Vec::new();
        r.read_to_end(&mut trailer).map_err(WireError::Io)?;

        let mut blinding_point = None;
        let mut custom_records = CustomRecords::new();
        let mut extra = Vec::new();
        for record in decode_stream(&trailer)? {
            match record.record_type {
                TLV_BLINDING_POINT => {
                    let bytes: [u8; 33] = record.value.as_slice().try_into().map_err(|_| {
                        WireError::MalformedTlv(format!(
                            "blinding point of {} bytes",
                            record.value.len()
                        ))
                    })?;
                    blinding_point = Some(PublicKey::from_bytes(bytes)?);
                }
                t if t >= MIN_CUSTOM_RECORDS_TLV_TYPE => {
                    custom_records.0.insert(t, record.value);
                }
                _ => extra.push(record),
            }
        }

        Ok(Self {
            channel_id,
            id,
            amount_msat,
            payment_hash,
            expiry,
            onion_blob,
            blinding_point,
            custom_records,
            extra_data: ExtraOpaqueData::from_records(&extra)?,
        })
    }
}

/// Settles an HTLC by revealing its preimage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateFulfillHtlc {
    /// The channel the HTLC rides on.
    pub channel_id: ChannelId,
    /// The HTLC being settled.
    pub id: u64,
    /// Preimage of the payment hash.
    pub payment_preimage: [u8; 32],
    /// Application records attached to the settle.
    pub custom_records: CustomRecords,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl UpdateFulfillHtlc {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        write_u64(w, self.id)?;
        write_all(w, &self.payment_preimage)?;
        super::tlv::merge_and_encode(w, Vec::new(), &self.custom_records, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        let channel_id = ChannelId::decode(r)?;
        let id = read_u64(r, "htlc id")?;
        let payment_preimage = read_array::<32, _>(r, "payment preimage")?;

        let mut trailer = Vec::new();
        r.read_to_end(&mut trailer).map_err(WireError::Io)?;

        let mut custom_records = CustomRecords::new();
        let mut extra = Vec::new();
        for record in decode_stream(&trailer)? {
            if record.record_type >= MIN_CUSTOM_RECORDS_TLV_TYPE {
                custom_records.0.insert(record.record_type, record.value);
            } else {
                extra.push(record);
            }
        }

        Ok(Self {
            channel_id,
            id,
            payment_preimage,
            custom_records,
            extra_data: ExtraOpaqueData::from_records(&extra)?,
        })
    }
}

/// Fails an HTLC with an encrypted reason for the origin.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateFailHtlc {
    /// The channel the HTLC rides on.
    pub channel_id: ChannelId,
    /// The HTLC being failed.
    pub id: u64,
    /// Onion-encrypted failure reason.
    pub reason: Vec<u8>,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl UpdateFailHtlc {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        write_u64(w, self.id)?;
        write_bytes_u16(w, &self.reason)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            channel_id: ChannelId::decode(r)?,
            id: read_u64(r, "htlc id")?,
            reason: read_bytes_u16(r, "failure reason")?,
            extra_data: read_trailer(r)?,
        })
    }
}

/// Fails an HTLC whose onion could not even be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateFailMalformedHtlc {
    /// The channel the HTLC rides on.
    pub channel_id: ChannelId,
    /// The HTLC being failed.
    pub id: u64,
    /// Hash of the onion the sender could not process.
    pub sha256_of_onion: [u8; 32],
    /// BADONION failure code.
    pub failure_code: u16,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl UpdateFailMalformedHtlc {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        write_u64(w, self.id)?;
        write_all(w, &self.sha256_of_onion)?;
        write_u16(w, self.failure_code)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            channel_id: ChannelId::decode(r)?,
            id: read_u64(r, "htlc id")?,
            sha256_of_onion: read_array::<32, _>(r, "sha256 of onion")?,
            failure_code: read_u16(r, "failure code")?,
            extra_data: read_trailer(r)?,
        })
    }
}

/// Signs the remote commitment with all pending updates applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommitSig {
    /// The channel being signed.
    pub channel_id: ChannelId,
    /// Signature over the remote commitment transaction.
    pub commit_sig: Signature,
    /// One signature per HTLC output, in output order.
    pub htlc_sigs: Vec<Signature>,
    /// Application records attached to the signature.
    pub custom_records: CustomRecords,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl CommitSig {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        self.commit_sig.encode(w)?;
        if self.htlc_sigs.len() > u16::MAX as usize {
            return Err(WireError::BodyTooLarge(self.htlc_sigs.len() * 64));
        }
        write_u16(w, self.htlc_sigs.len() as u16)?;
        for sig in &self.htlc_sigs {
            sig.encode(w)?;
        }
        super::tlv::merge_and_encode(w, Vec::new(), &self.custom_records, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        let channel_id = ChannelId::decode(r)?;
        let commit_sig = Signature::decode(r)?;
        let num_sigs = read_u16(r, "htlc sig count")?;
        let mut htlc_sigs = Vec::with_capacity(num_sigs as usize);
        for _ in 0..num_sigs {
            htlc_sigs.push(Signature::decode(r)?);
        }

        let mut trailer = Vec::new();
        r.read_to_end(&mut trailer).map_err(WireError::Io)?;

        let mut custom_records = CustomRecords::new();
        let mut extra = Vec::new();
        for record in decode_stream(&trailer)? {
            if record.record_type >= MIN_CUSTOM_RECORDS_TLV_TYPE {
                custom_records.0.insert(record.record_type, record.value);
            } else {
                extra.push(record);
            }
        }

        Ok(Self {
            channel_id,
            commit_sig,
            htlc_sigs,
            custom_records,
            extra_data: ExtraOpaqueData::from_records(&extra)?,
        })
    }
}

/// Revokes the previous commitment and supplies the next point.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RevokeAndAck {
    /// The channel being advanced.
    pub channel_id: ChannelId,
    /// Per-commitment secret of the revoked commitment.
    pub revocation: [u8; 32],
    /// Commitment point for the next commitment.
    pub next_revocation_key: PublicKey,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl RevokeAndAck {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        write_all(w, &self.revocation)?;
        self.next_revocation_key.encode(w)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            channel_id: ChannelId::decode(r)?,
            revocation: read_array::<32, _>(r, "revocation secret")?,
            next_revocation_key: PublicKey::decode(r)?,
            extra_data: read_trailer(r)?,
        })
    }
}

/// Changes the commitment fee rate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateFee {
    /// The channel whose fee changes.
    pub channel_id: ChannelId,
    /// New fee rate, satoshis per kiloweight.
    pub fee_per_kw: u32,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl UpdateFee {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        write_u32(w, self.fee_per_kw)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            channel_id: ChannelId::decode(r)?,
            fee_per_kw: read_u32(r, "fee per kw")?,
            extra_data: read_trailer(r)?,
        })
    }
}

/// Re-synchronizes commitment state after a reconnection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelReestablish {
    /// The channel being resumed.
    pub channel_id: ChannelId,
    /// Next commitment number the sender expects to sign.
    pub next_local_commitment_number: u64,
    /// Next commitment number the sender expects to revoke.
    pub remote_commitment_number: u64,
    /// Last per-commitment secret received from the peer.
    pub last_remote_commit_secret: [u8; 32],
    /// Sender's current unrevoked commitment point.
    pub local_unrevoked_commit_point: PublicKey,
    /// Unparsed TLV trailer.
    pub extra_data: ExtraOpaqueData,
}

impl ChannelReestablish {
    pub(crate) fn encode<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.channel_id.encode(w)?;
        write_u64(w, self.next_local_commitment_number)?;
        write_u64(w, self.remote_commitment_number)?;
        write_all(w, &self.last_remote_commit_secret)?;
        self.local_unrevoked_commit_point.encode(w)?;
        write_trailer(w, &self.extra_data)
    }

    pub(crate) fn decode<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            channel_id: ChannelId::decode(r)?,
            next_local_commitment_number: read_u64(r, "next commitment number")?,
            remote_commitment_number: read_u64(r, "remote commitment number")?,
            last_remote_commit_secret: read_array::<32, _>(r, "remote commit secret")?,
            local_unrevoked_commit_point: PublicKey::decode(r)?,
            extra_data: read_trailer(r)?,
        })
    }
}
