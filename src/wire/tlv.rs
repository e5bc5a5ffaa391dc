//! TLV records and the BigSize varint.
//!
//! Message bodies end in an extensible trailer of type-length-value
//! records. Types and lengths are BigSize varints with a canonical
//! minimal encoding, and records must appear in strictly increasing type
//! order; both rules are enforced on decode so a malformed trailer is
//! rejected at the frame boundary instead of corrupting later fields.
//!
//! Unknown records are not dropped: they ride along in
//! [`ExtraOpaqueData`] and are re-emitted byte-for-byte on encode, so a
//! node running older software can relay records it does not understand.
//!
//! # BigSize
//!
//! | First byte | Format                      | Range                |
//! |------------|-----------------------------|----------------------|
//! | `< 0xfd`   | the value itself            | 0 – 252              |
//! | `0xfd`     | 2-byte big-endian follows   | 253 – 65535          |
//! | `0xfe`     | 4-byte big-endian follows   | 65536 – 2^32−1       |
//! | `0xff`     | 8-byte big-endian follows   | 2^32 – 2^64−1        |
//!
//! A value encoded in more bytes than needed (`0xfd 0x00 0x01`, say) is
//! rejected as non-canonical.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::{WireError, MIN_CUSTOM_RECORDS_TLV_TYPE};

/// Writes `value` in its minimal BigSize encoding.
pub fn write_bigsize<W: Write>(w: &mut W, value: u64) -> Result<(), WireError> {
    if value < 0xfd {
        w.write_u8(value as u8)?;
    } else if value <= 0xffff {
        w.write_u8(0xfd)?;
        w.write_u16::<BigEndian>(value as u16)?;
    } else if value <= 0xffff_ffff {
        w.write_u8(0xfe)?;
        w.write_u32::<BigEndian>(value as u32)?;
    } else {
        w.write_u8(0xff)?;
        w.write_u64::<BigEndian>(value)?;
    }
    Ok(())
}

/// Reads a BigSize, rejecting non-minimal encodings.
pub fn read_bigsize<R: Read>(r: &mut R) -> Result<u64, WireError> {
    let discriminant = r.read_u8().map_err(short_read)?;
    match discriminant {
        0xfd => {
            let value = r.read_u16::<BigEndian>().map_err(short_read)? as u64;
            if value < 0xfd {
                return Err(WireError::MalformedTlv("non-canonical bigsize".into()));
            }
            Ok(value)
        }
        0xfe => {
            let value = r.read_u32::<BigEndian>().map_err(short_read)? as u64;
            if value <= 0xffff {
                return Err(WireError::MalformedTlv("non-canonical bigsize".into()));
            }
            Ok(value)
        }
        0xff => {
            let value = r.read_u64::<BigEndian>().map_err(short_read)?;
            if value <= 0xffff_ffff {
                return Err(WireError::MalformedTlv("non-canonical bigsize".into()));
            }
            Ok(value)
        }
        value => Ok(value as u64),
    }
}

fn short_read(e: std::io::Error) -> WireError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        WireError::MalformedTlv("truncated bigsize".into())
    } else {
        WireError::Io(e)
    }
}

/// One type-length-value record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The record type.
    pub record_type: u64,
    /// The record payload.
    pub value: Vec<u8>,
}

/// Parses a full TLV stream out of `bytes`.
///
/// Enforces canonical BigSize encodings, complete records, and strictly
/// increasing types (which also outlaws duplicates). An empty slice
/// parses to an empty stream.
pub fn decode_stream(bytes: &[u8]) -> Result<Vec<Record>, WireError> {
    let mut records = Vec::new();
    let mut cursor = std::io::Cursor::new(bytes);
    let mut last_type: Option<u64> = None;

    while (cursor.position() as usize) < bytes.len() {
        let record_type = read_bigsize(&mut cursor)?;

        if let Some(last) = last_type {
            if record_type <= last {
                return Err(WireError::MalformedTlv(format!(
                    "tlv type {} not greater than preceding type {}",
                    record_type, last
                )));
            }
        }
        last_type = Some(record_type);

        let length = read_bigsize(&mut cursor)?;
        let remaining = bytes.len() as u64 - cursor.position();
        if length > remaining {
            return Err(WireError::MalformedTlv(format!(
                "tlv record of {} bytes overruns stream ({} left)",
                length, remaining
            )));
        }

        let mut value = vec![0u8; length as usize];
        cursor.read_exact(&mut value)?;

        records.push(Record { record_type, value });
    }

    Ok(records)
}

/// Writes `records` as a TLV stream, in the given order.
///
/// Callers sort beforehand; this refuses non-monotone input rather than
/// silently emitting a stream every compliant reader would reject.
pub fn encode_stream<W: Write>(w: &mut W, records: &[Record]) -> Result<(), WireError> {
    let mut last_type: Option<u64> = None;
    for record in records {
        if let Some(last) = last_type {
            if record.record_type <= last {
                return Err(WireError::MalformedTlv(format!(
                    "refusing to encode tlv type {} after type {}",
                    record.record_type, last
                )));
            }
        }
        last_type = Some(record.record_type);

        write_bigsize(w, record.record_type)?;
        write_bigsize(w, record.value.len() as u64)?;
        w.write_all(&record.value)?;
    }
    Ok(())
}

/// The opaque TLV trailer of a message: records this implementation does
/// not understand, preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtraOpaqueData(pub Vec<u8>);

impl ExtraOpaqueData {
    /// An empty trailer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any opaque bytes are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses the trailer into records, validating it as a TLV stream.
    pub fn records(&self) -> Result<Vec<Record>, WireError> {
        decode_stream(&self.0)
    }

    /// Rebuilds a trailer from parsed records.
    pub fn from_records(records: &[Record]) -> Result<Self, WireError> {
        let mut bytes = Vec::new();
        encode_stream(&mut bytes, records)?;
        Ok(Self(bytes))
    }
}

impl From<Vec<u8>> for ExtraOpaqueData {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Application-defined records carried inside select messages.
///
/// All types must sit at or above [`MIN_CUSTOM_RECORDS_TLV_TYPE`]; the
/// range below it belongs to the protocol. The map form keeps lookups
/// cheap and serialization trivially sorted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomRecords(pub BTreeMap<u64, Vec<u8>>);

impl CustomRecords {
    /// An empty record set. Encodes to zero bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any records are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks that every type respects the custom-range floor.
    pub fn validate(&self) -> Result<(), WireError> {
        for &record_type in self.0.keys() {
            if record_type < MIN_CUSTOM_RECORDS_TLV_TYPE {
                return Err(WireError::MalformedTlv(format!(
                    "custom record type {} below minimum {}",
                    record_type, MIN_CUSTOM_RECORDS_TLV_TYPE
                )));
            }
        }
        Ok(())
    }

    /// The records as a sorted vector, ready for stream merging.
    pub fn to_records(&self) -> Vec<Record> {
        self.0
            .iter()
            .map(|(&record_type, value)| Record {
                record_type,
                value: value.clone(),
            })
            .collect()
    }
}

/// Merges per-field records, custom records, and the opaque trailer into
/// one stream sorted by type, refusing duplicates.
pub(crate) fn merge_and_encode<W: Write>(
    w: &mut W,
    known: Vec<Record>,
    custom: &CustomRecords,
    extra: &ExtraOpaqueData,
) -> Result<(), WireError> {
    custom.validate()?;

    let mut records = known;
    records.extend(custom.to_records());
    records.extend(extra.records()?);
    records.sort_by_key(|r| r.record_type);

    for pair in records.windows(2) {
        if pair[0].record_type == pair[1].record_type {
            return Err(WireError::MalformedTlv(format!(
                "duplicate tlv type {}",
                pair[0].record_type
            )));
        }
    }

    encode_stream(w, &records)
}
