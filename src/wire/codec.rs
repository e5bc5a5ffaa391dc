//! Low-level element readers and writers shared by all message bodies.
//!
//! Every integer on the wire is big-endian. Variable-length byte strings
//! carry a 2-byte length prefix. A read that runs out of bytes mid-field
//! is a [`WireError::ShortRead`], distinct from a declared length that
//! overruns the frame ([`WireError::TruncatedField`]).

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::WireError;

pub(crate) fn map_eof(e: std::io::Error, what: &str) -> WireError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        WireError::ShortRead(what.to_string())
    } else {
        WireError::Io(e)
    }
}

pub(crate) fn read_u8<R: Read>(r: &mut R, what: &str) -> Result<u8, WireError> {
    r.read_u8().map_err(|e| map_eof(e, what))
}

pub(crate) fn read_u16<R: Read>(r: &mut R, what: &str) -> Result<u16, WireError> {
    r.read_u16::<BigEndian>().map_err(|e| map_eof(e, what))
}

pub(crate) fn read_u32<R: Read>(r: &mut R, what: &str) -> Result<u32, WireError> {
    r.read_u32::<BigEndian>().map_err(|e| map_eof(e, what))
}

pub(crate) fn read_u64<R: Read>(r: &mut R, what: &str) -> Result<u64, WireError> {
    r.read_u64::<BigEndian>().map_err(|e| map_eof(e, what))
}

pub(crate) fn read_array<const N: usize, R: Read>(
    r: &mut R,
    what: &str,
) -> Result<[u8; N], WireError> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf).map_err(|e| map_eof(e, what))?;
    Ok(buf)
}

pub(crate) fn write_u8<W: Write>(w: &mut W, value: u8) -> Result<(), WireError> {
    w.write_u8(value).map_err(WireError::Io)
}

pub(crate) fn write_u16<W: Write>(w: &mut W, value: u16) -> Result<(), WireError> {
    w.write_u16::<BigEndian>(value).map_err(WireError::Io)
}

pub(crate) fn write_u32<W: Write>(w: &mut W, value: u32) -> Result<(), WireError> {
    w.write_u32::<BigEndian>(value).map_err(WireError::Io)
}

pub(crate) fn write_u64<W: Write>(w: &mut W, value: u64) -> Result<(), WireError> {
    w.write_u64::<BigEndian>(value).map_err(WireError::Io)
}

pub(crate) fn write_all<W: Write>(w: &mut W, bytes: &[u8]) -> Result<(), WireError> {
    w.write_all(bytes).map_err(WireError::Io)
}

/// Reads a byte string with a 2-byte length prefix.
pub(crate) fn read_bytes_u16<R: Read>(r: &mut R, what: &str) -> Result<Vec<u8>, WireError> {
    let len = read_u16(r, what)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            WireError::TruncatedField(format!("{}: {} bytes declared", what, len))
        } else {
            WireError::Io(e)
        }
    })?;
    Ok(buf)
}

/// Writes a byte string with a 2-byte length prefix.
pub(crate) fn write_bytes_u16<W: Write>(w: &mut W, bytes: &[u8]) -> Result<(), WireError> {
    if bytes.len() > u16::MAX as usize {
        return Err(WireError::BodyTooLarge(bytes.len()));
    }
    write_u16(w, bytes.len() as u16)?;
    write_all(w, bytes)
}
