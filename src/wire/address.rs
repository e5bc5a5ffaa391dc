//! The network address list carried in node announcements.
//!
//! Addresses are serialized as a 2-byte total length followed by entries
//! of one discriminator byte and a type-specific payload:
//!
//! | Discriminator | Kind          | Payload               |
//! |---------------|---------------|-----------------------|
//! | `1`           | IPv4 + port   | 4 + 2 bytes           |
//! | `2`           | IPv6 + port   | 16 + 2 bytes          |
//! | `3`           | Tor v2 onion  | 10-byte id + 2 bytes  |
//! | `4`           | Tor v3 onion  | 35-byte id + 2 bytes  |
//! | other         | opaque        | everything remaining  |
//!
//! A reader that meets an unknown discriminator cannot know the entry's
//! length, so it captures the discriminator *and every byte after it* as
//! a single [`OpaqueAddrs`]. Any known addresses that followed become
//! unrecoverable, a wire-observable quirk this implementation keeps, and
//! keeps byte-stable, so that re-emitting the list produces exactly the
//! input bytes.

use std::fmt;
use std::io::{Read, Write};
use std::net::{SocketAddrV4, SocketAddrV6};

use base32::Alphabet;

use super::codec::{read_array, read_u16, write_all, write_u16, write_u8};
use super::WireError;

const ADDR_IPV4: u8 = 1;
const ADDR_IPV6: u8 = 2;
const ADDR_ONION_V2: u8 = 3;
const ADDR_ONION_V3: u8 = 4;

/// Decoded length of a v2 onion service id.
pub const V2_ONION_LEN: usize = 10;
/// Decoded length of a v3 onion service id.
pub const V3_ONION_LEN: usize = 35;

const ONION_SUFFIX: &str = ".onion";
const BASE32: Alphabet = Alphabet::Rfc4648 { padding: false };

/// A Tor onion endpoint: `<base32-id>.onion` plus port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnionAddr {
    /// The onion hostname, `.onion` suffix included.
    pub service: String,
    /// The advertised port.
    pub port: u16,
}

impl OnionAddr {
    fn service_id_bytes(&self, expected_len: usize) -> Result<Vec<u8>, WireError> {
        let id = self
            .service
            .strip_suffix(ONION_SUFFIX)
            .ok_or_else(|| WireError::InvalidAddress(format!("missing .onion: {}", self.service)))?;

        let decoded = base32::decode(BASE32, &id.to_uppercase())
            .ok_or_else(|| WireError::InvalidAddress(format!("bad base32: {}", self.service)))?;

        if decoded.len() != expected_len {
            return Err(WireError::InvalidAddress(format!(
                "onion id of {} bytes, want {}",
                decoded.len(),
                expected_len
            )));
        }
        Ok(decoded)
    }

    fn from_id_bytes(id: &[u8], port: u16) -> Self {
        let service = base32::encode(BASE32, id).to_lowercase() + ONION_SUFFIX;
        Self { service, port }
    }
}

impl fmt::Display for OnionAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service, self.port)
    }
}

/// The tail of an address list behind an unknown discriminator.
///
/// `payload[0]` is the discriminator itself; the rest is whatever
/// followed it, preserved verbatim so downstream consumers see
/// bit-identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpaqueAddrs {
    /// Discriminator byte plus all trailing bytes.
    pub payload: Vec<u8>,
}

impl fmt::Display for OpaqueAddrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.payload))
    }
}

/// One advertised network address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetAddress {
    /// Clearnet IPv4.
    Ipv4(SocketAddrV4),
    /// Clearnet IPv6.
    Ipv6(SocketAddrV6),
    /// Tor v2 onion service (16 base32 characters).
    OnionV2(OnionAddr),
    /// Tor v3 onion service (56 base32 characters).
    OnionV3(OnionAddr),
    /// Unknown address type, preserved as raw bytes.
    Opaque(OpaqueAddrs),
}

impl fmt::Display for NetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetAddress::Ipv4(addr) => write!(f, "{}", addr),
            NetAddress::Ipv6(addr) => write!(f, "{}", addr),
            NetAddress::OnionV2(addr) | NetAddress::OnionV3(addr) => write!(f, "{}", addr),
            NetAddress::Opaque(addr) => write!(f, "{}", addr),
        }
    }
}

impl NetAddress {
    fn encode_entry<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        match self {
            NetAddress::Ipv4(addr) => {
                write_u8(w, ADDR_IPV4)?;
                write_all(w, &addr.ip().octets())?;
                write_u16(w, addr.port())
            }
            NetAddress::Ipv6(addr) => {
                write_u8(w, ADDR_IPV6)?;
                write_all(w, &addr.ip().octets())?;
                write_u16(w, addr.port())
            }
            NetAddress::OnionV2(addr) => {
                write_u8(w, ADDR_ONION_V2)?;
                write_all(w, &addr.service_id_bytes(V2_ONION_LEN)?)?;
                write_u16(w, addr.port)
            }
            NetAddress::OnionV3(addr) => {
                write_u8(w, ADDR_ONION_V3)?;
                write_all(w, &addr.service_id_bytes(V3_ONION_LEN)?)?;
                write_u16(w, addr.port)
            }
            // The discriminator is payload[0]; nothing to prepend.
            NetAddress::Opaque(addr) => write_all(w, &addr.payload),
        }
    }
}

/// Writes an address list with its 2-byte total length prefix.
pub fn encode_address_list<W: Write>(w: &mut W, addrs: &[NetAddress]) -> Result<(), WireError> {
    let mut body = Vec::new();
    for addr in addrs {
        addr.encode_entry(&mut body)?;
    }
    if body.len() > u16::MAX as usize {
        return Err(WireError::BodyTooLarge(body.len()));
    }
    write_u16(w, body.len() as u16)?;
    write_all(w, &body)
}

/// Reads an address list.
///
/// An unknown discriminator swallows the rest of the list as one
/// [`NetAddress::Opaque`]; see the module docs.
pub fn decode_address_list<R: Read>(r: &mut R) -> Result<Vec<NetAddress>, WireError> {
    let body_len = read_u16(r, "address list length")? as usize;
    let mut body = vec![0u8; body_len];
    r.read_exact(&mut body).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            WireError::TruncatedField(format!("address list: {} bytes declared", body_len))
        } else {
            WireError::Io(e)
        }
    })?;

    let mut addrs = Vec::new();
    let mut cursor = std::io::Cursor::new(&body[..]);

    while (cursor.position() as usize) < body.len() {
        let discriminator = read_array::<1, _>(&mut cursor, "address type")?[0];
        match discriminator {
            ADDR_IPV4 => {
                let ip = read_array::<4, _>(&mut cursor, "ipv4 address")?;
                let port = read_u16(&mut cursor, "ipv4 port")?;
                addrs.push(NetAddress::Ipv4(SocketAddrV4::new(ip.into(), port)));
            }
            ADDR_IPV6 => {
                let ip = read_array::<16, _>(&mut cursor, "ipv6 address")?;
                let port = read_u16(&mut cursor, "ipv6 port")?;
                addrs.push(NetAddress::Ipv6(SocketAddrV6::new(ip.into(), port, 0, 0)));
            }
            ADDR_ONION_V2 => {
                let id = read_array::<{ V2_ONION_LEN }, _>(&mut cursor, "onion v2 id")?;
                let port = read_u16(&mut cursor, "onion v2 port")?;
                addrs.push(NetAddress::OnionV2(OnionAddr::from_id_bytes(&id, port)));
            }
            ADDR_ONION_V3 => {
                let id = read_array::<{ V3_ONION_LEN }, _>(&mut cursor, "onion v3 id")?;
                let port = read_u16(&mut cursor, "onion v3 port")?;
                addrs.push(NetAddress::OnionV3(OnionAddr::from_id_bytes(&id, port)));
            }
            other => {
                // Unknown type: its length is unknowable, so everything
                // from here to the end of the list is one opaque entry.
                let mut payload = vec![other];
                let pos = cursor.position() as usize;
                payload.extend_from_slice(&body[pos..]);
                addrs.push(NetAddress::Opaque(OpaqueAddrs { payload }));
                break;
            }
        }
    }

    Ok(addrs)
}
