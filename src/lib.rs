//! # lnlink
//!
//! Peer plumbing for a Lightning Network node: the typed peer-wire message
//! codec, the inbound peer admission controller, and a client for the local
//! Tor daemon's control port.
//!
//! # Overview
//!
//! The crate is a layered stack of three independent components:
//!
//! ```text
//!                   ┌───────────────────────────┐
//!   inbound TCP ──▶ │ access::AccessManager     │──▶ accept / reject
//!                   └─────────────┬─────────────┘
//!                                 ▼
//!                   ┌───────────────────────────┐
//!   framed bytes ◀─▶│ wire::Message codec       │◀─▶ typed messages
//!                   └───────────────────────────┘
//!
//!                   ┌───────────────────────────┐
//!   local Tor   ◀─▶ │ controller::TorController │──▶ onion address
//!                   └───────────────────────────┘
//! ```
//!
//! - [`wire`]: the extensible binary framing used on the peer wire. Every
//!   message is a 2-byte big-endian type tag followed by a typed body and
//!   an opaque TLV trailer that survives round-trips byte-for-byte.
//! - [`access`]: classifies inbound peers into protected, temporary, and
//!   restricted tiers and enforces a bounded pool of restricted slots.
//! - [`controller`] (with [`socket`], [`protocol`], [`auth`], and
//!   [`version`]): speaks the text-based Tor control protocol to manage
//!   the lifetime of the node's ephemeral onion service.
//!
//! # Example
//!
//! Round-tripping a wire message:
//!
//! ```rust
//! use lnlink::wire::{self, Message, Ping};
//!
//! let ping = Message::Ping(Ping {
//!     num_pong_bytes: 10,
//!     padding_bytes: vec![0; 4],
//! });
//!
//! let mut buf = Vec::new();
//! wire::write_message(&mut buf, &ping, 0).unwrap();
//!
//! let decoded = wire::read_message(&mut buf.as_slice(), 0).unwrap();
//! assert_eq!(ping, decoded);
//! ```
//!
//! # Concurrency
//!
//! The wire codec is stateless. [`access::AccessManager`] guards all of its
//! state behind a single internal mutex and may be shared freely between
//! tasks. [`controller::TorController`] serializes commands on the control
//! connection so that only one request/reply exchange is in flight at a
//! time.

pub mod access;
pub mod auth;
pub mod controller;
pub mod protocol;
pub mod socket;
pub mod version;
pub mod wire;

pub use access::AccessManager;
pub use controller::TorController;
pub use socket::ControlSocket;

use thiserror::Error;

/// Errors surfaced by the Tor controller and its supporting layers.
///
/// Wire codec failures use [`wire::WireError`] and admission failures use
/// [`access::AccessError`]; this enum covers the control-port client only,
/// mirroring how the components are deployed (a codec error tears down a
/// peer, a controller error tears down at most the onion service).
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying socket I/O failed.
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),

    /// The Tor daemon closed the control connection.
    #[error("control connection closed")]
    ConnectionClosed,

    /// A reply line was shorter than the minimum `NNNx` prefix.
    #[error("short reply line: {0:?}")]
    ShortLine(String),

    /// A reply line's fourth byte was not one of space, `-`, or `+`.
    #[error("invalid reply line prefix: {0:?}")]
    InvalidLinePrefix(String),

    /// A reply line carried a status code other than the one expected for
    /// the command. The collected reply text is preserved so callers can
    /// log what the daemon actually said.
    #[error("unexpected response code {code}: {reply}")]
    UnexpectedCode {
        /// The status code found on the offending line.
        code: u16,
        /// All reply text collected up to and including that line.
        reply: String,
    },

    /// The reply violated the control protocol in some other way.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Authentication against the control port failed.
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// A command was issued before [`TorController::start`] succeeded.
    #[error("tor controller must be started")]
    NotStarted,

    /// A command was issued after [`TorController::stop`].
    #[error("tor controller must not be stopped")]
    Stopped,

    /// The daemon's version string did not have the expected
    /// `major.minor.revision.build` shape.
    #[error("malformed tor version: {0:?}")]
    MalformedVersion(String),

    /// The daemon is too old to host v3 onion services.
    #[error("tor version {version} below minimum supported {minimum}")]
    VersionUnsupported {
        /// The version reported by PROTOCOLINFO.
        version: String,
        /// The minimum version this crate requires.
        minimum: &'static str,
    },
}

/// Errors specific to control-port authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The daemon advertises none of NULL, SAFECOOKIE, or HASHEDPASSWORD.
    #[error(
        "the Tor server must be configured with NULL, SAFECOOKIE, or HASHEDPASSWORD authentication"
    )]
    NoSupportedAuth,

    /// A password was configured but the daemon does not advertise
    /// HASHEDPASSWORD.
    #[error("{0} authentication method not supported")]
    MethodNotSupported(&'static str),

    /// The authentication cookie could not be read or had the wrong size.
    #[error("invalid authentication cookie: {0}")]
    BadCookie(String),

    /// SERVERHASH was missing, malformed, or failed verification.
    #[error("bad server hash: {0}")]
    BadServerHash(String),

    /// SERVERNONCE was missing or malformed.
    #[error("bad server nonce: {0}")]
    BadServerNonce(String),
}

/// Compares two byte slices in constant time.
///
/// Used for SAFECOOKIE server-hash verification, where a variable-time
/// comparison would leak how many leading bytes of the expected HMAC an
/// attacker got right.
///
/// # Example
///
/// ```rust
/// assert!(lnlink::secure_compare(b"onion", b"onion"));
/// assert!(!lnlink::secure_compare(b"onion", b"onio!"));
/// assert!(!lnlink::secure_compare(b"onion", b"onions"));
/// ```
pub fn secure_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
