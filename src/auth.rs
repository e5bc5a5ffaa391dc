//! Control-port authentication.
//!
//! Before a controller may issue commands, the connection must be
//! authenticated. The daemon advertises its supported methods in the
//! PROTOCOLINFO reply; [`authenticate`] picks one in this order:
//!
//! 1. **HASHEDPASSWORD** when the caller configured a password (an error
//!    if the daemon does not advertise it, rather than a silent fallback);
//! 2. **SAFECOOKIE**, the challenge-response method, whenever advertised;
//! 3. **NULL** as the fallback;
//! 4. otherwise [`AuthError::NoSupportedAuth`].
//!
//! # SAFECOOKIE
//!
//! SAFECOOKIE proves to the daemon that the controller can read the
//! 32-byte cookie file without ever sending the cookie itself, and proves
//! to the controller that the daemon knows the cookie too:
//!
//! ```text
//! controller                                 tor
//!     │  AUTHCHALLENGE SAFECOOKIE hex(client_nonce)  │
//!     │─────────────────────────────────────────────▶│
//!     │  250 AUTHCHALLENGE SERVERHASH=… SERVERNONCE=…│
//!     │◀─────────────────────────────────────────────│
//!     │  verify SERVERHASH (constant time)           │
//!     │  AUTHENTICATE hex(client_hash)               │
//!     │─────────────────────────────────────────────▶│
//! ```
//!
//! Both hashes are HMAC-SHA256 over `cookie ‖ client_nonce ‖
//! server_nonce`; only the fixed key string differs per direction.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::protocol::parse_reply_fields;
use crate::socket::ControlSocket;
use crate::{secure_compare, AuthError, Error};

/// HMAC key for the server-to-controller hash in SAFECOOKIE.
const SAFECOOKIE_SERVER_KEY: &[u8] = b"Tor safe cookie authentication server-to-controller hash";

/// HMAC key for the controller-to-server hash in SAFECOOKIE.
const SAFECOOKIE_CONTROLLER_KEY: &[u8] =
    b"Tor safe cookie authentication controller-to-server hash";

/// Length of the nonces exchanged during SAFECOOKIE.
const NONCE_LEN: usize = 32;

/// Length of the daemon's authentication cookie.
const COOKIE_LEN: usize = 32;

/// The PROTOCOLINFO version this controller speaks.
pub const PROTOCOL_INFO_VERSION: u32 = 1;

const AUTH_SAFECOOKIE: &str = "SAFECOOKIE";
const AUTH_HASHED_PASSWORD: &str = "HASHEDPASSWORD";
const AUTH_NULL: &str = "NULL";

type HmacSha256 = Hmac<Sha256>;

/// The parsed parameters of a PROTOCOLINFO reply.
///
/// A thin wrapper over the reply's `KEY=VALUE` map with accessors for the
/// fields authentication cares about.
#[derive(Debug, Clone)]
pub struct ProtocolInfo(HashMap<String, String>);

impl ProtocolInfo {
    /// The Tor version reported by the daemon, quotes stripped.
    pub fn version(&self) -> String {
        self.0
            .get("Tor")
            .map(|v| v.trim_matches('"').to_string())
            .unwrap_or_default()
    }

    /// Whether the daemon advertises the given authentication method.
    pub fn supports_auth_method(&self, method: &str) -> bool {
        self.0
            .get("METHODS")
            .map(|methods| methods.contains(method))
            .unwrap_or(false)
    }

    /// The advertised cookie file path, quotes stripped.
    pub fn cookie_file(&self) -> Option<String> {
        self.0
            .get("COOKIEFILE")
            .map(|path| path.trim_matches('"').to_string())
    }

    /// Raw access to a reply parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// Queries the daemon for its PROTOCOLINFO.
pub async fn get_protocol_info(socket: &mut ControlSocket) -> Result<ProtocolInfo, Error> {
    let reply = socket
        .command(&format!("PROTOCOLINFO {}", PROTOCOL_INFO_VERSION))
        .await?;
    Ok(ProtocolInfo(parse_reply_fields(&reply)))
}

/// Authenticates the connection and returns the PROTOCOLINFO reply.
///
/// The reply is returned so the caller can cache the daemon version for
/// later feature gating without a second round trip.
pub async fn authenticate(
    socket: &mut ControlSocket,
    password: Option<&str>,
) -> Result<ProtocolInfo, Error> {
    let info = get_protocol_info(socket).await?;
    debug!(version = %info.version(), "received protocol info");

    match password {
        Some(password) => {
            if !info.supports_auth_method(AUTH_HASHED_PASSWORD) {
                return Err(AuthError::MethodNotSupported(AUTH_HASHED_PASSWORD).into());
            }
            authenticate_password(socket, password).await?;
        }

        None if info.supports_auth_method(AUTH_SAFECOOKIE) => {
            authenticate_safecookie(socket, &info).await?;
        }

        None if info.supports_auth_method(AUTH_NULL) => {
            authenticate_null(socket).await?;
        }

        None => return Err(AuthError::NoSupportedAuth.into()),
    }

    Ok(info)
}

/// Authenticates with the NULL method.
async fn authenticate_null(socket: &mut ControlSocket) -> Result<(), Error> {
    debug!("authenticating via NULL");
    socket.command("AUTHENTICATE").await?;
    Ok(())
}

/// Authenticates with the HASHEDPASSWORD method.
async fn authenticate_password(socket: &mut ControlSocket, password: &str) -> Result<(), Error> {
    debug!("authenticating via HASHEDPASSWORD");
    socket
        .command(&format!("AUTHENTICATE \"{}\"", password))
        .await?;
    Ok(())
}

/// Runs the two-round SAFECOOKIE handshake.
async fn authenticate_safecookie(
    socket: &mut ControlSocket,
    info: &ProtocolInfo,
) -> Result<(), Error> {
    debug!("authenticating via SAFECOOKIE");

    // The cookie is read up front: once the AUTHCHALLENGE round has
    // begun there is no way to fetch it mid-handshake.
    let cookie = read_auth_cookie(info)?;

    let client_nonce = generate_nonce();
    let reply = socket
        .command(&format!(
            "AUTHCHALLENGE SAFECOOKIE {}",
            hex::encode(client_nonce)
        ))
        .await?;

    let fields = parse_reply_fields(&reply);

    let server_hash = fields
        .get("SERVERHASH")
        .ok_or_else(|| AuthError::BadServerHash("not found in reply".to_string()))?;
    let server_hash = hex::decode(server_hash)
        .map_err(|e| AuthError::BadServerHash(format!("invalid hex: {}", e)))?;
    if server_hash.len() != 32 {
        return Err(AuthError::BadServerHash(format!("invalid length {}", server_hash.len())).into());
    }

    let server_nonce = fields
        .get("SERVERNONCE")
        .ok_or_else(|| AuthError::BadServerNonce("not found in reply".to_string()))?;
    let server_nonce = hex::decode(server_nonce)
        .map_err(|e| AuthError::BadServerNonce(format!("invalid hex: {}", e)))?;
    if server_nonce.len() != NONCE_LEN {
        return Err(
            AuthError::BadServerNonce(format!("invalid length {}", server_nonce.len())).into(),
        );
    }

    // The daemon proves knowledge of the cookie first; only then do we
    // answer with the mirrored controller hash.
    let expected_hash = compute_hmac(
        SAFECOOKIE_SERVER_KEY,
        &cookie,
        &client_nonce,
        &server_nonce,
    );
    if !secure_compare(&expected_hash, &server_hash) {
        return Err(AuthError::BadServerHash("verification failed".to_string()).into());
    }

    let client_hash = compute_hmac(
        SAFECOOKIE_CONTROLLER_KEY,
        &cookie,
        &client_nonce,
        &server_nonce,
    );
    socket
        .command(&format!("AUTHENTICATE {}", hex::encode(client_hash)))
        .await?;

    Ok(())
}

/// Reads and validates the daemon's authentication cookie.
fn read_auth_cookie(info: &ProtocolInfo) -> Result<Vec<u8>, AuthError> {
    let path = info
        .cookie_file()
        .ok_or_else(|| AuthError::BadCookie("COOKIEFILE not found in PROTOCOLINFO reply".into()))?;

    let cookie = std::fs::read(&path)
        .map_err(|e| AuthError::BadCookie(format!("{}: {}", path, e)))?;

    if cookie.len() != COOKIE_LEN {
        return Err(AuthError::BadCookie(format!(
            "invalid cookie length {}",
            cookie.len()
        )));
    }

    Ok(cookie)
}

/// Generates a cryptographically random SAFECOOKIE nonce.
fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    getrandom::fill(&mut nonce).expect("failed to generate random nonce");
    nonce
}

/// HMAC-SHA256 over `cookie ‖ client_nonce ‖ server_nonce`.
fn compute_hmac(key: &[u8], cookie: &[u8], client_nonce: &[u8], server_nonce: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key size");
    mac.update(cookie);
    mac.update(client_nonce);
    mac.update(server_nonce);
    mac.finalize().into_bytes().to_vec()
}
