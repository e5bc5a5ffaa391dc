//! Lifecycle management for the node's Tor onion service.
//!
//! [`TorController`] owns one authenticated control-port connection and
//! the single ephemeral onion service the node advertises on it. Onion
//! services created over a control connection die with that connection,
//! which shapes the whole API: [`TorController::reconnect`] forgets the
//! active service, and [`TorController::stop`] tears it down explicitly.
//!
//! # Lifecycle
//!
//! | State   | `start()`  | `stop()`  | command       | `reconnect()` |
//! |---------|------------|-----------|---------------|---------------|
//! | Fresh   | → Running  | no-op     | `NotStarted`  | `NotStarted`  |
//! | Running | no-op      | → Stopped | ok            | → Running     |
//! | Stopped | no-op      | no-op     | `Stopped`     | `Stopped`     |
//!
//! The started/stopped flags are atomics flipped with compare-and-swap,
//! so concurrent `start()` or `stop()` calls collapse to one transition.
//!
//! # Example
//!
//! ```rust,no_run
//! use lnlink::controller::{AddOnionConfig, OnionKey, TorConfig, TorController};
//!
//! # async fn example() -> Result<(), lnlink::Error> {
//! let controller = TorController::new(TorConfig {
//!     control_addr: "127.0.0.1:9051".to_string(),
//!     target_ip: "127.0.0.1".to_string(),
//!     password: None,
//! });
//!
//! controller.start().await?;
//! let service = controller
//!     .add_onion(AddOnionConfig {
//!         virtual_port: 9735,
//!         target_ports: vec![9735],
//!         key: OnionKey::New,
//!     })
//!     .await?;
//! println!("listening on {}.onion:9735", service.service_id);
//!
//! controller.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::auth::authenticate;
use crate::protocol::parse_reply_fields;
use crate::socket::ControlSocket;
use crate::version::check_supports_v3;
use crate::Error;

/// Configuration for [`TorController`].
#[derive(Debug, Clone)]
pub struct TorConfig {
    /// `host:port` the Tor daemon listens on for control connections.
    pub control_addr: String,

    /// The IP address the onion service forwards inbound connections to.
    /// Required when the Tor daemon runs on another host; with the
    /// daemon co-located this is the loopback address.
    pub target_ip: String,

    /// When set, authenticate with HASHEDPASSWORD using this value.
    pub password: Option<String>,
}

/// The key material to create an onion service with.
#[derive(Debug, Clone)]
pub enum OnionKey {
    /// Have the daemon generate a fresh ED25519-V3 key pair.
    New,
    /// Reuse a previously generated key blob (the `PrivateKey` value of
    /// an earlier ADD_ONION reply, without its `ED25519-V3:` prefix).
    Private(String),
}

/// Parameters for [`TorController::add_onion`].
#[derive(Debug, Clone)]
pub struct AddOnionConfig {
    /// The port the service is reachable on from the Tor network.
    pub virtual_port: u16,

    /// Local ports inbound connections are forwarded to. When empty, the
    /// virtual port doubles as the target port.
    pub target_ports: Vec<u16>,

    /// Key material for the service.
    pub key: OnionKey,
}

/// An onion service created through [`TorController::add_onion`].
#[derive(Debug, Clone)]
pub struct OnionService {
    /// The service id, without the `.onion` suffix.
    pub service_id: String,

    /// The daemon-generated private key blob, present when the service
    /// was created with [`OnionKey::New`].
    pub private_key: Option<String>,
}

struct Inner {
    conn: Option<ControlSocket>,
    version: String,
    active_service_id: Option<String>,
}

/// A client of the local Tor daemon's control port.
///
/// All commands are serialized on an internal mutex: a second task calling
/// into the controller blocks at command entry until the previous
/// request/reply exchange has fully completed, so replies can never be
/// attributed to the wrong command.
pub struct TorController {
    started: AtomicBool,
    stopped: AtomicBool,
    config: TorConfig,
    inner: Mutex<Inner>,
}

impl TorController {
    /// Creates a controller; no connection is made until [`start`](Self::start).
    pub fn new(config: TorConfig) -> Self {
        Self {
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            config,
            inner: Mutex::new(Inner {
                conn: None,
                version: String::new(),
                active_service_id: None,
            }),
        }
    }

    /// Establishes and authenticates the control connection.
    ///
    /// Idempotent: the first caller performs the transition, every later
    /// call is a no-op returning `Ok`. A stopped controller stays
    /// stopped.
    pub async fn start(&self) -> Result<(), Error> {
        if self.stopped.load(Ordering::SeqCst) {
            return Ok(());
        }
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }

        info!("starting tor controller");

        let mut inner = self.inner.lock().await;
        let mut conn = ControlSocket::connect(&self.config.control_addr).await?;
        let info = authenticate(&mut conn, self.config.password.as_deref()).await?;

        inner.version = info.version();
        inner.conn = Some(conn);
        Ok(())
    }

    /// Removes the active onion service, if any, and closes the
    /// connection.
    ///
    /// Idempotent via the stopped flag. A DEL_ONION failure is surfaced
    /// to the caller and leaves the connection open; a retried `stop()`
    /// will not re-enter (the flag is already set), so callers treating
    /// shutdown as best-effort should log and move on.
    pub async fn stop(&self) -> Result<(), Error> {
        if self
            .stopped
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }

        info!("stopping tor controller");

        let mut inner = self.inner.lock().await;

        if let Some(service_id) = inner.active_service_id.clone() {
            if let Some(conn) = inner.conn.as_mut() {
                if let Err(e) = conn.command(&format!("DEL_ONION {}", service_id)).await {
                    debug!(error = %e, "DEL_ONION failed during stop");
                    return Err(e);
                }
            }
            inner.active_service_id = None;
        }

        // Dropping the socket closes it.
        inner.conn = None;
        Ok(())
    }

    /// Replaces the control connection and re-authenticates.
    ///
    /// Requires a running controller. The old connection is closed with
    /// errors ignored; after a daemon restart it is already dead. Any
    /// previously created onion service died with the old connection, so
    /// the active-service tracking is cleared; callers re-create their
    /// service afterwards.
    pub async fn reconnect(&self) -> Result<(), Error> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(Error::NotStarted);
        }
        if self.stopped.load(Ordering::SeqCst) {
            return Err(Error::Stopped);
        }

        info!("reconnecting tor controller");

        let mut inner = self.inner.lock().await;

        // Close errors are ignored: the daemon may have closed the
        // connection already, which is exactly why we are here.
        inner.conn = None;

        let mut conn = ControlSocket::connect(&self.config.control_addr).await?;
        let info = authenticate(&mut conn, self.config.password.as_deref()).await?;

        inner.version = info.version();
        inner.conn = Some(conn);
        inner.active_service_id = None;
        Ok(())
    }

    /// Creates an ephemeral onion service and tracks it as the active
    /// one.
    ///
    /// Gated on the daemon supporting v3 onion services (Tor 0.3.3.6+).
    /// The previous active service, if any, is replaced in the tracking
    /// but not deleted; at most one service is ever torn down on
    /// [`stop`](Self::stop).
    pub async fn add_onion(&self, config: AddOnionConfig) -> Result<OnionService, Error> {
        self.check_running()?;

        let mut inner = self.inner.lock().await;
        check_supports_v3(&inner.version)?;

        let key_spec = match &config.key {
            OnionKey::New => "NEW:ED25519-V3".to_string(),
            OnionKey::Private(blob) => format!("ED25519-V3:{}", blob),
        };

        let mut command = format!("ADD_ONION {}", key_spec);
        if config.target_ports.is_empty() {
            command.push_str(&format!(
                " Port={},{}:{}",
                config.virtual_port, self.config.target_ip, config.virtual_port
            ));
        } else {
            for target in &config.target_ports {
                command.push_str(&format!(
                    " Port={},{}:{}",
                    config.virtual_port, self.config.target_ip, target
                ));
            }
        }

        let conn = inner.conn.as_mut().ok_or(Error::NotStarted)?;
        let reply = conn.command(&command).await?;

        let fields = parse_reply_fields(&reply);
        let service_id = fields
            .get("ServiceID")
            .cloned()
            .ok_or_else(|| Error::Protocol("ServiceID not found in ADD_ONION reply".into()))?;
        let private_key = fields
            .get("PrivateKey")
            .and_then(|k| k.split_once(':'))
            .map(|(_, blob)| blob.to_string());

        info!(service_id = %service_id, "created onion service");
        inner.active_service_id = Some(service_id.clone());

        Ok(OnionService {
            service_id,
            private_key,
        })
    }

    /// Removes an onion service created on this connection.
    pub async fn del_onion(&self, service_id: &str) -> Result<(), Error> {
        self.check_running()?;

        let mut inner = self.inner.lock().await;
        let conn = inner.conn.as_mut().ok_or(Error::NotStarted)?;
        conn.command(&format!("DEL_ONION {}", service_id)).await?;

        if inner.active_service_id.as_deref() == Some(service_id) {
            inner.active_service_id = None;
        }
        Ok(())
    }

    /// The Tor version cached from authentication, empty before
    /// [`start`](Self::start).
    pub async fn version(&self) -> String {
        self.inner.lock().await.version.clone()
    }

    /// The currently tracked onion service id, if one is active.
    pub async fn active_service_id(&self) -> Option<String> {
        self.inner.lock().await.active_service_id.clone()
    }

    fn check_running(&self) -> Result<(), Error> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(Error::NotStarted);
        }
        if self.stopped.load(Ordering::SeqCst) {
            return Err(Error::Stopped);
        }
        Ok(())
    }
}
