//! Inbound peer admission control.
//!
//! Every inbound connection is classified into one of three tiers before
//! the handshake is allowed to proceed:
//!
//! - **Protected**: the peer has (or once had) a confirmed channel with
//!   us. Never subject to the slot pool or the gossip ban list.
//! - **Temporary**: the peer has a pending channel open in flight. Also
//!   bypasses the slot pool; the funding flow needs the connection.
//! - **Restricted**: no channel relationship at all. These peers compete
//!   for a fixed number of admission slots and are checked against the
//!   gossip ban list.
//!
//! Channel lifecycle notifications promote peers up the ladder
//! (Restricted → Temporary on a pending open, Temporary → Protected on
//! confirmation) and demote them back to Restricted when their last
//! channel disappears, but only if a slot is free; otherwise the caller
//! is told to disconnect them.
//!
//! Nothing here is persisted. On restart the slot count is zero and every
//! peer is re-classified from the channel-count oracle, which remains the
//! source of truth for history.
//!
//! # Concurrency
//!
//! All state, the per-peer records and the restricted-slot counter alike,
//! lives behind one mutex, taken once per public call. Calls for the same
//! peer therefore linearize, and the counter can never drift from the
//! per-peer states it counts.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

use crate::wire::NodeId;

/// Admission failures. Both mean the caller must not keep the connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The gossip layer has banned this peer.
    #[error("peer banned by gossiper")]
    GossiperBan,

    /// Every restricted slot is occupied.
    #[error("no more restricted access slots")]
    NoMoreRestrictedSlots,
}

/// A peer's admission tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerAccessStatus {
    /// Has an open or closed channel with us.
    Protected,
    /// Has a pending channel open in flight.
    Temporary,
    /// No channel relationship; occupies a restricted slot.
    Restricted,
}

/// Per-peer channel tallies, seeded from the oracle and maintained from
/// lifecycle notifications afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChanCount {
    /// Whether the peer has ever had a confirmed (open or since closed)
    /// channel with us. Never reset: closed channels keep a peer
    /// protected.
    pub has_open_or_closed_chan: bool,

    /// Number of channel opens currently pending confirmation.
    pub pending_open_count: u32,
}

/// The channel-count oracle, consulted once at construction.
pub type InitAccessPerms = Box<dyn Fn() -> HashMap<NodeId, ChanCount> + Send + Sync>;

/// The gossip-ban oracle, consulted only when a peer is about to be
/// admitted as Restricted.
pub type ShouldDisconnect = Box<dyn Fn(&NodeId) -> bool + Send + Sync>;

/// Configuration for [`AccessManager`].
pub struct AccessConfig {
    /// Upper bound on concurrently admitted Restricted peers.
    pub max_restricted_slots: u64,

    /// Seeds the per-peer channel counts at construction.
    pub init_access_perms: InitAccessPerms,

    /// Ban check for would-be Restricted peers.
    pub should_disconnect: ShouldDisconnect,
}

#[derive(Default)]
struct State {
    peer_counts: HashMap<NodeId, ChanCount>,
    peer_scores: HashMap<NodeId, PeerAccessStatus>,
    num_restricted: u64,
}

/// The admission controller.
pub struct AccessManager {
    cfg: AccessConfig,
    state: Mutex<State>,
}

impl AccessManager {
    /// Builds the manager, seeding channel counts from the oracle.
    pub fn new(cfg: AccessConfig) -> Self {
        let peer_counts = (cfg.init_access_perms)();
        debug!(peers = peer_counts.len(), "seeded access manager");
        Self {
            cfg,
            state: Mutex::new(State {
                peer_counts,
                peer_scores: HashMap::new(),
                num_restricted: 0,
            }),
        }
    }

    /// Classifies an inbound peer and records its tier.
    ///
    /// Peers with any on-chain presence (open, closed, or pending
    /// channels) bypass both the ban check and the slot pool. A would-be
    /// Restricted peer is first checked against the ban oracle
    /// ([`AccessError::GossiperBan`]) and then against the slot bound
    /// ([`AccessError::NoMoreRestrictedSlots`]); on success it occupies
    /// one slot. Re-admitting an already Restricted peer does not consume
    /// a second slot.
    pub fn on_inbound(&self, peer: &NodeId) -> Result<PeerAccessStatus, AccessError> {
        let mut state = self.state.lock().expect("access state poisoned");

        let count = state.peer_counts.get(peer).copied().unwrap_or_default();

        let status = if count.has_open_or_closed_chan {
            PeerAccessStatus::Protected
        } else if count.pending_open_count > 0 {
            PeerAccessStatus::Temporary
        } else {
            if (self.cfg.should_disconnect)(peer) {
                return Err(AccessError::GossiperBan);
            }

            let already_restricted =
                state.peer_scores.get(peer) == Some(&PeerAccessStatus::Restricted);
            if !already_restricted {
                if state.num_restricted >= self.cfg.max_restricted_slots {
                    return Err(AccessError::NoMoreRestrictedSlots);
                }
                state.num_restricted += 1;
            }
            PeerAccessStatus::Restricted
        };

        debug!(peer = %peer, ?status, "classified inbound peer");
        state.peer_scores.insert(*peer, status);
        Ok(status)
    }

    /// Notes a pending channel open with `peer`.
    ///
    /// Promotes a Restricted peer to Temporary and frees its slot.
    /// Idempotent: repeated pending opens only bump the tally, and peers
    /// already Temporary or Protected keep their tier.
    pub fn on_pending_open(&self, peer: &NodeId) -> Result<(), AccessError> {
        let mut state = self.state.lock().expect("access state poisoned");
        let state = &mut *state;

        let count = state.peer_counts.entry(*peer).or_default();
        count.pending_open_count = count.pending_open_count.saturating_add(1);

        if let Some(status) = state.peer_scores.get_mut(peer) {
            if *status == PeerAccessStatus::Restricted {
                *status = PeerAccessStatus::Temporary;
                state.num_restricted = state.num_restricted.saturating_sub(1);
                debug!(peer = %peer, "promoted restricted peer to temporary");
            }
        }
        Ok(())
    }

    /// Notes a channel with `peer` reaching confirmation.
    ///
    /// Promotes the peer to Protected. Tolerates replayed or reordered
    /// notifications: a confirmation for a still-Restricted peer promotes
    /// it directly and frees the slot.
    pub fn on_confirmed_open(&self, peer: &NodeId) -> Result<(), AccessError> {
        let mut state = self.state.lock().expect("access state poisoned");
        let state = &mut *state;

        let count = state.peer_counts.entry(*peer).or_default();
        count.has_open_or_closed_chan = true;
        count.pending_open_count = count.pending_open_count.saturating_sub(1);

        match state.peer_scores.get_mut(peer) {
            Some(status @ (PeerAccessStatus::Temporary | PeerAccessStatus::Restricted)) => {
                let was_restricted = *status == PeerAccessStatus::Restricted;
                *status = PeerAccessStatus::Protected;
                if was_restricted {
                    state.num_restricted = state.num_restricted.saturating_sub(1);
                }
                debug!(peer = %peer, "promoted peer to protected");
            }
            _ => {}
        }
        Ok(())
    }

    /// Notes a channel with `peer` heading for closure before
    /// confirmation.
    ///
    /// When this was the peer's last channel, the peer is demoted back to
    /// Restricted, provided a slot is free. With the pool full the demotion is
    /// refused with [`AccessError::NoMoreRestrictedSlots`] and the caller
    /// is expected to disconnect the peer; its recorded tier is left
    /// untouched for the teardown path to observe.
    pub fn on_pending_close(&self, peer: &NodeId) -> Result<(), AccessError> {
        let mut state = self.state.lock().expect("access state poisoned");
        let state = &mut *state;

        let count = state.peer_counts.entry(*peer).or_default();
        count.pending_open_count = count.pending_open_count.saturating_sub(1);
        let count = *count;

        if count.has_open_or_closed_chan || count.pending_open_count > 0 {
            return Ok(());
        }

        match state.peer_scores.get(peer).copied() {
            Some(PeerAccessStatus::Temporary | PeerAccessStatus::Protected) => {
                if state.num_restricted >= self.cfg.max_restricted_slots {
                    return Err(AccessError::NoMoreRestrictedSlots);
                }
                state.num_restricted += 1;
                state
                    .peer_scores
                    .insert(*peer, PeerAccessStatus::Restricted);
                debug!(peer = %peer, "demoted peer to restricted");
                Ok(())
            }
            // Already restricted, or never admitted: nothing to demote.
            _ => Ok(()),
        }
    }

    /// Forgets a disconnected peer, releasing its slot if it held one.
    pub fn remove_peer(&self, peer: &NodeId) {
        let mut state = self.state.lock().expect("access state poisoned");
        if let Some(status) = state.peer_scores.remove(peer) {
            if status == PeerAccessStatus::Restricted {
                state.num_restricted = state.num_restricted.saturating_sub(1);
            }
            debug!(peer = %peer, "removed peer access record");
        }
    }

    /// The number of currently admitted Restricted peers.
    pub fn num_restricted(&self) -> u64 {
        self.state.lock().expect("access state poisoned").num_restricted
    }

    /// The recorded tier for `peer`, if it has been admitted.
    pub fn peer_status(&self, peer: &NodeId) -> Option<PeerAccessStatus> {
        self.state
            .lock()
            .expect("access state poisoned")
            .peer_scores
            .get(peer)
            .copied()
    }

    /// The tracked channel counts for `peer`.
    pub fn peer_counts(&self, peer: &NodeId) -> Option<ChanCount> {
        self.state
            .lock()
            .expect("access state poisoned")
            .peer_counts
            .get(peer)
            .copied()
    }
}
