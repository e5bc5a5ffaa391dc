//! Admission-controller scenario tests.

use std::collections::HashMap;

use lnlink::access::{
    AccessConfig, AccessError, AccessManager, ChanCount, PeerAccessStatus,
};
use lnlink::wire::NodeId;

fn node_id(byte: u8) -> NodeId {
    let mut bytes = [0x02u8; 33];
    bytes[1] = byte;
    NodeId::from_bytes(bytes).unwrap()
}

fn manager(max_slots: u64, seeds: Vec<(NodeId, ChanCount)>) -> AccessManager {
    let counts: HashMap<NodeId, ChanCount> = seeds.into_iter().collect();
    AccessManager::new(AccessConfig {
        max_restricted_slots: max_slots,
        init_access_perms: Box::new(move || counts.clone()),
        should_disconnect: Box::new(|_| false),
    })
}

#[test]
fn test_slot_capacity_scenario() {
    // One restricted slot. A has an open channel, B has open + pending,
    // C has pending only; D and E are strangers.
    let a = node_id(1);
    let b = node_id(2);
    let c = node_id(3);
    let d = node_id(4);
    let e = node_id(5);

    let manager = manager(
        1,
        vec![
            (
                a,
                ChanCount {
                    has_open_or_closed_chan: true,
                    pending_open_count: 0,
                },
            ),
            (
                b,
                ChanCount {
                    has_open_or_closed_chan: true,
                    pending_open_count: 1,
                },
            ),
            (
                c,
                ChanCount {
                    has_open_or_closed_chan: false,
                    pending_open_count: 1,
                },
            ),
        ],
    );

    // D takes the only restricted slot.
    assert_eq!(manager.on_inbound(&d).unwrap(), PeerAccessStatus::Restricted);
    assert_eq!(manager.num_restricted(), 1);

    // Peers with chain presence bypass the pool entirely.
    assert_eq!(manager.on_inbound(&a).unwrap(), PeerAccessStatus::Protected);
    assert_eq!(manager.on_inbound(&b).unwrap(), PeerAccessStatus::Protected);
    assert_eq!(manager.on_inbound(&c).unwrap(), PeerAccessStatus::Temporary);
    assert_eq!(manager.num_restricted(), 1);

    // The pool is full for the next stranger.
    assert_eq!(
        manager.on_inbound(&e),
        Err(AccessError::NoMoreRestrictedSlots)
    );
}

#[test]
fn test_promotion_frees_slot_scenario() {
    // Continues the capacity scenario: a pending open on D frees the
    // slot, after which E is admitted.
    let d = node_id(4);
    let e = node_id(5);

    let manager = manager(1, vec![]);
    assert_eq!(manager.on_inbound(&d).unwrap(), PeerAccessStatus::Restricted);
    assert_eq!(
        manager.on_inbound(&e),
        Err(AccessError::NoMoreRestrictedSlots)
    );

    manager.on_pending_open(&d).unwrap();
    assert_eq!(manager.peer_status(&d), Some(PeerAccessStatus::Temporary));
    assert_eq!(manager.num_restricted(), 0);

    assert_eq!(manager.on_inbound(&e).unwrap(), PeerAccessStatus::Restricted);
    assert_eq!(manager.num_restricted(), 1);
}

#[test]
fn test_full_lifecycle_ladder() {
    let peer = node_id(9);
    let manager = manager(2, vec![]);

    assert_eq!(
        manager.on_inbound(&peer).unwrap(),
        PeerAccessStatus::Restricted
    );
    manager.on_pending_open(&peer).unwrap();
    assert_eq!(manager.peer_status(&peer), Some(PeerAccessStatus::Temporary));
    manager.on_confirmed_open(&peer).unwrap();
    assert_eq!(manager.peer_status(&peer), Some(PeerAccessStatus::Protected));

    // A closing channel does not demote a peer with confirmed history.
    manager.on_pending_close(&peer).unwrap();
    assert_eq!(manager.peer_status(&peer), Some(PeerAccessStatus::Protected));
}

#[test]
fn test_notifications_replay_safely() {
    let peer = node_id(10);
    let manager = manager(2, vec![]);

    manager.on_inbound(&peer).unwrap();

    // Replayed and reordered notifications must not corrupt the count.
    manager.on_pending_open(&peer).unwrap();
    manager.on_pending_open(&peer).unwrap();
    manager.on_confirmed_open(&peer).unwrap();
    manager.on_confirmed_open(&peer).unwrap();
    assert_eq!(manager.peer_status(&peer), Some(PeerAccessStatus::Protected));
    assert_eq!(manager.num_restricted(), 0);

    // Out-of-order confirmation for a restricted peer promotes it
    // directly.
    let other = node_id(11);
    manager.on_inbound(&other).unwrap();
    assert_eq!(manager.num_restricted(), 1);
    manager.on_confirmed_open(&other).unwrap();
    assert_eq!(
        manager.peer_status(&other),
        Some(PeerAccessStatus::Protected)
    );
    assert_eq!(manager.num_restricted(), 0);
}

#[test]
fn test_protected_peer_never_counts_against_slots() {
    let protected = node_id(1);
    let manager = manager(
        0,
        vec![(
            protected,
            ChanCount {
                has_open_or_closed_chan: true,
                pending_open_count: 0,
            },
        )],
    );

    // Zero slots, yet the protected peer connects freely.
    assert_eq!(
        manager.on_inbound(&protected).unwrap(),
        PeerAccessStatus::Protected
    );
    assert_eq!(manager.num_restricted(), 0);
}

#[test]
fn test_gossip_ban_applies_only_to_strangers() {
    let stranger = node_id(1);
    let friend = node_id(2);

    let counts: HashMap<NodeId, ChanCount> = [(
        friend,
        ChanCount {
            has_open_or_closed_chan: true,
            pending_open_count: 0,
        },
    )]
    .into_iter()
    .collect();

    let manager = AccessManager::new(AccessConfig {
        max_restricted_slots: 5,
        init_access_perms: Box::new(move || counts.clone()),
        should_disconnect: Box::new(|_| true),
    });

    assert_eq!(manager.on_inbound(&stranger), Err(AccessError::GossiperBan));
    assert_eq!(
        manager.on_inbound(&friend).unwrap(),
        PeerAccessStatus::Protected
    );
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    const MAX_SLOTS: u64 = 3;
    const NUM_PEERS: usize = 24;

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Inbound,
        PendingOpen,
        ConfirmedOpen,
        PendingClose,
        Remove,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Inbound),
            Just(Op::PendingOpen),
            Just(Op::ConfirmedOpen),
            Just(Op::PendingClose),
            Just(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        // Whatever the interleaving of admissions, lifecycle
        // notifications, and disconnects, the restricted-slot counter
        // never exceeds its bound and never drifts from the per-peer
        // tiers it counts.
        #[test]
        fn prop_restricted_bound_under_any_op_sequence(
            ops in proptest::collection::vec((0..NUM_PEERS, op_strategy()), 1..400)
        ) {
            let manager = manager(MAX_SLOTS, vec![]);
            let peers: Vec<NodeId> = (0..NUM_PEERS).map(|i| node_id(i as u8)).collect();

            for (peer_index, op) in ops {
                let peer = &peers[peer_index];
                match op {
                    Op::Inbound => {
                        let _ = manager.on_inbound(peer);
                    }
                    Op::PendingOpen => manager.on_pending_open(peer).unwrap(),
                    Op::ConfirmedOpen => manager.on_confirmed_open(peer).unwrap(),
                    Op::PendingClose => {
                        let _ = manager.on_pending_close(peer);
                    }
                    Op::Remove => manager.remove_peer(peer),
                }

                let restricted = peers
                    .iter()
                    .filter(|p| manager.peer_status(p) == Some(PeerAccessStatus::Restricted))
                    .count() as u64;

                prop_assert!(
                    manager.num_restricted() <= MAX_SLOTS,
                    "slot bound violated: {}",
                    manager.num_restricted()
                );
                prop_assert_eq!(
                    restricted,
                    manager.num_restricted(),
                    "counter drifted from per-peer tiers"
                );
            }
        }

        // A peer with confirmed channel history never occupies a slot,
        // whatever its pending-open tally.
        #[test]
        fn prop_chain_presence_bypasses_slots(
            pending_open_count in 0u32..5,
            max_slots in 0u64..3,
        ) {
            let peer = node_id(1);
            let manager = manager(
                max_slots,
                vec![(
                    peer,
                    ChanCount {
                        has_open_or_closed_chan: true,
                        pending_open_count,
                    },
                )],
            );

            prop_assert_eq!(
                manager.on_inbound(&peer).unwrap(),
                PeerAccessStatus::Protected
            );
            prop_assert_eq!(manager.num_restricted(), 0);
        }
    }
}
