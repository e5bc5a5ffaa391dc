//! Wire-codec scenario tests and round-trip properties.
//!
//! Every registered message type gets a `proptest` strategy over its
//! value space; each sample must serialize within the body limit, decode
//! back to an equal value, and re-encode to identical bytes.

use std::net::{Ipv4Addr, SocketAddrV4};

use lnlink::wire::{
    read_message, write_message, ChannelId, CustomMessage, CustomRecords, ExtraOpaqueData,
    FundingCreated, Message, MessageType, NetAddress, NodeAlias, NodeAnnouncement, OnionAddr,
    OpaqueAddrs, OutPoint, PublicKey, RawFeatureVector, Shutdown, Signature, UpdateFulfillHtlc,
    WireError, CUSTOM_TYPE_START, MAX_MSG_BODY,
};

#[test]
fn test_outpoint_overflow_scenario() {
    let mut msg = FundingCreated {
        pending_channel_id: [0; 32],
        funding_point: OutPoint {
            txid: [0; 32],
            index: 0xFFFF_FFFF,
        },
        commit_sig: Signature::default(),
        extra_data: ExtraOpaqueData::new(),
    };

    assert!(matches!(
        write_message(&mut Vec::new(), &Message::FundingCreated(msg.clone()), 0),
        Err(WireError::IndexOverflow(0xFFFF_FFFF))
    ));

    // The maximum representable index encodes to 0xFF 0xFF.
    msg.funding_point.index = 0xFFFF;
    let mut buf = Vec::new();
    write_message(&mut buf, &Message::FundingCreated(msg), 0).unwrap();
    // type(2) + pending id(32) + txid(32), then the index bytes.
    assert_eq!(&buf[66..68], &[0xFF, 0xFF]);
}

#[test]
fn test_address_list_scenario() {
    let msg = NodeAnnouncement {
        signature: Signature::default(),
        features: RawFeatureVector::new(),
        timestamp: 0,
        node_id: PublicKey::default(),
        rgb_color: [0; 3],
        alias: NodeAlias::default(),
        addresses: vec![
            NetAddress::Ipv4(SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 8080)),
            NetAddress::OnionV2(OnionAddr {
                service: "abcdefghijklmnop.onion".to_string(),
                port: 9065,
            }),
            NetAddress::Opaque(OpaqueAddrs {
                payload: vec![0xff, 0x01, 0x02],
            }),
        ],
        extra_data: ExtraOpaqueData::new(),
    };

    let mut buf = Vec::new();
    write_message(&mut buf, &Message::NodeAnnouncement(msg.clone()), 0).unwrap();

    match read_message(&mut buf.as_slice(), 0).unwrap() {
        Message::NodeAnnouncement(decoded) => {
            assert_eq!(decoded.addresses.len(), 3);
            assert_eq!(decoded.addresses[0].to_string(), "127.0.0.1:8080");
            assert_eq!(
                decoded.addresses[1].to_string(),
                "abcdefghijklmnop.onion:9065"
            );
            assert_eq!(decoded.addresses[2].to_string(), "ff0102");
            assert_eq!(decoded, msg);
        }
        other => panic!("expected node announcement, got {}", other.msg_type()),
    }
}

#[test]
fn test_absent_and_empty_custom_records_equal() {
    let absent = UpdateFulfillHtlc {
        channel_id: ChannelId([1; 32]),
        id: 1,
        payment_preimage: [2; 32],
        custom_records: CustomRecords::new(),
        extra_data: ExtraOpaqueData::new(),
    };

    let mut buf = Vec::new();
    write_message(&mut buf, &Message::UpdateFulfillHtlc(absent.clone()), 0).unwrap();
    let decoded = read_message(&mut buf.as_slice(), 0).unwrap();
    assert_eq!(decoded, Message::UpdateFulfillHtlc(absent));
}

#[test]
fn test_oversize_body_is_an_error_not_a_truncated_frame() {
    let msg = Message::Custom(CustomMessage {
        msg_type: MessageType(CUSTOM_TYPE_START),
        data: vec![0; MAX_MSG_BODY + 1],
    });

    let mut buf = Vec::new();
    match write_message(&mut buf, &msg, 0) {
        Err(WireError::BodyTooLarge(len)) => assert_eq!(len, MAX_MSG_BODY + 1),
        other => panic!("expected BodyTooLarge, got {:?}", other),
    }
    // Nothing was written: no truncated frame on the wire.
    assert!(buf.is_empty());
}

#[test]
fn test_unknown_tlv_trailer_preserved_verbatim() {
    // Two unknown records; both must come back byte-for-byte.
    let trailer = vec![
        0x20, 0x02, 0xaa, 0xbb, // type 32, length 2
        0xfd, 0x01, 0x00, 0x01, 0xcc, // type 256, length 1
    ];
    let msg = Message::Shutdown(Shutdown {
        channel_id: ChannelId([9; 32]),
        shutdown_script: vec![0x51],
        extra_data: ExtraOpaqueData(trailer.clone()),
    });

    let mut buf = Vec::new();
    write_message(&mut buf, &msg, 0).unwrap();
    match read_message(&mut buf.as_slice(), 0).unwrap() {
        Message::Shutdown(decoded) => assert_eq!(decoded.extra_data.0, trailer),
        other => panic!("expected shutdown, got {}", other.msg_type()),
    }
}

#[test]
fn test_wire_module_example_compiles_against_api() {
    // The registry and framing compose: build an empty message from a
    // tag and push it through the framing layer.
    let empty = Message::empty(MessageType::PING).unwrap();
    let mut buf = Vec::new();
    write_message(&mut buf, &empty, 0).unwrap();
    assert_eq!(read_message(&mut buf.as_slice(), 0).unwrap(), empty);
}

mod proptests {
    use std::net::{Ipv6Addr, SocketAddrV6};

    use lnlink::wire::address::{decode_address_list, encode_address_list};
    use lnlink::wire::htlc::ONION_PACKET_SIZE;
    use lnlink::wire::{
        AcceptChannel, AnnounceSignatures, ChannelAnnouncement, ChannelReady, ChannelReestablish,
        ChannelTlvs, ChannelUpdate, ClosingSigned, CommitSig, ErrorMessage, FundingSigned,
        GossipTimestampRange, Init, OpenChannel, Ping, Pong, QueryChannelRange, QueryShortChanIds,
        ReplyChannelRange, ReplyShortChanIdsEnd, RevokeAndAck, ShortChannelId, Stfu,
        UpdateAddHtlc, UpdateFailHtlc, UpdateFailMalformedHtlc, UpdateFee, Warning,
        MIN_CUSTOM_RECORDS_TLV_TYPE,
    };
    use proptest::prelude::*;
    use proptest::strategy::Union;

    use super::*;

    fn bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
        proptest::collection::vec(any::<u8>(), 0..max_len)
    }

    fn array32() -> impl Strategy<Value = [u8; 32]> {
        proptest::collection::vec(any::<u8>(), 32).prop_map(|v| v.try_into().unwrap())
    }

    fn pubkey_strategy() -> impl Strategy<Value = PublicKey> {
        (array32(), any::<bool>()).prop_map(|(body, odd)| {
            let mut key = [0u8; 33];
            key[0] = if odd { 0x03 } else { 0x02 };
            key[1..].copy_from_slice(&body);
            PublicKey::from_bytes(key).expect("prefix is valid")
        })
    }

    fn sig_strategy() -> impl Strategy<Value = Signature> {
        proptest::collection::vec(any::<u8>(), 64)
            .prop_map(|v| Signature::from_bytes(v.try_into().unwrap()))
    }

    fn chan_id_strategy() -> impl Strategy<Value = ChannelId> {
        array32().prop_map(ChannelId)
    }

    fn scid_strategy() -> impl Strategy<Value = ShortChannelId> {
        any::<u64>().prop_map(ShortChannelId::from_u64)
    }

    fn features_strategy() -> impl Strategy<Value = RawFeatureVector> {
        proptest::collection::vec(0u16..512, 0..24).prop_map(|set_bits| {
            let mut features = RawFeatureVector::new();
            for bit in set_bits {
                features.set(bit);
            }
            features
        })
    }

    /// Half the samples carry an unknown TLV record, like the reference
    /// test vectors do.
    fn extra_data_strategy() -> impl Strategy<Value = ExtraOpaqueData> {
        prop_oneof![
            Just(ExtraOpaqueData::new()),
            Just(ExtraOpaqueData(vec![0xfd, 0x00, 0xff, 0x00])),
        ]
    }

    fn custom_records_strategy() -> impl Strategy<Value = CustomRecords> {
        proptest::collection::btree_map(
            MIN_CUSTOM_RECORDS_TLV_TYPE..MIN_CUSTOM_RECORDS_TLV_TYPE + 100,
            bytes(10),
            0..5,
        )
        .prop_map(CustomRecords)
    }

    fn onion_strategy(id_chars: usize) -> impl Strategy<Value = OnionAddr> {
        (
            proptest::collection::vec(
                proptest::sample::select(b"abcdefghijklmnopqrstuvwxyz234567".to_vec()),
                id_chars,
            ),
            any::<u16>(),
        )
            .prop_map(|(id, port)| OnionAddr {
                service: String::from_utf8(id).unwrap() + ".onion",
                port,
            })
    }

    fn addrs_strategy() -> impl Strategy<Value = Vec<NetAddress>> {
        (
            (any::<u32>(), any::<u16>()),
            (any::<u128>(), any::<u16>()),
            onion_strategy(16),
            onion_strategy(56),
            proptest::option::of(bytes(32)),
        )
            .prop_map(|((v4, p4), (v6, p6), onion_v2, onion_v3, opaque)| {
                let mut addrs = vec![
                    NetAddress::Ipv4(SocketAddrV4::new(Ipv4Addr::from(v4), p4)),
                    NetAddress::Ipv6(SocketAddrV6::new(Ipv6Addr::from(v6), p6, 0, 0)),
                    NetAddress::OnionV2(onion_v2),
                    NetAddress::OnionV3(onion_v3),
                ];
                // An opaque address hides everything after it, so it
                // must come last to round-trip structurally.
                if let Some(tail) = opaque {
                    let mut payload = vec![0xff];
                    payload.extend(tail);
                    addrs.push(NetAddress::Opaque(OpaqueAddrs { payload }));
                }
                addrs
            })
    }

    fn channel_tlvs_strategy() -> impl Strategy<Value = ChannelTlvs> {
        prop_oneof![
            Just(ChannelTlvs::default()),
            (
                proptest::collection::vec(any::<u8>(), 1..35),
                features_strategy(),
                any::<u32>(),
            )
                .prop_map(|(script, channel_type, lease_expiry)| ChannelTlvs {
                    upfront_shutdown_script: script,
                    channel_type: Some(channel_type),
                    lease_expiry: Some(lease_expiry),
                }),
        ]
    }

    fn warning_strategy() -> impl Strategy<Value = Message> {
        (chan_id_strategy(), bytes(64)).prop_map(|(channel_id, data)| {
            Message::Warning(Warning { channel_id, data })
        })
    }

    fn stfu_strategy() -> impl Strategy<Value = Message> {
        (chan_id_strategy(), any::<bool>(), extra_data_strategy()).prop_map(
            |(channel_id, initiator, extra_data)| {
                Message::Stfu(Stfu {
                    channel_id,
                    initiator,
                    extra_data,
                })
            },
        )
    }

    fn init_strategy() -> impl Strategy<Value = Message> {
        (features_strategy(), features_strategy(), extra_data_strategy()).prop_map(
            |(global_features, features, extra_data)| {
                Message::Init(Init {
                    global_features,
                    features,
                    extra_data,
                })
            },
        )
    }

    fn error_strategy() -> impl Strategy<Value = Message> {
        (chan_id_strategy(), bytes(64)).prop_map(|(channel_id, data)| {
            Message::Error(ErrorMessage { channel_id, data })
        })
    }

    fn ping_strategy() -> impl Strategy<Value = Message> {
        (any::<u16>(), bytes(1000)).prop_map(|(num_pong_bytes, padding_bytes)| {
            Message::Ping(Ping {
                num_pong_bytes,
                padding_bytes,
            })
        })
    }

    fn pong_strategy() -> impl Strategy<Value = Message> {
        bytes(1000).prop_map(|pong_bytes| Message::Pong(Pong { pong_bytes }))
    }

    fn open_channel_strategy() -> impl Strategy<Value = Message> {
        (
            (array32(), array32()),
            (
                any::<u64>(),
                any::<u64>(),
                any::<u64>(),
                any::<u64>(),
                any::<u64>(),
                any::<u64>(),
            ),
            (any::<u32>(), any::<u16>(), any::<u16>(), any::<u8>()),
            (
                pubkey_strategy(),
                pubkey_strategy(),
                pubkey_strategy(),
                pubkey_strategy(),
                pubkey_strategy(),
                pubkey_strategy(),
            ),
            channel_tlvs_strategy(),
            extra_data_strategy(),
        )
            .prop_map(
                |(
                    (chain_hash, pending_channel_id),
                    (funding, push, dust, max_in_flight, reserve, htlc_min),
                    (fee_per_kw, csv_delay, max_accepted_htlcs, channel_flags),
                    (k1, k2, k3, k4, k5, k6),
                    tlvs,
                    extra_data,
                )| {
                    Message::OpenChannel(OpenChannel {
                        chain_hash,
                        pending_channel_id,
                        funding_satoshis: funding,
                        push_msat: push,
                        dust_limit_satoshis: dust,
                        max_value_in_flight_msat: max_in_flight,
                        channel_reserve_satoshis: reserve,
                        htlc_minimum_msat: htlc_min,
                        fee_per_kw,
                        csv_delay,
                        max_accepted_htlcs,
                        funding_pubkey: k1,
                        revocation_basepoint: k2,
                        payment_basepoint: k3,
                        delayed_payment_basepoint: k4,
                        htlc_basepoint: k5,
                        first_per_commitment_point: k6,
                        channel_flags,
                        tlvs,
                        extra_data,
                    })
                },
            )
    }

    fn accept_channel_strategy() -> impl Strategy<Value = Message> {
        (
            array32(),
            (
                any::<u64>(),
                any::<u64>(),
                any::<u64>(),
                any::<u64>(),
                any::<u32>(),
            ),
            (any::<u16>(), any::<u16>()),
            (
                pubkey_strategy(),
                pubkey_strategy(),
                pubkey_strategy(),
                pubkey_strategy(),
                pubkey_strategy(),
                pubkey_strategy(),
            ),
            channel_tlvs_strategy(),
            extra_data_strategy(),
        )
            .prop_map(
                |(
                    pending_channel_id,
                    (dust, max_in_flight, reserve, htlc_min, min_depth),
                    (csv_delay, max_accepted_htlcs),
                    (k1, k2, k3, k4, k5, k6),
                    tlvs,
                    extra_data,
                )| {
                    Message::AcceptChannel(AcceptChannel {
                        pending_channel_id,
                        dust_limit_satoshis: dust,
                        max_value_in_flight_msat: max_in_flight,
                        channel_reserve_satoshis: reserve,
                        htlc_minimum_msat: htlc_min,
                        min_accept_depth: min_depth,
                        csv_delay,
                        max_accepted_htlcs,
                        funding_pubkey: k1,
                        revocation_basepoint: k2,
                        payment_basepoint: k3,
                        delayed_payment_basepoint: k4,
                        htlc_basepoint: k5,
                        first_per_commitment_point: k6,
                        tlvs,
                        extra_data,
                    })
                },
            )
    }

    fn funding_created_strategy() -> impl Strategy<Value = Message> {
        (
            array32(),
            array32(),
            any::<u16>(),
            sig_strategy(),
            extra_data_strategy(),
        )
            .prop_map(|(pending_channel_id, txid, index, commit_sig, extra_data)| {
                Message::FundingCreated(FundingCreated {
                    pending_channel_id,
                    funding_point: OutPoint {
                        txid,
                        index: index as u32,
                    },
                    commit_sig,
                    extra_data,
                })
            })
    }

    fn funding_signed_strategy() -> impl Strategy<Value = Message> {
        (chan_id_strategy(), sig_strategy(), extra_data_strategy()).prop_map(
            |(channel_id, commit_sig, extra_data)| {
                Message::FundingSigned(FundingSigned {
                    channel_id,
                    commit_sig,
                    extra_data,
                })
            },
        )
    }

    fn channel_ready_strategy() -> impl Strategy<Value = Message> {
        (
            chan_id_strategy(),
            pubkey_strategy(),
            proptest::option::of(scid_strategy()),
            extra_data_strategy(),
        )
            .prop_map(
                |(channel_id, next_per_commitment_point, alias_scid, extra_data)| {
                    Message::ChannelReady(ChannelReady {
                        channel_id,
                        next_per_commitment_point,
                        alias_scid,
                        extra_data,
                    })
                },
            )
    }

    fn shutdown_strategy() -> impl Strategy<Value = Message> {
        (
            chan_id_strategy(),
            proptest::collection::vec(any::<u8>(), 1..35),
            extra_data_strategy(),
        )
            .prop_map(|(channel_id, shutdown_script, extra_data)| {
                Message::Shutdown(Shutdown {
                    channel_id,
                    shutdown_script,
                    extra_data,
                })
            })
    }

    fn closing_signed_strategy() -> impl Strategy<Value = Message> {
        (
            chan_id_strategy(),
            any::<u64>(),
            sig_strategy(),
            extra_data_strategy(),
        )
            .prop_map(|(channel_id, fee_satoshis, signature, extra_data)| {
                Message::ClosingSigned(ClosingSigned {
                    channel_id,
                    fee_satoshis,
                    signature,
                    extra_data,
                })
            })
    }

    fn update_add_htlc_strategy() -> impl Strategy<Value = Message> {
        (
            (chan_id_strategy(), any::<u64>(), any::<u64>()),
            (array32(), any::<u32>()),
            proptest::collection::vec(any::<u8>(), ONION_PACKET_SIZE),
            proptest::option::of(pubkey_strategy()),
            custom_records_strategy(),
            extra_data_strategy(),
        )
            .prop_map(
                |(
                    (channel_id, id, amount_msat),
                    (payment_hash, expiry),
                    onion,
                    blinding_point,
                    custom_records,
                    extra_data,
                )| {
                    let onion_blob: [u8; ONION_PACKET_SIZE] = onion.try_into().unwrap();
                    Message::UpdateAddHtlc(UpdateAddHtlc {
                        channel_id,
                        id,
                        amount_msat,
                        payment_hash,
                        expiry,
                        onion_blob: Box::new(onion_blob),
                        blinding_point,
                        custom_records,
                        extra_data,
                    })
                },
            )
    }

    fn update_fulfill_htlc_strategy() -> impl Strategy<Value = Message> {
        (
            chan_id_strategy(),
            any::<u64>(),
            array32(),
            custom_records_strategy(),
            extra_data_strategy(),
        )
            .prop_map(
                |(channel_id, id, payment_preimage, custom_records, extra_data)| {
                    Message::UpdateFulfillHtlc(UpdateFulfillHtlc {
                        channel_id,
                        id,
                        payment_preimage,
                        custom_records,
                        extra_data,
                    })
                },
            )
    }

    fn update_fail_htlc_strategy() -> impl Strategy<Value = Message> {
        (
            chan_id_strategy(),
            any::<u64>(),
            bytes(292),
            extra_data_strategy(),
        )
            .prop_map(|(channel_id, id, reason, extra_data)| {
                Message::UpdateFailHtlc(UpdateFailHtlc {
                    channel_id,
                    id,
                    reason,
                    extra_data,
                })
            })
    }

    fn update_fail_malformed_strategy() -> impl Strategy<Value = Message> {
        (
            chan_id_strategy(),
            any::<u64>(),
            array32(),
            any::<u16>(),
            extra_data_strategy(),
        )
            .prop_map(
                |(channel_id, id, sha256_of_onion, failure_code, extra_data)| {
                    Message::UpdateFailMalformedHtlc(UpdateFailMalformedHtlc {
                        channel_id,
                        id,
                        sha256_of_onion,
                        failure_code,
                        extra_data,
                    })
                },
            )
    }

    fn commit_sig_strategy() -> impl Strategy<Value = Message> {
        (
            chan_id_strategy(),
            sig_strategy(),
            proptest::collection::vec(sig_strategy(), 0..20),
            custom_records_strategy(),
            extra_data_strategy(),
        )
            .prop_map(
                |(channel_id, commit_sig, htlc_sigs, custom_records, extra_data)| {
                    Message::CommitSig(CommitSig {
                        channel_id,
                        commit_sig,
                        htlc_sigs,
                        custom_records,
                        extra_data,
                    })
                },
            )
    }

    fn revoke_and_ack_strategy() -> impl Strategy<Value = Message> {
        (
            chan_id_strategy(),
            array32(),
            pubkey_strategy(),
            extra_data_strategy(),
        )
            .prop_map(
                |(channel_id, revocation, next_revocation_key, extra_data)| {
                    Message::RevokeAndAck(RevokeAndAck {
                        channel_id,
                        revocation,
                        next_revocation_key,
                        extra_data,
                    })
                },
            )
    }

    fn update_fee_strategy() -> impl Strategy<Value = Message> {
        (chan_id_strategy(), any::<u32>(), extra_data_strategy()).prop_map(
            |(channel_id, fee_per_kw, extra_data)| {
                Message::UpdateFee(UpdateFee {
                    channel_id,
                    fee_per_kw,
                    extra_data,
                })
            },
        )
    }

    fn channel_reestablish_strategy() -> impl Strategy<Value = Message> {
        (
            chan_id_strategy(),
            any::<u64>(),
            any::<u64>(),
            array32(),
            pubkey_strategy(),
            extra_data_strategy(),
        )
            .prop_map(
                |(channel_id, next_local, remote, secret, point, extra_data)| {
                    Message::ChannelReestablish(ChannelReestablish {
                        channel_id,
                        next_local_commitment_number: next_local,
                        remote_commitment_number: remote,
                        last_remote_commit_secret: secret,
                        local_unrevoked_commit_point: point,
                        extra_data,
                    })
                },
            )
    }

    fn channel_announcement_strategy() -> impl Strategy<Value = Message> {
        (
            (
                sig_strategy(),
                sig_strategy(),
                sig_strategy(),
                sig_strategy(),
            ),
            features_strategy(),
            (array32(), scid_strategy()),
            (
                pubkey_strategy(),
                pubkey_strategy(),
                pubkey_strategy(),
                pubkey_strategy(),
            ),
            extra_data_strategy(),
        )
            .prop_map(
                |(
                    (node_sig_1, node_sig_2, bitcoin_sig_1, bitcoin_sig_2),
                    features,
                    (chain_hash, short_channel_id),
                    (node_id_1, node_id_2, bitcoin_key_1, bitcoin_key_2),
                    extra_data,
                )| {
                    Message::ChannelAnnouncement(ChannelAnnouncement {
                        node_sig_1,
                        node_sig_2,
                        bitcoin_sig_1,
                        bitcoin_sig_2,
                        features,
                        chain_hash,
                        short_channel_id,
                        node_id_1,
                        node_id_2,
                        bitcoin_key_1,
                        bitcoin_key_2,
                        extra_data,
                    })
                },
            )
    }

    fn node_announcement_strategy() -> impl Strategy<Value = Message> {
        (
            (sig_strategy(), features_strategy(), any::<u32>()),
            (
                pubkey_strategy(),
                (any::<u8>(), any::<u8>(), any::<u8>()),
                array32(),
            ),
            addrs_strategy(),
            extra_data_strategy(),
        )
            .prop_map(
                |(
                    (signature, features, timestamp),
                    (node_id, (r, g, b), alias),
                    addresses,
                    extra_data,
                )| {
                    Message::NodeAnnouncement(NodeAnnouncement {
                        signature,
                        features,
                        timestamp,
                        node_id,
                        rgb_color: [r, g, b],
                        alias: NodeAlias(alias),
                        addresses,
                        extra_data,
                    })
                },
            )
    }

    fn channel_update_strategy() -> impl Strategy<Value = Message> {
        (
            (sig_strategy(), array32(), scid_strategy(), any::<u32>()),
            (any::<bool>(), any::<u8>(), any::<u16>()),
            (any::<u64>(), any::<u32>(), any::<u32>(), any::<u64>()),
            extra_data_strategy(),
        )
            .prop_map(
                |(
                    (signature, chain_hash, short_channel_id, timestamp),
                    (has_max, channel_flags, time_lock_delta),
                    (htlc_min, base_fee, fee_rate, htlc_max),
                    extra_data,
                )| {
                    Message::ChannelUpdate(ChannelUpdate {
                        signature,
                        chain_hash,
                        short_channel_id,
                        timestamp,
                        message_flags: u8::from(has_max),
                        channel_flags,
                        time_lock_delta,
                        htlc_minimum_msat: htlc_min,
                        base_fee,
                        fee_rate,
                        htlc_maximum_msat: if has_max { htlc_max } else { 0 },
                        extra_data,
                    })
                },
            )
    }

    fn announce_signatures_strategy() -> impl Strategy<Value = Message> {
        (
            chan_id_strategy(),
            scid_strategy(),
            sig_strategy(),
            sig_strategy(),
            extra_data_strategy(),
        )
            .prop_map(
                |(channel_id, short_channel_id, node_signature, bitcoin_signature, extra_data)| {
                    Message::AnnounceSignatures(AnnounceSignatures {
                        channel_id,
                        short_channel_id,
                        node_signature,
                        bitcoin_signature,
                        extra_data,
                    })
                },
            )
    }

    fn query_short_chan_ids_strategy() -> impl Strategy<Value = Message> {
        (
            array32(),
            proptest::collection::vec(scid_strategy(), 0..16),
            extra_data_strategy(),
        )
            .prop_map(|(chain_hash, short_chan_ids, extra_data)| {
                Message::QueryShortChanIds(QueryShortChanIds {
                    chain_hash,
                    short_chan_ids,
                    extra_data,
                })
            })
    }

    fn reply_short_chan_ids_end_strategy() -> impl Strategy<Value = Message> {
        (array32(), any::<bool>(), extra_data_strategy()).prop_map(
            |(chain_hash, complete, extra_data)| {
                Message::ReplyShortChanIdsEnd(ReplyShortChanIdsEnd {
                    chain_hash,
                    complete: u8::from(complete),
                    extra_data,
                })
            },
        )
    }

    fn query_channel_range_strategy() -> impl Strategy<Value = Message> {
        (array32(), any::<u32>(), any::<u32>(), extra_data_strategy()).prop_map(
            |(chain_hash, first_block_height, num_blocks, extra_data)| {
                Message::QueryChannelRange(QueryChannelRange {
                    chain_hash,
                    first_block_height,
                    num_blocks,
                    extra_data,
                })
            },
        )
    }

    fn reply_channel_range_strategy() -> impl Strategy<Value = Message> {
        (
            array32(),
            any::<u32>(),
            any::<u32>(),
            any::<bool>(),
            proptest::collection::vec(scid_strategy(), 0..16),
            extra_data_strategy(),
        )
            .prop_map(
                |(chain_hash, first_block_height, num_blocks, complete, short_chan_ids, extra_data)| {
                    Message::ReplyChannelRange(ReplyChannelRange {
                        chain_hash,
                        first_block_height,
                        num_blocks,
                        complete: u8::from(complete),
                        short_chan_ids,
                        extra_data,
                    })
                },
            )
    }

    fn gossip_timestamp_range_strategy() -> impl Strategy<Value = Message> {
        (array32(), any::<u32>(), any::<u32>(), extra_data_strategy()).prop_map(
            |(chain_hash, first_timestamp, timestamp_range, extra_data)| {
                Message::GossipTimestampRange(GossipTimestampRange {
                    chain_hash,
                    first_timestamp,
                    timestamp_range,
                    extra_data,
                })
            },
        )
    }

    fn custom_strategy() -> impl Strategy<Value = Message> {
        (CUSTOM_TYPE_START..=u16::MAX, bytes(256)).prop_map(|(tag, data)| {
            Message::Custom(CustomMessage {
                msg_type: MessageType(tag),
                data,
            })
        })
    }

    /// One strategy spanning every registered message type.
    fn message_strategy() -> impl Strategy<Value = Message> {
        Union::new(vec![
            warning_strategy().boxed(),
            stfu_strategy().boxed(),
            init_strategy().boxed(),
            error_strategy().boxed(),
            ping_strategy().boxed(),
            pong_strategy().boxed(),
            open_channel_strategy().boxed(),
            accept_channel_strategy().boxed(),
            funding_created_strategy().boxed(),
            funding_signed_strategy().boxed(),
            channel_ready_strategy().boxed(),
            shutdown_strategy().boxed(),
            closing_signed_strategy().boxed(),
            update_add_htlc_strategy().boxed(),
            update_fulfill_htlc_strategy().boxed(),
            update_fail_htlc_strategy().boxed(),
            update_fail_malformed_strategy().boxed(),
            commit_sig_strategy().boxed(),
            revoke_and_ack_strategy().boxed(),
            update_fee_strategy().boxed(),
            channel_reestablish_strategy().boxed(),
            channel_announcement_strategy().boxed(),
            node_announcement_strategy().boxed(),
            channel_update_strategy().boxed(),
            announce_signatures_strategy().boxed(),
            query_short_chan_ids_strategy().boxed(),
            reply_short_chan_ids_end_strategy().boxed(),
            query_channel_range_strategy().boxed(),
            reply_channel_range_strategy().boxed(),
            gossip_timestamp_range_strategy().boxed(),
            custom_strategy().boxed(),
        ])
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        // The round-trip law: every message serializes within the body
        // limit, decodes back to an equal value, and re-encodes to
        // identical bytes (opaque trailers and opaque addresses
        // included).
        #[test]
        fn prop_message_round_trip(msg in message_strategy()) {
            let mut buf = Vec::new();
            let written = write_message(&mut buf, &msg, 0).expect("encode");
            prop_assert_eq!(written, buf.len());
            prop_assert!(
                buf.len() - 2 <= MAX_MSG_BODY,
                "body of {} bytes exceeds limit", buf.len() - 2
            );

            let decoded = read_message(&mut buf.as_slice(), 0).expect("decode");
            prop_assert_eq!(&decoded, &msg);

            let mut buf2 = Vec::new();
            write_message(&mut buf2, &decoded, 0).expect("re-encode");
            prop_assert_eq!(buf, buf2);
        }

        // The address list alone, across all five address kinds.
        #[test]
        fn prop_address_list_round_trip(addrs in addrs_strategy()) {
            let mut buf = Vec::new();
            encode_address_list(&mut buf, &addrs).expect("encode");
            let decoded = decode_address_list(&mut buf.as_slice()).expect("decode");
            prop_assert_eq!(&decoded, &addrs);

            let mut buf2 = Vec::new();
            encode_address_list(&mut buf2, &decoded).expect("re-encode");
            prop_assert_eq!(buf, buf2);
        }
    }
}
