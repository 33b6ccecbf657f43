//! # Gossip Flow (vr-03 → vr-04)
//!
//! Signature dissemination between relay nodes over the in-memory network
//! and over real TCP sockets.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::fixtures::*;
    use relay_types::{Key, Validator, ValidatorSet, ZERO_HASH};
    use tokio::net::TcpListener;
    use tokio::sync::watch;
    use vr_03_signature_gossip::domain::SIGNATURE_TYPE;
    use vr_03_signature_gossip::{
        serve_tcp, DropReason, Envelope, InMemoryNetwork, PeerInfo, ReceiveOutcome,
        SignatureGossip, TcpTransport, MAX_FRAME_SIZE,
    };
    use vr_04_aggregator::Aggregator;

    const HASH: [u8; 32] = [0x77; 32];

    fn valset_at(epoch: u64, seeds: &[u8]) -> ValidatorSet {
        ValidatorSet {
            version: 1,
            required_key_tag: TAG,
            epoch,
            capture_timestamp: 0,
            quorum_threshold: 1,
            previous_header_hash: ZERO_HASH,
            total_active_voting_power: 100 * seeds.len() as u128,
            validators: seeds
                .iter()
                .map(|seed| Validator {
                    operator: [*seed; 20],
                    voting_power: 100,
                    is_active: true,
                    keys: vec![Key::new(TAG, public_key(*seed))],
                    vaults: vec![],
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_one_unreachable_peer_of_four() {
        let network = InMemoryNetwork::new();
        let nodes: Vec<_> = (1..=5u8).map(|seed| gossip_node(&network, seed)).collect();
        full_mesh(&nodes.iter().collect::<Vec<_>>());
        network.set_reachable("node-4", false);

        let report = nodes[0].broadcast(7, HASH).await.unwrap();
        assert_eq!(report.delivered, 3);
        assert_eq!(report.failed, vec!["node-4".to_string()]);

        for node in &nodes[1..] {
            let expected = if node.node_id() == "node-4" { 0 } else { 1 };
            assert_eq!(node.store().count(7, &HASH), expected);
        }
        assert_eq!(nodes[0].store().count(7, &HASH), 1);
    }

    #[tokio::test]
    async fn test_previous_epoch_signature_not_counted() {
        let network = InMemoryNetwork::new();
        let n1 = gossip_node(&network, 1);
        let n2 = gossip_node(&network, 2);
        full_mesh(&[&n1, &n2]);

        // Late signature for epoch 10 arrives while node 2 collects for 11.
        n1.broadcast(10, HASH).await.unwrap();
        n2.broadcast(11, HASH).await.unwrap();

        assert_eq!(n2.store().count(10, &HASH), 1);
        assert_eq!(n2.store().count(11, &HASH), 1);

        let aggregator = Aggregator::new(provider());
        let valset = valset_at(11, &[1, 2]);
        let mut everything = n2.store().snapshot(10, &HASH);
        everything.extend(n2.store().snapshot(11, &HASH));
        let tally = aggregator.tally(&valset, TAG, &HASH, &everything);
        assert_eq!(tally.signers, 1);
        assert_eq!(tally.have, 100);
    }

    #[tokio::test]
    async fn test_rebroadcast_is_duplicate() {
        let network = InMemoryNetwork::new();
        let n1 = gossip_node(&network, 1);
        let n2 = gossip_node(&network, 2);
        full_mesh(&[&n1, &n2]);

        n1.broadcast(3, HASH).await.unwrap();
        n1.broadcast(3, HASH).await.unwrap();
        assert_eq!(n2.store().count(3, &HASH), 1);
        assert_eq!(n2.store().len(), 1);
    }

    #[tokio::test]
    async fn test_forged_signature_dropped() {
        let network = InMemoryNetwork::new();
        let n2 = gossip_node(&network, 2);

        let mut forged = signed(1, 3, HASH);
        forged.public_key = public_key(9);
        let payload = serde_json::to_vec(&forged).unwrap();
        let frame = Envelope::new(SIGNATURE_TYPE, "node-1", 0, payload)
            .encode()
            .unwrap();
        assert_eq!(
            n2.on_receive(&frame),
            ReceiveOutcome::Dropped(DropReason::BadSignature)
        );
        assert!(n2.store().is_empty());

        let oversized = vec![b' '; MAX_FRAME_SIZE + 1];
        assert_eq!(
            n2.on_receive(&oversized),
            ReceiveOutcome::Dropped(DropReason::Oversized)
        );
    }

    #[tokio::test]
    async fn test_tcp_end_to_end() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let transport = Arc::new(TcpTransport::new(Duration::from_secs(2)));
        let receiver = Arc::new(SignatureGossip::new(
            "node-2",
            Arc::new(keypair(2)),
            provider(),
            Arc::clone(&transport),
        ));
        let sender = Arc::new(SignatureGossip::new(
            "node-1",
            Arc::new(keypair(1)),
            provider(),
            transport,
        ));
        sender.peers().add(PeerInfo::new("node-2", address));
        sender.peers().add(PeerInfo::new("node-3", "127.0.0.1:1"));

        let server = tokio::spawn(serve_tcp(listener, Arc::clone(&receiver), shutdown_rx));

        let report = sender.broadcast(5, HASH).await.unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, vec!["node-3".to_string()]);

        tokio::time::timeout(Duration::from_secs(5), async {
            while receiver.store().count(5, &HASH) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        let stored = receiver.store().snapshot(5, &HASH);
        assert_eq!(stored[0].public_key, public_key(1));

        shutdown_tx.send(true).unwrap();
        server.await.unwrap().unwrap();
    }
}
