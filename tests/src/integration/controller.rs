//! # Controller Flow (vr-05 → vr-01..04)
//!
//! Several controllers sharing one chain set and one gossip network drive
//! epochs from collection to commitment, on one or several replicas.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::fixtures::*;
    use async_trait::async_trait;
    use relay_types::{
        CrossChainAddress, Eip712Domain, Epoch, ExtraData, Hash, KeyTag, NetworkConfig,
        OperatorVotingPower, OperatorWithKeys, Phase, Timestamp, TxResult, ValidatorSetHeader,
        VotingPower, ZERO_HASH,
    };
    use vr_01_chain_gateway::{ChainGateway, GatewayResult, InMemoryChainGateway};
    use vr_03_signature_gossip::InMemoryNetwork;
    use vr_05_epoch_controller::{SkipReason, TickOutcome};

    /// Counts derivation reads and commits on top of the shared chain.
    ///
    /// With `lagging` set, commit status reads behave like an RPC node that
    /// has not seen recent blocks: nothing looks committed.
    struct CountingGateway {
        inner: Arc<InMemoryChainGateway>,
        derivation_reads: AtomicUsize,
        commits: AtomicUsize,
        lagging: AtomicBool,
    }

    impl CountingGateway {
        fn new(inner: Arc<InMemoryChainGateway>) -> Arc<Self> {
            Arc::new(Self {
                inner,
                derivation_reads: AtomicUsize::new(0),
                commits: AtomicUsize::new(0),
                lagging: AtomicBool::new(false),
            })
        }

        fn lagging(inner: Arc<InMemoryChainGateway>) -> Arc<Self> {
            let gateway = Self::new(inner);
            gateway.lagging.store(true, Ordering::SeqCst);
            gateway
        }

        fn derivation_reads(&self) -> usize {
            self.derivation_reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChainGateway for CountingGateway {
        async fn get_config(
            &self,
            driver: &CrossChainAddress,
            timestamp: Timestamp,
        ) -> GatewayResult<NetworkConfig> {
            self.inner.get_config(driver, timestamp).await
        }

        async fn get_current_epoch(&self, driver: &CrossChainAddress) -> GatewayResult<Epoch> {
            self.inner.get_current_epoch(driver).await
        }

        async fn get_epoch_start(
            &self,
            driver: &CrossChainAddress,
            epoch: Epoch,
        ) -> GatewayResult<Timestamp> {
            self.inner.get_epoch_start(driver, epoch).await
        }

        async fn get_epoch_duration(
            &self,
            driver: &CrossChainAddress,
            epoch: Epoch,
        ) -> GatewayResult<u64> {
            self.inner.get_epoch_duration(driver, epoch).await
        }

        async fn get_valset_header_at(
            &self,
            settlement: &CrossChainAddress,
            epoch: Epoch,
        ) -> GatewayResult<Option<ValidatorSetHeader>> {
            self.inner.get_valset_header_at(settlement, epoch).await
        }

        async fn is_valset_header_committed_at(
            &self,
            settlement: &CrossChainAddress,
            epoch: Epoch,
        ) -> GatewayResult<bool> {
            if self.lagging.load(Ordering::SeqCst) {
                return Ok(false);
            }
            self.inner
                .is_valset_header_committed_at(settlement, epoch)
                .await
        }

        async fn get_voting_powers(
            &self,
            provider: &CrossChainAddress,
            timestamp: Timestamp,
        ) -> GatewayResult<Vec<OperatorVotingPower>> {
            self.derivation_reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get_voting_powers(provider, timestamp).await
        }

        async fn get_keys(
            &self,
            keys_provider: &CrossChainAddress,
            timestamp: Timestamp,
        ) -> GatewayResult<Vec<OperatorWithKeys>> {
            self.derivation_reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get_keys(keys_provider, timestamp).await
        }

        async fn commit_valset_header(
            &self,
            settlement: &CrossChainAddress,
            header: &ValidatorSetHeader,
            extra_data: &[ExtraData],
            proof: &[u8],
        ) -> GatewayResult<TxResult> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            self.inner
                .commit_valset_header(settlement, header, extra_data, proof)
                .await
        }

        async fn get_last_committed_header_epoch(
            &self,
            settlement: &CrossChainAddress,
        ) -> GatewayResult<Option<Epoch>> {
            self.inner.get_last_committed_header_epoch(settlement).await
        }

        async fn set_genesis(
            &self,
            settlement: &CrossChainAddress,
            header: &ValidatorSetHeader,
            extra_data: &[ExtraData],
        ) -> GatewayResult<TxResult> {
            self.inner.set_genesis(settlement, header, extra_data).await
        }

        async fn verify_quorum_sig(
            &self,
            settlement: &CrossChainAddress,
            epoch: Epoch,
            message: Hash,
            key_tag: KeyTag,
            threshold: VotingPower,
            proof: &[u8],
        ) -> GatewayResult<bool> {
            self.inner
                .verify_quorum_sig(settlement, epoch, message, key_tag, threshold, proof)
                .await
        }

        async fn get_eip712_domain(
            &self,
            settlement: &CrossChainAddress,
        ) -> GatewayResult<Eip712Domain> {
            self.inner.get_eip712_domain(settlement).await
        }
    }

    #[tokio::test]
    async fn test_three_nodes_commit_consecutive_epochs() {
        let chain = Chain::with_genesis(&THREE_OPERATORS).await;
        let network = InMemoryNetwork::new();
        let gossip: Vec<_> = (1..=3u8).map(|seed| gossip_node(&network, seed)).collect();
        full_mesh(&gossip.iter().collect::<Vec<_>>());
        let nodes: Vec<_> = gossip
            .iter()
            .map(|g| controller(Arc::clone(&chain.gateway), Arc::clone(g), chain.clock.clone()))
            .collect();

        for epoch in 1..=2u64 {
            chain.clock.set(chain.epoch_start(epoch) + 1);
            assert_eq!(
                nodes[1].tick().await.unwrap(),
                TickOutcome::Collecting {
                    epoch,
                    have: 300,
                    need: 667
                }
            );
            let outcome = nodes[0].tick().await.unwrap();
            assert!(
                matches!(outcome, TickOutcome::Committed { epoch: e, .. } if e == epoch),
                "epoch {epoch}: {outcome:?}"
            );
            assert_eq!(
                nodes[2].tick().await.unwrap(),
                TickOutcome::Skipped {
                    reason: SkipReason::Phase(Phase::Accept)
                }
            );
        }

        let headers = chain.gateway.committed_headers(&settlement());
        assert_eq!(
            headers.iter().map(|h| h.epoch).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(headers[1].previous_header_hash, headers[0].hash());
        assert_eq!(headers[2].previous_header_hash, headers[1].hash());
        assert!(!chain.gateway.extra_data_at(&settlement(), 2).is_empty());
    }

    #[tokio::test]
    async fn test_committed_epoch_does_no_work() {
        let chain = Chain::new(&THREE_OPERATORS);
        chain.commit_genesis().await;
        // Still inside epoch 0's commit window, but epoch 0 is committed.
        chain.clock.set(START + 1);

        let network = InMemoryNetwork::new();
        let n1 = gossip_node(&network, 1);
        let n2 = gossip_node(&network, 2);
        full_mesh(&[&n1, &n2]);
        let gateway = CountingGateway::new(Arc::clone(&chain.gateway));
        let node = controller(Arc::clone(&gateway), Arc::clone(&n1), chain.clock.clone());
        let writes = chain.gateway.write_count();

        assert_eq!(
            node.tick().await.unwrap(),
            TickOutcome::Skipped {
                reason: SkipReason::Phase(Phase::Accept)
            }
        );
        assert_eq!(gateway.derivation_reads(), 0);
        assert_eq!(gateway.commits.load(Ordering::SeqCst), 0);
        assert!(n1.store().is_empty());
        assert!(n2.store().is_empty());
        assert_eq!(chain.gateway.write_count(), writes);
    }

    #[tokio::test]
    async fn test_repeated_ticks_after_commit_write_nothing() {
        let chain = Chain::with_genesis(&THREE_OPERATORS).await;
        let network = InMemoryNetwork::new();
        let g1 = gossip_node(&network, 1);
        let g2 = gossip_node(&network, 2);
        full_mesh(&[&g1, &g2]);
        let gateway = CountingGateway::new(Arc::clone(&chain.gateway));
        let n1 = controller(Arc::clone(&gateway), g1, chain.clock.clone());
        let n2 = controller(Arc::clone(&gateway), g2, chain.clock.clone());

        n1.tick().await.unwrap();
        assert!(matches!(
            n2.tick().await.unwrap(),
            TickOutcome::Committed { epoch: 1, .. }
        ));
        let writes = chain.gateway.write_count();
        let commits = gateway.commits.load(Ordering::SeqCst);

        for _ in 0..3 {
            n1.tick().await.unwrap();
            n2.tick().await.unwrap();
        }
        assert_eq!(chain.gateway.write_count(), writes);
        assert_eq!(gateway.commits.load(Ordering::SeqCst), commits);
    }

    #[tokio::test]
    async fn test_quorum_lost_epoch_fails_then_next_commits() {
        let chain = Chain::with_genesis(&THREE_OPERATORS).await;
        let network = InMemoryNetwork::new();
        let gossip: Vec<_> = (1..=3u8).map(|seed| gossip_node(&network, seed)).collect();
        full_mesh(&gossip.iter().collect::<Vec<_>>());
        let nodes: Vec<_> = gossip
            .iter()
            .map(|g| controller(Arc::clone(&chain.gateway), Arc::clone(g), chain.clock.clone()))
            .collect();

        // Only operator 3 is online for epoch 1.
        assert!(matches!(
            nodes[2].tick().await.unwrap(),
            TickOutcome::Collecting { epoch: 1, have: 300, .. }
        ));
        chain
            .clock
            .set(chain.epoch_start(1) + COMMIT_DURATION + PROLONG_DURATION);
        assert_eq!(
            nodes[2].tick().await.unwrap(),
            TickOutcome::Skipped {
                reason: SkipReason::Phase(Phase::Fail)
            }
        );
        assert!(gossip[2].store().is_empty());

        // Epoch 2 still commits; with no epoch-1 header its link is zero.
        chain.clock.set(chain.epoch_start(2));
        nodes[2].tick().await.unwrap();
        assert!(matches!(
            nodes[0].tick().await.unwrap(),
            TickOutcome::Committed { epoch: 2, .. }
        ));
        let headers = chain.gateway.committed_headers(&settlement());
        assert_eq!(
            headers.iter().map(|h| h.epoch).collect::<Vec<_>>(),
            vec![0, 2]
        );
        assert_eq!(headers[1].previous_header_hash, ZERO_HASH);
    }

    #[tokio::test]
    async fn test_replicas_on_different_chains_both_commit() {
        let replicas = [settlement_on(1), settlement_on(2)];
        let chain = Chain::with_replicas(&THREE_OPERATORS, &replicas);
        chain.commit_genesis().await;

        let network = InMemoryNetwork::new();
        let gossip: Vec<_> = (1..=3u8).map(|seed| gossip_node(&network, seed)).collect();
        full_mesh(&gossip.iter().collect::<Vec<_>>());
        let nodes: Vec<_> = gossip
            .iter()
            .map(|g| controller(Arc::clone(&chain.gateway), Arc::clone(g), chain.clock.clone()))
            .collect();

        let domains = [
            chain.gateway.get_eip712_domain(&replicas[0]).await.unwrap(),
            chain.gateway.get_eip712_domain(&replicas[1]).await.unwrap(),
        ];
        assert_ne!(domains[0].separator(), domains[1].separator());

        for epoch in 1..=2u64 {
            chain.clock.set(chain.epoch_start(epoch) + 1);
            assert!(matches!(
                nodes[1].tick().await.unwrap(),
                TickOutcome::Collecting { have: 300, .. }
            ));
            let outcome = nodes[0].tick().await.unwrap();
            assert!(
                matches!(outcome, TickOutcome::Committed { epoch: e, ref tx_hashes } if e == epoch && tx_hashes.len() == 2),
                "epoch {epoch}: {outcome:?}"
            );
        }

        for replica in &replicas {
            let headers = chain.gateway.committed_headers(replica);
            assert_eq!(
                headers.iter().map(|h| h.epoch).collect::<Vec<_>>(),
                vec![0, 1, 2]
            );
            assert_eq!(headers[2].previous_header_hash, headers[1].hash());
        }
    }

    #[tokio::test]
    async fn test_offline_replica_catches_up_after_partial_commit() {
        let replicas = [settlement_on(1), settlement_on(2)];
        let chain = Chain::with_replicas(&THREE_OPERATORS, &replicas);
        chain.commit_genesis().await;
        chain.clock.set(chain.epoch_start(1));

        let network = InMemoryNetwork::new();
        let g1 = gossip_node(&network, 1);
        let g2 = gossip_node(&network, 2);
        full_mesh(&[&g1, &g2]);
        let n1 = controller(Arc::clone(&chain.gateway), g1, chain.clock.clone());
        let n2 = controller(Arc::clone(&chain.gateway), g2, chain.clock.clone());

        chain.gateway.set_chain_offline(2, true);
        assert!(n2.tick().await.is_err());
        let outcome = n1.tick().await.unwrap();
        assert!(
            matches!(
                &outcome,
                TickOutcome::PartiallyCommitted { epoch: 1, tx_hashes, pending }
                    if tx_hashes.len() == 1 && pending == &vec![replicas[1]]
            ),
            "{outcome:?}"
        );
        assert_eq!(chain.gateway.committed_headers(&replicas[0]).len(), 2);
        assert_eq!(chain.gateway.committed_headers(&replicas[1]).len(), 1);

        chain.gateway.set_chain_offline(2, false);
        assert!(matches!(
            n2.tick().await.unwrap(),
            TickOutcome::Collecting { epoch: 1, have: 300, .. }
        ));
        assert!(matches!(
            n1.tick().await.unwrap(),
            TickOutcome::Committed { epoch: 1, ref tx_hashes } if tx_hashes.len() == 1
        ));
        assert_eq!(
            chain.gateway.committed_headers(&replicas[0]),
            chain.gateway.committed_headers(&replicas[1])
        );
    }

    #[tokio::test]
    async fn test_header_committed_by_other_relay_is_benign() {
        let chain = Chain::with_genesis(&THREE_OPERATORS).await;
        let network = InMemoryNetwork::new();
        let g1 = gossip_node(&network, 1);
        let g2 = gossip_node(&network, 2);
        full_mesh(&[&g1, &g2]);
        let lagging = CountingGateway::lagging(Arc::clone(&chain.gateway));
        let first = controller(Arc::clone(&chain.gateway), g1, chain.clock.clone());
        let second = controller(Arc::clone(&lagging), g2, chain.clock.clone());

        assert!(matches!(
            second.tick().await.unwrap(),
            TickOutcome::Collecting { epoch: 1, .. }
        ));
        assert!(matches!(
            first.tick().await.unwrap(),
            TickOutcome::Committed { epoch: 1, .. }
        ));
        let writes = chain.gateway.write_count();

        // Its stale read says epoch 1 is open, so it aggregates and submits;
        // the revert is recognised and nothing is written.
        assert_eq!(
            second.tick().await.unwrap(),
            TickOutcome::Skipped {
                reason: SkipReason::Phase(Phase::Accept)
            }
        );
        assert_eq!(lagging.commits.load(Ordering::SeqCst), 1);
        assert_eq!(chain.gateway.write_count(), writes);
    }

    #[tokio::test]
    async fn test_already_submitted_on_one_replica_commits_the_other() {
        let replicas = [settlement_on(1), settlement_on(2)];
        let chain = Chain::with_replicas(&THREE_OPERATORS, &replicas);
        chain.commit_genesis().await;
        chain.clock.set(chain.epoch_start(1));

        let network = InMemoryNetwork::new();
        let g1 = gossip_node(&network, 1);
        let g2 = gossip_node(&network, 2);
        full_mesh(&[&g1, &g2]);
        let lagging = CountingGateway::lagging(Arc::clone(&chain.gateway));
        let first = controller(Arc::clone(&chain.gateway), g1, chain.clock.clone());
        let second = controller(Arc::clone(&lagging), g2, chain.clock.clone());

        // The first relay reaches replica 1 only.
        chain.gateway.set_chain_offline(2, true);
        assert!(second.tick().await.is_err());
        assert!(matches!(
            first.tick().await.unwrap(),
            TickOutcome::PartiallyCommitted { epoch: 1, .. }
        ));
        chain.gateway.set_chain_offline(2, false);

        // The second relay resubmits to replica 1 (already there) and starts
        // signing for replica 2.
        assert!(matches!(
            second.tick().await.unwrap(),
            TickOutcome::Collecting { epoch: 1, have: 300, .. }
        ));
        assert!(matches!(
            first.tick().await.unwrap(),
            TickOutcome::Committed { epoch: 1, ref tx_hashes } if tx_hashes.len() == 1
        ));

        let writes = chain.gateway.write_count();
        let attempts = lagging.commits.load(Ordering::SeqCst);
        assert_eq!(
            second.tick().await.unwrap(),
            TickOutcome::Skipped {
                reason: SkipReason::Phase(Phase::Accept)
            }
        );
        assert_eq!(lagging.commits.load(Ordering::SeqCst), attempts + 2);
        assert_eq!(chain.gateway.write_count(), writes);
        for replica in &replicas {
            assert_eq!(chain.gateway.committed_headers(replica).len(), 2);
        }
    }
}
