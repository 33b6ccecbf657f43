//! # Derivation Flow (vr-01 → vr-02)
//!
//! Validator sets and headers derived from chain reads must be canonical:
//! the same chain state yields the same header no matter how many
//! providers there are, in which order they are configured or in which
//! order they list operators.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use relay_types::Phase;
    use vr_01_chain_gateway::ChainGateway;
    use vr_05_epoch_controller::derive_phase;

    /// Operators 1..=4 with powers 400/300/300/0; the last has no key.
    const SCENARIO_OPERATORS: [OperatorSpec; 4] = [
        OperatorSpec::new(1, 400),
        OperatorSpec::new(2, 300),
        OperatorSpec::new(3, 300),
        OperatorSpec::keyless(4, 0),
    ];

    #[tokio::test]
    async fn test_zero_power_operator_excluded() {
        let chain = Chain::new(&SCENARIO_OPERATORS);
        let valset = chain
            .deriver()
            .get_validator_set(0, &chain.config)
            .await
            .unwrap();

        assert_eq!(valset.validators.len(), 3);
        assert!(valset.validators.iter().all(|v| v.operator != [4; 20]));
        assert!(valset.validators.iter().all(|v| v.is_active));
        assert_eq!(valset.total_active_voting_power, 1000);
        assert_eq!(valset.quorum_threshold, 667);
    }

    #[tokio::test]
    async fn test_keyless_operator_is_inactive_member() {
        let chain = Chain::new(&[OperatorSpec::new(1, 400), OperatorSpec::keyless(2, 600)]);
        let valset = chain
            .deriver()
            .get_validator_set(0, &chain.config)
            .await
            .unwrap();

        assert_eq!(valset.validators.len(), 2);
        let keyless = valset
            .validators
            .iter()
            .find(|v| v.operator == [2; 20])
            .unwrap();
        assert!(!keyless.is_active);
        assert!(!keyless.counts_toward_quorum());
        assert_eq!(valset.total_active_voting_power, 400);
    }

    #[tokio::test]
    async fn test_header_independent_of_provider_order() {
        let chain = Chain::new(&[]);
        let split_a = addr(0xa1);
        let split_b = addr(0xa2);
        // Same operators split over two providers, each listed back to front.
        chain.gateway.set_voting_powers(
            split_a,
            vec![operator_power(2, 300), operator_power(1, 150)],
        );
        chain.gateway.set_voting_powers(
            split_b,
            vec![operator_power(3, 300), operator_power(1, 250)],
        );
        chain.gateway.set_keys(
            keys_provider(),
            vec![operator_keys(3), operator_keys(1), operator_keys(2)],
        );

        let mut forward = chain.config.clone();
        forward.voting_power_providers = vec![split_a, split_b];
        let mut backward = chain.config.clone();
        backward.voting_power_providers = vec![split_b, split_a];

        let deriver = chain.deriver();
        let mut headers = Vec::new();
        for config in [&forward, &backward, &forward] {
            let valset = deriver.get_validator_set(0, config).await.unwrap();
            headers.push(deriver.make_header(&valset).unwrap());
        }
        assert_eq!(headers[0], headers[1]);
        assert_eq!(headers[0], headers[2]);
        assert_eq!(headers[0].total_voting_power, 1000);

        // A single provider holding the merged powers agrees too.
        chain.gateway.set_voting_powers(
            power_provider(),
            vec![
                operator_power(1, 400),
                operator_power(3, 300),
                operator_power(2, 300),
            ],
        );
        let merged = deriver.get_validator_set(0, &chain.config).await.unwrap();
        assert_eq!(
            deriver.make_header(&merged).unwrap().total_voting_power,
            headers[0].total_voting_power
        );
    }

    #[tokio::test]
    async fn test_next_header_links_to_genesis() {
        let chain = Chain::with_genesis(&THREE_OPERATORS).await;
        let genesis = chain
            .gateway
            .get_valset_header_at(&settlement(), 0)
            .await
            .unwrap()
            .unwrap();

        let valset = chain
            .deriver()
            .get_validator_set(1, &chain.config)
            .await
            .unwrap();
        assert_eq!(valset.epoch, 1);
        assert_eq!(valset.capture_timestamp, chain.epoch_start(1));
        assert_eq!(valset.previous_header_hash, genesis.hash());
        assert_eq!(
            chain.deriver().make_header(&valset).unwrap().validators_ssz_mroot,
            genesis.validators_ssz_mroot
        );
    }

    #[tokio::test]
    async fn test_phase_windows_for_epoch() {
        let chain = Chain::with_genesis(&THREE_OPERATORS).await;
        let start = chain.epoch_start(1);
        let phase = |now| derive_phase(start, now, COMMIT_DURATION, PROLONG_DURATION, false);

        assert_eq!(phase(start - 1), Phase::Idle);
        assert_eq!(phase(start), Phase::Commit);
        // Prolongation extends the commit window.
        assert_eq!(phase(start + COMMIT_DURATION), Phase::Commit);
        assert_eq!(
            phase(start + COMMIT_DURATION + PROLONG_DURATION - 1),
            Phase::Commit
        );
        assert_eq!(phase(start + COMMIT_DURATION + PROLONG_DURATION), Phase::Fail);
        assert_eq!(
            derive_phase(start, start, COMMIT_DURATION, PROLONG_DURATION, true),
            Phase::Accept
        );
    }
}
