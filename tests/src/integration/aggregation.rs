//! # Aggregation Flow (vr-02 → vr-04)
//!
//! Quorum proofs over derived validator sets: never below threshold, always
//! produced once enough distinct member signatures exist, and never crediting
//! a key outside the set.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use relay_types::{AggregationProof, SignatureMessage, ValidatorSet, VerificationType};
    use vr_04_aggregator::{Aggregator, AggregatorError};

    const HASH: [u8; 32] = [0x5a; 32];

    async fn derived_set(operators: &[OperatorSpec], epoch: u64) -> ValidatorSet {
        let chain = Chain::new(operators);
        let mut valset = chain
            .deriver()
            .get_validator_set(0, &chain.config)
            .await
            .unwrap();
        valset.epoch = epoch;
        valset
    }

    fn aggregate(
        valset: &ValidatorSet,
        sigs: &[SignatureMessage],
    ) -> Result<AggregationProof, AggregatorError> {
        Aggregator::new(provider()).aggregate(valset, TAG, VerificationType::Simple, &HASH, sigs)
    }

    #[tokio::test]
    async fn test_threshold_boundary() {
        let valset = derived_set(&THREE_OPERATORS, 11).await;

        let proof = aggregate(&valset, &[signed(1, 11, HASH), signed(2, 11, HASH)]).unwrap();
        assert_eq!(proof.voting_power, 700);
        assert!(Aggregator::new(provider()).verify(&valset, TAG, &proof));

        assert_eq!(
            aggregate(&valset, &[signed(1, 11, HASH)]),
            Err(AggregatorError::InsufficientQuorum { have: 400, need: 667 })
        );
    }

    #[tokio::test]
    async fn test_repeated_key_counts_once() {
        let valset = derived_set(&THREE_OPERATORS, 11).await;
        let sig = signed(1, 11, HASH);

        let tally =
            Aggregator::new(provider()).tally(&valset, TAG, &HASH, &[sig.clone(), sig.clone()]);
        assert_eq!(tally.signers, 1);
        assert_eq!(tally.have, 400);

        let proof = aggregate(&valset, &[sig.clone(), signed(2, 11, HASH), sig]).unwrap();
        assert_eq!(proof.signer_count(), 2);
        assert_eq!(proof.voting_power, 700);
    }

    #[tokio::test]
    async fn test_random_subsets_sound_and_complete() {
        let operators: Vec<OperatorSpec> = (1..=7u8)
            .map(|seed| OperatorSpec::new(seed, 50 * seed as u128))
            .collect();
        let valset = derived_set(&operators, 3).await;
        let aggregator = Aggregator::new(provider());
        let signatures: Vec<SignatureMessage> =
            (1..=7u8).map(|seed| signed(seed, 3, HASH)).collect();
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..40 {
            let subset: Vec<SignatureMessage> = signatures
                .iter()
                .filter(|_| rng.gen_bool(0.5))
                .cloned()
                .collect();
            let power: u128 = subset
                .iter()
                .map(|m| valset.find_by_key(TAG, &m.public_key).unwrap().1.voting_power)
                .sum();

            match aggregator.aggregate(&valset, TAG, VerificationType::Simple, &HASH, &subset) {
                Ok(proof) => {
                    assert!(proof.voting_power >= valset.quorum_threshold);
                    assert_eq!(proof.voting_power, power);
                    assert!(aggregator.verify(&valset, TAG, &proof));
                }
                Err(AggregatorError::InsufficientQuorum { have, need }) => {
                    assert_eq!(have, power);
                    assert!(have < need);
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
    }

    #[tokio::test]
    async fn test_non_member_keys_never_credited() {
        let valset = derived_set(&THREE_OPERATORS, 11).await;
        let aggregator = Aggregator::new(provider());
        // Valid signatures from outsiders alone never make a proof.
        let outsiders = [signed(8, 11, HASH), signed(9, 11, HASH)];
        assert_eq!(
            aggregate(&valset, &outsiders),
            Err(AggregatorError::InsufficientQuorum { have: 0, need: 667 })
        );

        let mut mixed = outsiders.to_vec();
        mixed.extend([signed(2, 11, HASH), signed(3, 11, HASH), signed(1, 11, HASH)]);
        let proof = aggregate(&valset, &mixed).unwrap();
        assert_eq!(proof.signer_count(), 3);
        assert_eq!(proof.voting_power, 1000);
        assert!(aggregator.verify(&valset, TAG, &proof));

        // The same proof against a set without operator 3 must fail.
        let shrunk = derived_set(&THREE_OPERATORS[..2], 11).await;
        assert!(!aggregator.verify(&shrunk, TAG, &proof));
    }

    #[tokio::test]
    async fn test_keyless_validator_cannot_sign() {
        let valset = derived_set(
            &[OperatorSpec::new(1, 400), OperatorSpec::keyless(2, 600)],
            11,
        )
        .await;
        // Operator 2 signs with the key it never registered.
        let tally = Aggregator::new(provider()).tally(
            &valset,
            TAG,
            &HASH,
            &[signed(1, 11, HASH), signed(2, 11, HASH)],
        );
        assert_eq!(tally.signers, 1);
        assert_eq!(tally.need, 267);
        assert!(tally.is_met());
    }
}
