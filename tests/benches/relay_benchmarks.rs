//! # Valset Relay Benchmarks
//!
//! | Subsystem | Operation |
//! |-----------|-----------|
//! | vr-02 Deriver | SSZ root over the validator list |
//! | vr-04 Aggregator | Quorum proof construction and verification |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use relay_crypto::{Bls12381Provider, BlsKeyPair, Signer};
use relay_types::{
    Key, KeyTag, SignatureMessage, Validator, ValidatorSet, Vault, VerificationType, ZERO_HASH,
};
use std::sync::Arc;
use std::time::Duration;
use vr_02_valset_deriver::domain::validators_ssz_root;
use vr_04_aggregator::Aggregator;

const TAG: KeyTag = KeyTag(0x00);

fn fixture(size: usize) -> (ValidatorSet, Vec<BlsKeyPair>) {
    let keypairs: Vec<BlsKeyPair> = (0..size)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[..8].copy_from_slice(&(i as u64 + 1).to_be_bytes());
            BlsKeyPair::from_seed(&seed).unwrap()
        })
        .collect();
    let mut rng = rand::thread_rng();
    let validators: Vec<Validator> = keypairs
        .iter()
        .enumerate()
        .map(|(i, kp)| {
            let mut operator = [0u8; 20];
            operator[12..].copy_from_slice(&(i as u64).to_be_bytes());
            let voting_power = rng.gen_range(1_000..100_000u128);
            Validator {
                operator,
                voting_power,
                is_active: true,
                keys: vec![Key::new(TAG, Signer::public_key(kp))],
                vaults: vec![Vault {
                    chain_id: 1,
                    vault: operator,
                    voting_power,
                }],
            }
        })
        .collect();
    let total: u128 = validators.iter().map(|v| v.voting_power).sum();
    let valset = ValidatorSet {
        version: 1,
        required_key_tag: TAG,
        epoch: 1,
        capture_timestamp: 0,
        quorum_threshold: total * 2 / 3 + 1,
        previous_header_hash: ZERO_HASH,
        total_active_voting_power: total,
        validators,
    };
    (valset, keypairs)
}

fn bench_ssz_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("vr-02-ssz-root");
    for size in [16usize, 128, 512] {
        let (valset, _) = fixture(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &valset, |b, valset| {
            b.iter(|| validators_ssz_root(black_box(&valset.validators)).unwrap())
        });
    }
    group.finish();
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("vr-04-aggregation");
    group.measurement_time(Duration::from_secs(10));
    let aggregator = Aggregator::new(Arc::new(Bls12381Provider::new()));
    let hash = [0x42u8; 32];

    for size in [4usize, 32, 128] {
        let (valset, keypairs) = fixture(size);
        let signatures: Vec<SignatureMessage> = keypairs
            .iter()
            .map(|kp| SignatureMessage {
                epoch: 1,
                message_hash: hash,
                signature: Signer::sign(kp, &hash),
                public_key: Signer::public_key(kp),
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("aggregate", size),
            &signatures,
            |b, signatures| {
                b.iter(|| {
                    aggregator
                        .aggregate(&valset, TAG, VerificationType::Simple, &hash, signatures)
                        .unwrap()
                })
            },
        );

        let proof = aggregator
            .aggregate(&valset, TAG, VerificationType::Simple, &hash, &signatures)
            .unwrap();
        group.bench_with_input(BenchmarkId::new("verify", size), &proof, |b, proof| {
            b.iter(|| assert!(aggregator.verify(&valset, TAG, black_box(proof))))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_ssz_root, bench_aggregation);
criterion_main!(benches);
