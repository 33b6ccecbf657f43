//! Shared fixtures: an in-memory chain set with one driver, settlement
//! replicas on one or more chains and operators keyed by a one-byte seed.

use std::sync::Arc;

use relay_crypto::{Bls12381Provider, BlsKeyPair, BlsProvider, Signer};
use relay_types::{
    CrossChainAddress, Eip712Domain, Key, KeyTag, NetworkConfig, OperatorVotingPower,
    OperatorWithKeys, QuorumThreshold, SignatureMessage, Timestamp, ValidatorSetHeader, Vault,
    VerificationType, VotingPower,
};
use vr_01_chain_gateway::{ChainGateway, InMemoryChainGateway};
use vr_02_valset_deriver::ValidatorSetDeriver;
use vr_03_signature_gossip::{InMemoryNetwork, InMemoryTransport, PeerInfo, SignatureGossip};
use vr_04_aggregator::Aggregator;
use vr_05_epoch_controller::{ControllerConfig, EpochController, ManualClock, TimeSource};

pub const TAG: KeyTag = KeyTag(0x00);
pub const START: Timestamp = 10_000;
pub const EPOCH_DURATION: u64 = 100;
pub const COMMIT_DURATION: u64 = 50;
pub const PROLONG_DURATION: u64 = 10;
/// 66.7% in 1e18 fixed point.
pub const THRESHOLD_667: u128 = 667_000_000_000_000_000;

pub fn addr(byte: u8) -> CrossChainAddress {
    CrossChainAddress::new(1, [byte; 20])
}

pub fn driver() -> CrossChainAddress {
    addr(0xd0)
}

pub fn settlement() -> CrossChainAddress {
    settlement_on(1)
}

/// Settlement replica deployed on `chain_id`.
pub fn settlement_on(chain_id: u64) -> CrossChainAddress {
    CrossChainAddress::new(chain_id, [0xc0; 20])
}

pub fn power_provider() -> CrossChainAddress {
    addr(0xa0)
}

pub fn keys_provider() -> CrossChainAddress {
    addr(0xb0)
}

pub fn keypair(seed: u8) -> BlsKeyPair {
    BlsKeyPair::from_seed(&[seed; 32]).unwrap()
}

pub fn public_key(seed: u8) -> Vec<u8> {
    Signer::public_key(&keypair(seed))
}

pub fn provider() -> Arc<dyn BlsProvider> {
    Arc::new(Bls12381Provider::new())
}

pub fn signed(seed: u8, epoch: u64, message_hash: [u8; 32]) -> SignatureMessage {
    let kp = keypair(seed);
    SignatureMessage {
        epoch,
        message_hash,
        signature: Signer::sign(&kp, &message_hash),
        public_key: Signer::public_key(&kp),
    }
}

pub fn network_config() -> NetworkConfig {
    network_config_for(&[settlement()])
}

pub fn network_config_for(replicas: &[CrossChainAddress]) -> NetworkConfig {
    NetworkConfig {
        voting_power_providers: vec![power_provider()],
        keys_provider: keys_provider(),
        replicas: replicas.to_vec(),
        verification_type: VerificationType::Simple,
        max_voting_power: 0,
        min_inclusion_voting_power: 1,
        max_validators_count: 0,
        required_key_tags: vec![TAG],
        required_header_key_tag: TAG,
        quorum_thresholds: vec![QuorumThreshold {
            key_tag: TAG,
            threshold: THRESHOLD_667,
        }],
        epoch_duration: EPOCH_DURATION,
        commit_duration: COMMIT_DURATION,
        prolong_duration: PROLONG_DURATION,
    }
}

pub fn operator_power(seed: u8, voting_power: VotingPower) -> OperatorVotingPower {
    OperatorVotingPower {
        operator: [seed; 20],
        vaults: vec![Vault {
            chain_id: 1,
            vault: [seed.wrapping_add(0x40); 20],
            voting_power,
        }],
    }
}

pub fn operator_keys(seed: u8) -> OperatorWithKeys {
    OperatorWithKeys {
        operator: [seed; 20],
        keys: vec![Key::new(TAG, public_key(seed))],
    }
}

/// One operator as seeded on chain.
#[derive(Clone, Copy, Debug)]
pub struct OperatorSpec {
    pub seed: u8,
    pub voting_power: VotingPower,
    /// Registered a key for [`TAG`]
    pub keyed: bool,
}

impl OperatorSpec {
    pub const fn new(seed: u8, voting_power: VotingPower) -> Self {
        Self {
            seed,
            voting_power,
            keyed: true,
        }
    }

    pub const fn keyless(seed: u8, voting_power: VotingPower) -> Self {
        Self {
            seed,
            voting_power,
            keyed: false,
        }
    }
}

/// Powers 400/300/300, all keyed.
pub const THREE_OPERATORS: [OperatorSpec; 3] = [
    OperatorSpec::new(1, 400),
    OperatorSpec::new(2, 300),
    OperatorSpec::new(3, 300),
];

/// In-memory chain driven by a manual clock.
pub struct Chain {
    pub clock: Arc<ManualClock>,
    pub gateway: Arc<InMemoryChainGateway>,
    pub config: NetworkConfig,
}

impl Chain {
    /// Deploy contracts and operators; the clock sits at epoch 0 start.
    pub fn new(operators: &[OperatorSpec]) -> Self {
        Self::with_replicas(operators, &[settlement()])
    }

    /// [`Chain::new`] with a settlement replica at each of `replicas`, each
    /// on its own chain and EIP-712 domain.
    pub fn with_replicas(operators: &[OperatorSpec], replicas: &[CrossChainAddress]) -> Self {
        let clock = Arc::new(ManualClock::new(START));
        let chain_clock = Arc::clone(&clock);
        let gateway = Arc::new(
            InMemoryChainGateway::new(provider()).with_clock(Arc::new(move || chain_clock.now())),
        );
        let config = network_config_for(replicas);

        gateway.connect_chain(1);
        gateway.install_driver(driver(), config.clone(), START);
        for replica in replicas {
            gateway.connect_chain(replica.chain_id);
            gateway.install_settlement(
                *replica,
                Eip712Domain {
                    name: "Settlement".to_string(),
                    version: "1".to_string(),
                    chain_id: replica.chain_id,
                    verifying_contract: replica.address,
                },
            );
        }
        gateway.set_voting_powers(
            power_provider(),
            operators
                .iter()
                .map(|op| operator_power(op.seed, op.voting_power))
                .collect(),
        );
        gateway.set_keys(
            keys_provider(),
            operators
                .iter()
                .filter(|op| op.keyed)
                .map(|op| operator_keys(op.seed))
                .collect(),
        );

        Self {
            clock,
            gateway,
            config,
        }
    }

    /// [`Chain::new`] plus a committed epoch-0 header; the clock is moved to
    /// the start of epoch 1.
    pub async fn with_genesis(operators: &[OperatorSpec]) -> Self {
        let chain = Self::new(operators);
        chain.commit_genesis().await;
        chain.clock.set(START + EPOCH_DURATION);
        chain
    }

    pub fn deriver(&self) -> ValidatorSetDeriver<InMemoryChainGateway> {
        ValidatorSetDeriver::new(Arc::clone(&self.gateway), driver())
    }

    /// Commit the epoch-0 header on every replica.
    pub async fn commit_genesis(&self) -> ValidatorSetHeader {
        let deriver = self.deriver();
        let valset = deriver.get_validator_set(0, &self.config).await.unwrap();
        let header = deriver.make_header(&valset).unwrap();
        let extra = deriver
            .extra_data(&valset, self.config.verification_type)
            .unwrap();
        for replica in &self.config.replicas {
            self.gateway
                .set_genesis(replica, &header, &extra)
                .await
                .unwrap();
        }
        header
    }

    pub fn epoch_start(&self, epoch: u64) -> Timestamp {
        START + epoch * EPOCH_DURATION
    }
}

pub type MemoryGossip = SignatureGossip<InMemoryTransport>;

/// Gossip node `node-{seed}` registered on `network`.
pub fn gossip_node(network: &Arc<InMemoryNetwork>, seed: u8) -> Arc<MemoryGossip> {
    let id = format!("node-{seed}");
    let gossip = Arc::new(SignatureGossip::new(
        id.clone(),
        Arc::new(keypair(seed)),
        provider(),
        Arc::new(network.transport()),
    ));
    network.register(id, gossip.clone());
    gossip
}

/// Make every node a peer of every other.
pub fn full_mesh(nodes: &[&Arc<MemoryGossip>]) {
    for a in nodes {
        for b in nodes {
            if a.node_id() != b.node_id() {
                a.peers().add(PeerInfo::new(b.node_id(), ""));
            }
        }
    }
}

/// Controller for operator `seed` on any gateway.
pub fn controller<G: ChainGateway>(
    gateway: Arc<G>,
    gossip: Arc<MemoryGossip>,
    clock: Arc<ManualClock>,
) -> Arc<EpochController<G, InMemoryTransport>> {
    Arc::new(EpochController::new(
        ControllerConfig::new(driver()),
        gateway,
        gossip,
        Aggregator::new(provider()),
        clock as Arc<dyn TimeSource>,
    ))
}
