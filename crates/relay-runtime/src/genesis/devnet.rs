//! # Devnet Genesis
//!
//! Deterministic single-chain deployment: one driver, one voting-power
//! provider, one key registry and one settlement replica, all on chain
//! [`DEVNET_CHAIN_ID`]. Operator `i` gets voting power `100 × (n − i)` and
//! the BLS key derived from seed `[i + 1; 32]`, unless it is the local node
//! and a secret was configured.

use std::sync::Arc;

use relay_crypto::{keccak256, keccak256_many, BlsKeyPair, CryptoError, Signer};
use relay_types::{
    Address, ChainId, CrossChainAddress, Eip712Domain, Key, KeyTag, NetworkConfig,
    OperatorVotingPower, OperatorWithKeys, QuorumThreshold, Timestamp, ValidatorSetHeader, Vault,
    VerificationType, VotingPower, THRESHOLD_PRECISION,
};
use thiserror::Error;
use tracing::info;
use vr_01_chain_gateway::{ChainGateway, GatewayError, InMemoryChainGateway};
use vr_02_valset_deriver::{DeriverError, ValidatorSetDeriver};

use crate::container::RelayConfig;

pub const DEVNET_CHAIN_ID: ChainId = 1;
pub const DEVNET_EPOCH_DURATION: u64 = 30;
pub const DEVNET_COMMIT_DURATION: u64 = 15;
const DEVNET_PROLONG_DURATION: u64 = 5;
const POWER_STEP: VotingPower = 100;
const BLS_KEY_TAG: KeyTag = KeyTag(0x00);

/// Genesis creation errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("Failed to derive operator key: {0}")]
    Key(#[from] CryptoError),

    #[error("Failed to derive genesis validator set: {0}")]
    Deriver(#[from] DeriverError),

    #[error("Failed to commit genesis header: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Invalid genesis configuration: {0}")]
    InvalidConfig(String),
}

/// One seeded operator and the relay node that signs for it.
pub struct DevnetOperator {
    pub node_id: String,
    pub address: Address,
    pub voting_power: VotingPower,
    pub keypair: Arc<BlsKeyPair>,
}

impl DevnetOperator {
    pub fn public_key(&self) -> Vec<u8> {
        Signer::public_key(self.keypair.as_ref())
    }
}

/// Devnet chain layout plus the operators that run on it.
pub struct DevnetGenesis {
    operators: Vec<DevnetOperator>,
    network: NetworkConfig,
    start_time: Timestamp,
}

fn contract(tag: u8) -> CrossChainAddress {
    let mut address = [0u8; 20];
    address[0] = 0xde;
    address[19] = tag;
    CrossChainAddress::new(DEVNET_CHAIN_ID, address)
}

/// Operator address: last 20 bytes of `keccak256(public_key)`.
fn operator_address(public_key: &[u8]) -> Address {
    let digest = keccak256(public_key);
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);
    address
}

fn vault_address(operator: &Address) -> Address {
    let digest = keccak256_many(&[b"devnet-vault".as_slice(), operator.as_slice()]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);
    address
}

impl DevnetGenesis {
    pub fn driver() -> CrossChainAddress {
        contract(0x01)
    }

    pub fn voting_power_provider() -> CrossChainAddress {
        contract(0x02)
    }

    pub fn keys_provider() -> CrossChainAddress {
        contract(0x03)
    }

    pub fn settlement() -> CrossChainAddress {
        contract(0x04)
    }

    /// Build the devnet layout for `config.devnet_operators` nodes with epoch 0
    /// starting at `start_time`.
    pub fn new(config: &RelayConfig, start_time: Timestamp) -> Result<Self, GenesisError> {
        let count = config.devnet_operators;
        if count == 0 {
            return Err(GenesisError::InvalidConfig(
                "at least one operator is required".to_string(),
            ));
        }
        let mut local = config
            .local_keypair()
            .map_err(|e| GenesisError::InvalidConfig(e.to_string()))?;

        let mut operators = Vec::with_capacity(count);
        for i in 0..count {
            let keypair = match (i, local.take()) {
                (0, Some(keypair)) => keypair,
                _ => BlsKeyPair::from_seed(&[i as u8 + 1; 32])?,
            };
            let address = operator_address(&Signer::public_key(&keypair));
            let node_id = if i == 0 {
                config.node_id.clone()
            } else {
                format!("devnet-{i}")
            };
            operators.push(DevnetOperator {
                node_id,
                address,
                voting_power: POWER_STEP * (count - i) as VotingPower,
                keypair: Arc::new(keypair),
            });
        }

        let network = NetworkConfig {
            voting_power_providers: vec![Self::voting_power_provider()],
            keys_provider: Self::keys_provider(),
            replicas: vec![Self::settlement()],
            verification_type: VerificationType::Simple,
            max_voting_power: 0,
            min_inclusion_voting_power: 1,
            max_validators_count: 0,
            required_key_tags: vec![BLS_KEY_TAG],
            required_header_key_tag: BLS_KEY_TAG,
            quorum_thresholds: vec![QuorumThreshold {
                key_tag: BLS_KEY_TAG,
                threshold: THRESHOLD_PRECISION * 2 / 3,
            }],
            epoch_duration: DEVNET_EPOCH_DURATION,
            commit_duration: DEVNET_COMMIT_DURATION,
            prolong_duration: DEVNET_PROLONG_DURATION,
        };

        Ok(Self {
            operators,
            network,
            start_time,
        })
    }

    pub fn operators(&self) -> &[DevnetOperator] {
        &self.operators
    }

    pub fn network_config(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    fn domain() -> Eip712Domain {
        let settlement = Self::settlement();
        Eip712Domain {
            name: "ValSetSettlement".to_string(),
            version: "1".to_string(),
            chain_id: settlement.chain_id,
            verifying_contract: settlement.address,
        }
    }

    /// Deploy the contracts into `gateway` and commit the epoch-0 header.
    pub async fn install(
        &self,
        gateway: &Arc<InMemoryChainGateway>,
    ) -> Result<ValidatorSetHeader, GenesisError> {
        gateway.connect_chain(DEVNET_CHAIN_ID);
        gateway.install_driver(Self::driver(), self.network.clone(), self.start_time);
        gateway.install_settlement(Self::settlement(), Self::domain());
        gateway.set_voting_powers(
            Self::voting_power_provider(),
            self.operators
                .iter()
                .map(|op| OperatorVotingPower {
                    operator: op.address,
                    vaults: vec![Vault {
                        chain_id: DEVNET_CHAIN_ID,
                        vault: vault_address(&op.address),
                        voting_power: op.voting_power,
                    }],
                })
                .collect(),
        );
        gateway.set_keys(
            Self::keys_provider(),
            self.operators
                .iter()
                .map(|op| OperatorWithKeys {
                    operator: op.address,
                    keys: vec![Key::new(BLS_KEY_TAG, op.public_key())],
                })
                .collect(),
        );

        let deriver = ValidatorSetDeriver::new(Arc::clone(gateway), Self::driver());
        let valset = deriver.get_validator_set(0, &self.network).await?;
        let header = deriver.make_header(&valset)?;
        let extra = deriver.extra_data(&valset, self.network.verification_type)?;
        gateway
            .set_genesis(&Self::settlement(), &header, &extra)
            .await?;

        info!(
            operators = self.operators.len(),
            total_voting_power = header.total_voting_power,
            quorum_threshold = header.quorum_threshold,
            start_time = self.start_time,
            "Devnet genesis committed"
        );
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_crypto::Bls12381Provider;

    fn config(operators: usize) -> RelayConfig {
        RelayConfig {
            devnet_operators: operators,
            ..RelayConfig::default()
        }
    }

    #[test]
    fn test_operators_are_deterministic() {
        let a = DevnetGenesis::new(&config(3), 1_000).unwrap();
        let b = DevnetGenesis::new(&config(3), 2_000).unwrap();
        let keys = |g: &DevnetGenesis| {
            g.operators()
                .iter()
                .map(|op| (op.address, op.public_key()))
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(&a), keys(&b));
        assert_eq!(
            a.operators()
                .iter()
                .map(|op| op.voting_power)
                .collect::<Vec<_>>(),
            vec![300, 200, 100]
        );
        assert_eq!(a.operators()[0].node_id, "relay-0");
        assert_eq!(a.operators()[2].node_id, "devnet-2");
    }

    #[test]
    fn test_local_secret_replaces_first_key() {
        let seeded = DevnetGenesis::new(&config(2), 0).unwrap();
        let custom = DevnetGenesis::new(
            &RelayConfig {
                bls_secret: Some("22".repeat(32)),
                ..config(2)
            },
            0,
        )
        .unwrap();
        assert_ne!(
            seeded.operators()[0].public_key(),
            custom.operators()[0].public_key()
        );
        assert_eq!(
            seeded.operators()[1].public_key(),
            custom.operators()[1].public_key()
        );
    }

    #[tokio::test]
    async fn test_install_commits_genesis() {
        let genesis = DevnetGenesis::new(&config(4), 1_000).unwrap();
        let gateway = Arc::new(InMemoryChainGateway::new(Arc::new(Bls12381Provider::new())));
        let header = genesis.install(&gateway).await.unwrap();

        assert_eq!(header.epoch, 0);
        assert_eq!(header.total_voting_power, 1000);
        assert_eq!(header.quorum_threshold, 667);
        assert!(gateway
            .is_valset_header_committed_at(&DevnetGenesis::settlement(), 0)
            .await
            .unwrap());
        assert_eq!(gateway.committed_headers(&DevnetGenesis::settlement()), vec![header]);
    }
}
