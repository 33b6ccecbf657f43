//! Network configuration as declared on the driver contract.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{CrossChainAddress, KeyTag, TypesError, TypesResult, VotingPower};

/// Fixed-point precision of [`QuorumThreshold::threshold`] (1e18 = 100%).
pub const THRESHOLD_PRECISION: u128 = 1_000_000_000_000_000_000;

/// How the settlement contract checks quorum proofs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationType {
    Zk = 0,
    Simple = 1,
}

impl TryFrom<u32> for VerificationType {
    type Error = TypesError;

    fn try_from(value: u32) -> TypesResult<Self> {
        match value {
            0 => Ok(VerificationType::Zk),
            1 => Ok(VerificationType::Simple),
            other => Err(TypesError::UnknownVerificationType(other)),
        }
    }
}

/// Relative quorum threshold for one key tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumThreshold {
    pub key_tag: KeyTag,
    /// Fraction of active voting power, scaled by [`THRESHOLD_PRECISION`].
    pub threshold: u128,
}

impl QuorumThreshold {
    /// Absolute threshold: `ceil(total × threshold / 1e18)`.
    ///
    /// Computed in 256-bit arithmetic; saturates at `u128::MAX`.
    pub fn absolute(&self, total_active_voting_power: VotingPower) -> VotingPower {
        let precision = U256::from(THRESHOLD_PRECISION);
        let product = U256::from(total_active_voting_power) * U256::from(self.threshold);
        let ceil = (product + precision - U256::one()) / precision;
        if ceil > U256::from(u128::MAX) {
            u128::MAX
        } else {
            ceil.low_u128()
        }
    }
}

/// Network configuration read from the driver at an epoch's capture timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub voting_power_providers: Vec<CrossChainAddress>,
    pub keys_provider: CrossChainAddress,
    /// Settlement contracts; the first entry is the primary replica.
    pub replicas: Vec<CrossChainAddress>,
    pub verification_type: VerificationType,
    /// Per-operator cap; 0 means unbounded.
    pub max_voting_power: VotingPower,
    pub min_inclusion_voting_power: VotingPower,
    /// 0 means unbounded.
    pub max_validators_count: u32,
    pub required_key_tags: Vec<KeyTag>,
    pub required_header_key_tag: KeyTag,
    pub quorum_thresholds: Vec<QuorumThreshold>,
    pub epoch_duration: u64,
    pub commit_duration: u64,
    pub prolong_duration: u64,
}

impl NetworkConfig {
    /// Threshold configured for `tag`.
    pub fn threshold_for(&self, tag: KeyTag) -> Option<&QuorumThreshold> {
        self.quorum_thresholds.iter().find(|q| q.key_tag == tag)
    }

    pub fn primary_replica(&self) -> Option<&CrossChainAddress> {
        self.replicas.first()
    }

    /// Commit window length including the prolong window.
    pub fn commit_window(&self) -> u64 {
        self.commit_duration.saturating_add(self.prolong_duration)
    }
}
