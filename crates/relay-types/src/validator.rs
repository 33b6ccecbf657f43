//! Validator set entities.

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::{Address, ChainId, Epoch, Hash, Key, KeyTag, Timestamp, VotingPower};

/// One voting-power source for an operator.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vault {
    pub chain_id: ChainId,
    #[serde_as(as = "Hex")]
    pub vault: Address,
    pub voting_power: VotingPower,
}

/// A member of the validator set.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    #[serde_as(as = "Hex")]
    pub operator: Address,
    /// Counted voting power (after capping).
    pub voting_power: VotingPower,
    /// Holds a key for the required header key tag.
    pub is_active: bool,
    pub keys: Vec<Key>,
    pub vaults: Vec<Vault>,
}

impl Validator {
    /// Key registered under `tag`, if any.
    pub fn key(&self, tag: KeyTag) -> Option<&Key> {
        self.keys.iter().find(|k| k.tag == tag)
    }

    /// Whether this validator contributes to the active voting power.
    pub fn counts_toward_quorum(&self) -> bool {
        self.is_active && self.voting_power > 0
    }
}

/// The canonical validator set for an epoch.
///
/// Validators are ordered ascending by operator address.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSet {
    pub version: u8,
    pub required_key_tag: KeyTag,
    pub epoch: Epoch,
    pub capture_timestamp: Timestamp,
    /// Absolute voting power required for a quorum.
    pub quorum_threshold: VotingPower,
    #[serde_as(as = "Hex")]
    pub previous_header_hash: Hash,
    pub total_active_voting_power: VotingPower,
    pub validators: Vec<Validator>,
}

impl ValidatorSet {
    /// Sum of voting power over active validators with non-zero power.
    pub fn compute_active_voting_power(&self) -> VotingPower {
        self.validators
            .iter()
            .filter(|v| v.counts_toward_quorum())
            .map(|v| v.voting_power)
            .fold(0u128, |acc, vp| acc.saturating_add(vp))
    }

    /// Active validators in canonical order.
    pub fn active_validators(&self) -> impl Iterator<Item = &Validator> {
        self.validators.iter().filter(|v| v.is_active)
    }

    /// Locate the validator owning `payload` under `tag`.
    ///
    /// Returns the canonical index together with the validator.
    pub fn find_by_key(&self, tag: KeyTag, payload: &[u8]) -> Option<(usize, &Validator)> {
        self.validators
            .iter()
            .enumerate()
            .find(|(_, v)| v.key(tag).map(|k| k.payload.as_slice()) == Some(payload))
    }

    /// Whether the validators are strictly ascending by operator.
    pub fn is_canonically_ordered(&self) -> bool {
        self.validators
            .windows(2)
            .all(|w| w[0].operator < w[1].operator)
    }
}

/// Raw per-operator voting power read from one provider.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorVotingPower {
    #[serde_as(as = "Hex")]
    pub operator: Address,
    pub vaults: Vec<Vault>,
}

/// Raw per-operator keys read from the key registry.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorWithKeys {
    #[serde_as(as = "Hex")]
    pub operator: Address,
    pub keys: Vec<Key>,
}
