//! Canonical validator list from raw provider reads.
//!
//! The result depends only on the reads and the config, never on the order
//! in which providers answered or listed their operators.

use relay_types::{
    Address, Key, NetworkConfig, OperatorVotingPower, OperatorWithKeys, Validator, Vault,
};
use std::collections::BTreeMap;

use crate::domain::ssz::{MAX_KEYS, MAX_VAULTS};

/// Merge per-provider reads into one sorted vault list per operator.
///
/// An operator keeps at most [`MAX_VAULTS`] vaults: the most powerful ones,
/// ties broken by `(chain_id, vault)` ascending. Its voting power is the
/// sum over the vaults it keeps.
pub fn merge_voting_powers(reads: Vec<Vec<OperatorVotingPower>>) -> BTreeMap<Address, Vec<Vault>> {
    let mut merged: BTreeMap<Address, Vec<Vault>> = BTreeMap::new();
    for entry in reads.into_iter().flatten() {
        merged.entry(entry.operator).or_default().extend(entry.vaults);
    }
    for vaults in merged.values_mut() {
        if vaults.len() > MAX_VAULTS {
            vaults.sort_by(|a, b| {
                b.voting_power
                    .cmp(&a.voting_power)
                    .then(a.chain_id.cmp(&b.chain_id))
                    .then(a.vault.cmp(&b.vault))
            });
            vaults.truncate(MAX_VAULTS);
        }
        vaults.sort();
    }
    merged
}

/// Keys restricted to `required_key_tags`, one per tag, sorted by tag.
fn filter_keys(config: &NetworkConfig, mut keys: Vec<Key>) -> Vec<Key> {
    keys.retain(|k| config.required_key_tags.contains(&k.tag));
    keys.sort();
    keys.dedup_by_key(|k| k.tag);
    keys.truncate(MAX_KEYS);
    keys
}

/// Build the canonical validator list.
///
/// Steps, in order: join voting power with keys, cap at `max_voting_power`,
/// drop operators below `min_inclusion_voting_power`, truncate to
/// `max_validators_count`, sort by operator address.
pub fn build_validators(
    config: &NetworkConfig,
    voting_powers: BTreeMap<Address, Vec<Vault>>,
    keys: Vec<OperatorWithKeys>,
) -> Vec<Validator> {
    let mut keys_by_operator: BTreeMap<Address, Vec<Key>> = BTreeMap::new();
    for entry in keys {
        keys_by_operator
            .entry(entry.operator)
            .or_default()
            .extend(entry.keys);
    }

    let mut validators: Vec<Validator> = voting_powers
        .into_iter()
        .map(|(operator, vaults)| {
            let raw_power = vaults
                .iter()
                .fold(0u128, |acc, v| acc.saturating_add(v.voting_power));
            let voting_power = if config.max_voting_power > 0 {
                raw_power.min(config.max_voting_power)
            } else {
                raw_power
            };
            let keys = filter_keys(
                config,
                keys_by_operator.remove(&operator).unwrap_or_default(),
            );
            let is_active = keys
                .iter()
                .any(|k| k.tag == config.required_header_key_tag);
            Validator {
                operator,
                voting_power,
                is_active,
                keys,
                vaults,
            }
        })
        .filter(|v| v.voting_power >= config.min_inclusion_voting_power)
        .collect();

    let max = config.max_validators_count as usize;
    if max > 0 && validators.len() > max {
        validators.sort_by(|a, b| {
            b.is_active
                .cmp(&a.is_active)
                .then(b.voting_power.cmp(&a.voting_power))
                .then(a.operator.cmp(&b.operator))
        });
        validators.truncate(max);
    }

    validators.sort_by(|a, b| a.operator.cmp(&b.operator));
    validators
}
