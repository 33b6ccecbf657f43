//! # Signer Selection
//!
//! Turns a raw snapshot of gossiped signatures into the contributions that
//! may count toward quorum.
//!
//! ## Filters (in order)
//!
//! 1. Epoch and digest must match what is being signed.
//! 2. The key must belong to an active validator with non-zero power under
//!    the requested key tag.
//! 3. The signature must verify individually (checked in parallel).
//! 4. One contribution per public key and per validator; the first valid
//!    one wins, so a bad entry cannot shadow a later good one.

use std::collections::HashSet;

use rayon::prelude::*;
use relay_crypto::BlsProvider;
use relay_types::{Epoch, Hash, KeyTag, SignatureMessage, ValidatorSet, VotingPower};

/// Below this many candidates signatures are checked sequentially.
pub const PARALLEL_THRESHOLD: usize = 4;

/// A signature that counts toward quorum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contribution {
    /// Canonical index of the signer in the validator set
    pub index: usize,
    pub voting_power: VotingPower,
    pub signature: Vec<u8>,
    pub public_key: Vec<u8>,
}

/// Select the distinct, member, verified signers of `message_hash` for
/// signing epoch `epoch`, with membership taken from `valset`.
///
/// The result is ordered by canonical validator index.
pub fn select_signers(
    valset: &ValidatorSet,
    epoch: Epoch,
    key_tag: KeyTag,
    message_hash: &Hash,
    signatures: &[SignatureMessage],
    provider: &dyn BlsProvider,
) -> Vec<Contribution> {
    let candidates: Vec<Contribution> = signatures
        .iter()
        .filter(|m| m.epoch == epoch && m.message_hash == *message_hash)
        .filter_map(|m| {
            let (index, validator) = valset.find_by_key(key_tag, &m.public_key)?;
            if !validator.counts_toward_quorum() {
                return None;
            }
            Some(Contribution {
                index,
                voting_power: validator.voting_power,
                signature: m.signature.clone(),
                public_key: m.public_key.clone(),
            })
        })
        .collect();

    let verifies =
        |c: &Contribution| provider.verify(&c.public_key, message_hash, &c.signature);

    // Both paths keep snapshot order.
    let verified: Vec<Contribution> = if candidates.len() < PARALLEL_THRESHOLD {
        candidates.into_iter().filter(|c| verifies(c)).collect()
    } else {
        candidates.into_par_iter().filter(|c| verifies(c)).collect()
    };

    let mut seen_keys = HashSet::new();
    let mut seen_indices = HashSet::new();
    let mut selected: Vec<Contribution> = verified
        .into_iter()
        .filter(|c| seen_keys.insert(c.public_key.clone()) && seen_indices.insert(c.index))
        .collect();
    selected.sort_by_key(|c| c.index);
    selected
}

/// Saturating sum of contributed voting power.
pub fn total_power(contributions: &[Contribution]) -> VotingPower {
    contributions
        .iter()
        .fold(0u128, |acc, c| acc.saturating_add(c.voting_power))
}
