//! Committee roster carried inside settlement proofs.
//!
//! A header is signed by the validator set committed for an earlier epoch.
//! Settlement only stores a keccak commitment to that set, so the proof
//! carries the full roster: one entry per validator in canonical order with
//! its key under the header key tag and the power it counts with.
//! Validators that cannot sign carry power 0.

use bitvec::prelude::*;
use relay_crypto::{keccak256, PUBLIC_KEY_LENGTH};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::{Hash, KeyTag, TypesError, TypesResult, ValidatorSet, VotingPower};

/// Encoded size of one entry: key followed by u128 BE power.
pub const ROSTER_ENTRY_LEN: usize = PUBLIC_KEY_LENGTH + 16;

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    #[serde_as(as = "Hex")]
    pub public_key: [u8; PUBLIC_KEY_LENGTH],
    pub voting_power: VotingPower,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub entries: Vec<RosterEntry>,
}

impl Roster {
    /// Roster of `valset` under `tag`.
    ///
    /// Inactive or zero-power validators, and keys that are not a
    /// well-formed public key, get power 0.
    pub fn from_valset(valset: &ValidatorSet, tag: KeyTag) -> Self {
        let entries = valset
            .validators
            .iter()
            .map(|v| {
                let key = v
                    .key(tag)
                    .and_then(|k| <[u8; PUBLIC_KEY_LENGTH]>::try_from(k.payload.as_slice()).ok());
                match key {
                    Some(public_key) => RosterEntry {
                        public_key,
                        voting_power: if v.counts_toward_quorum() {
                            v.voting_power
                        } else {
                            0
                        },
                    },
                    None => RosterEntry {
                        public_key: [0; PUBLIC_KEY_LENGTH],
                        voting_power: 0,
                    },
                }
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value committed under `valset.simple.validatorsKeccak`.
    pub fn commitment(&self) -> Hash {
        keccak256(&self.to_bytes())
    }

    /// `count(u32 BE) ‖ (key(96) ‖ voting_power(u128 BE))*`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.entries.len() * ROSTER_ENTRY_LEN);
        out.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());
        for entry in &self.entries {
            out.extend_from_slice(&entry.public_key);
            out.extend_from_slice(&entry.voting_power.to_be_bytes());
        }
        out
    }

    /// Decode a roster from the front of `bytes`, returning the remainder.
    pub fn decode_prefix(bytes: &[u8]) -> TypesResult<(Self, &[u8])> {
        if bytes.len() < 4 {
            return Err(TypesError::ProofTruncated {
                expected: 4,
                actual: bytes.len(),
            });
        }
        let (count, rest) = bytes.split_at(4);
        let mut count_buf = [0u8; 4];
        count_buf.copy_from_slice(count);
        let count = u32::from_be_bytes(count_buf) as usize;

        let body_len = count
            .checked_mul(ROSTER_ENTRY_LEN)
            .filter(|len| *len <= rest.len())
            .ok_or(TypesError::ProofTruncated {
                expected: 4usize.saturating_add(count.saturating_mul(ROSTER_ENTRY_LEN)),
                actual: bytes.len(),
            })?;
        let (body, rest) = rest.split_at(body_len);

        let entries = body
            .chunks_exact(ROSTER_ENTRY_LEN)
            .map(|chunk| {
                let (key, power) = chunk.split_at(PUBLIC_KEY_LENGTH);
                let mut public_key = [0u8; PUBLIC_KEY_LENGTH];
                public_key.copy_from_slice(key);
                let mut power_buf = [0u8; 16];
                power_buf.copy_from_slice(power);
                RosterEntry {
                    public_key,
                    voting_power: u128::from_be_bytes(power_buf),
                }
            })
            .collect();
        Ok((Self { entries }, rest))
    }

    /// Keys and summed power of the entries flagged in `signers`.
    ///
    /// `None` when the bitmap flags a position past the roster, a flagged
    /// entry carries no power, or the sum overflows.
    pub fn signers(&self, signers: &BitSlice<u8, Msb0>) -> Option<(Vec<&[u8]>, VotingPower)> {
        if signers.len() > self.entries.len() && signers[self.entries.len()..].any() {
            return None;
        }
        let mut keys = Vec::with_capacity(signers.count_ones());
        let mut power: VotingPower = 0;
        for index in signers.iter_ones() {
            let entry = &self.entries[index];
            if entry.voting_power == 0 {
                return None;
            }
            power = power.checked_add(entry.voting_power)?;
            keys.push(entry.public_key.as_slice());
        }
        Some((keys, power))
    }
}
