//! SSZ merkleisation of the validator list.
//!
//! Schema:
//!
//! ```text
//! Key       { tag: uint8, payload_hash: bytes32 }
//! Vault     { chain_id: uint64, vault: bytes20, voting_power: uint256 }
//! Validator { operator: bytes20, voting_power: uint256, is_active: bool,
//!             keys: List[Key, 128], vaults: List[Vault, 1024] }
//! root      = hash_tree_root(List[Validator, 1048576])
//! ```
//!
//! Basic values are packed little-endian into 32-byte chunks, containers
//! merkleise their field roots, lists merkleise element roots padded with
//! zero hashes up to the limit and then mix in the length.

use relay_crypto::{keccak256, sha256_pair, Hash};
use relay_types::{Key, Validator, Vault};

use crate::error::{DeriverError, DeriverResult};

pub const MAX_KEYS: usize = 128;
pub const MAX_VAULTS: usize = 1024;
pub const MAX_VALIDATORS: usize = 1 << 20;

/// Zero-subtree roots, `table[d]` is the root of an all-zero tree of depth `d`.
fn zero_hashes(depth: usize) -> Vec<Hash> {
    let mut table = Vec::with_capacity(depth + 1);
    table.push([0u8; 32]);
    for d in 0..depth {
        let prev = table[d];
        table.push(sha256_pair(&prev, &prev));
    }
    table
}

fn depth_for(limit: usize) -> usize {
    limit.max(1).next_power_of_two().trailing_zeros() as usize
}

/// Merkleise `chunks` as the leaves of a tree sized for `limit` leaves.
pub fn merkleize(chunks: &[Hash], limit: usize) -> Hash {
    let depth = depth_for(limit);
    let zeros = zero_hashes(depth);
    if chunks.is_empty() {
        return zeros[depth];
    }

    let mut layer = chunks.to_vec();
    for zero in zeros.iter().take(depth) {
        if layer.len() % 2 == 1 {
            layer.push(*zero);
        }
        layer = layer
            .chunks(2)
            .map(|pair| sha256_pair(&pair[0], &pair[1]))
            .collect();
    }
    layer[0]
}

pub fn mix_in_length(root: &Hash, length: usize) -> Hash {
    let mut len_chunk = [0u8; 32];
    len_chunk[..8].copy_from_slice(&(length as u64).to_le_bytes());
    sha256_pair(root, &len_chunk)
}

fn uint_chunk(value: u128) -> Hash {
    let mut chunk = [0u8; 32];
    chunk[..16].copy_from_slice(&value.to_le_bytes());
    chunk
}

fn bytes20_chunk(bytes: &[u8; 20]) -> Hash {
    let mut chunk = [0u8; 32];
    chunk[..20].copy_from_slice(bytes);
    chunk
}

fn key_root(key: &Key) -> Hash {
    merkleize(&[uint_chunk(key.tag.0 as u128), keccak256(&key.payload)], 2)
}

fn vault_root(vault: &Vault) -> Hash {
    merkleize(
        &[
            uint_chunk(vault.chain_id as u128),
            bytes20_chunk(&vault.vault),
            uint_chunk(vault.voting_power),
        ],
        3,
    )
}

fn list_root<T>(
    what: &'static str,
    items: &[T],
    limit: usize,
    root: impl Fn(&T) -> DeriverResult<Hash>,
) -> DeriverResult<Hash> {
    if items.len() > limit {
        return Err(DeriverError::SszLimitExceeded {
            what,
            len: items.len(),
            limit,
        });
    }
    let roots = items.iter().map(root).collect::<DeriverResult<Vec<_>>>()?;
    Ok(mix_in_length(&merkleize(&roots, limit), items.len()))
}

/// Root of one validator container.
pub fn validator_root(validator: &Validator) -> DeriverResult<Hash> {
    let keys = list_root("keys", &validator.keys, MAX_KEYS, |k| Ok(key_root(k)))?;
    let vaults = list_root("vaults", &validator.vaults, MAX_VAULTS, |v| {
        Ok(vault_root(v))
    })?;
    Ok(merkleize(
        &[
            bytes20_chunk(&validator.operator),
            uint_chunk(validator.voting_power),
            uint_chunk(validator.is_active as u128),
            keys,
            vaults,
        ],
        5,
    ))
}

/// `validators_ssz_mroot` of a canonically ordered validator list.
pub fn validators_ssz_root(validators: &[Validator]) -> DeriverResult<Hash> {
    list_root("validators", validators, MAX_VALIDATORS, validator_root)
}
