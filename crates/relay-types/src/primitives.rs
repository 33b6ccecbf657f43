//! Primitive aliases and the cross-chain contract reference.

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use std::fmt;

/// A 32-byte hash (Keccak-256 or SHA-256 depending on context).
pub type Hash = [u8; 32];

/// A 20-byte EVM address.
pub type Address = [u8; 20];

/// EVM chain identifier.
pub type ChainId = u64;

/// Epoch number, monotonic, duration defined on-chain.
pub type Epoch = u64;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Voting power in the providers' base unit.
pub type VotingPower = u128;

/// All-zero hash, used as `previous_header_hash` for genesis.
pub const ZERO_HASH: Hash = [0u8; 32];

/// A contract instance on a specific chain.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CrossChainAddress {
    /// Chain the contract lives on.
    pub chain_id: ChainId,
    /// Contract address.
    #[serde_as(as = "Hex")]
    pub address: Address,
}

impl CrossChainAddress {
    pub fn new(chain_id: ChainId, address: Address) -> Self {
        Self { chain_id, address }
    }
}

impl fmt::Display for CrossChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:0x{}", self.chain_id, hex::encode(self.address))
    }
}

/// Left-pad a big-endian integer into a 32-byte ABI word.
pub(crate) fn word_from_u128(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Left-pad an address into a 32-byte ABI word.
pub(crate) fn word_from_address(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address);
    word
}
