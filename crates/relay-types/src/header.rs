//! Validator set header and its EIP-712 signing digest.
//!
//! The header is ABI-encoded as eight 32-byte words in field order. The
//! settlement contract recomputes both the header hash and the typed-data
//! digest, so the encodings here must stay byte-exact.

use relay_crypto::{keccak256, keccak256_many};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::primitives::{word_from_address, word_from_u128};
use crate::{Address, ChainId, Epoch, Hash, KeyTag, Timestamp, VotingPower};

/// EIP-712 type string of the header struct.
pub const HEADER_TYPE: &str = "ValSetHeader(uint8 version,uint8 requiredKeyTag,uint48 epoch,uint48 captureTimestamp,uint256 quorumThreshold,uint256 totalVotingPower,bytes32 validatorsSszMRoot,bytes32 previousHeaderHash)";

/// EIP-712 type string of the domain struct.
pub const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Extra-data name for the number of active validators.
pub const TOTAL_ACTIVE_VALIDATORS: &str = "valset.simple.totalActiveValidators";

/// Extra-data name for the roster commitment.
pub const VALIDATORS_KECCAK: &str = "valset.simple.validatorsKeccak";

/// Namespaced extra-data key: `keccak256(keccak256(name) ‖ tag)`.
pub fn extra_data_key(name: &str, tag: KeyTag) -> Hash {
    let name_hash = keccak256(name.as_bytes());
    keccak256_many(&[&name_hash, &[tag.0]])
}

/// Compact commitment to a validator set, committed on-chain each epoch.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSetHeader {
    pub version: u8,
    pub required_key_tag: KeyTag,
    pub epoch: Epoch,
    pub capture_timestamp: Timestamp,
    pub quorum_threshold: VotingPower,
    pub total_voting_power: VotingPower,
    #[serde_as(as = "Hex")]
    pub validators_ssz_mroot: Hash,
    #[serde_as(as = "Hex")]
    pub previous_header_hash: Hash,
}

impl ValidatorSetHeader {
    /// ABI words in field order.
    pub fn abi_words(&self) -> [[u8; 32]; 8] {
        [
            word_from_u128(self.version as u128),
            word_from_u128(self.required_key_tag.0 as u128),
            word_from_u128(self.epoch as u128),
            word_from_u128(self.capture_timestamp as u128),
            word_from_u128(self.quorum_threshold),
            word_from_u128(self.total_voting_power),
            self.validators_ssz_mroot,
            self.previous_header_hash,
        ]
    }

    /// Keccak-256 of the ABI encoding.
    ///
    /// Becomes the `previous_header_hash` of the following epoch.
    pub fn hash(&self) -> Hash {
        let words = self.abi_words();
        let refs: Vec<&[u8]> = words.iter().map(|w| w.as_slice()).collect();
        keccak256_many(&refs)
    }

    /// EIP-712 struct hash: keccak256(typeHash ‖ words).
    pub fn struct_hash(&self) -> Hash {
        let type_hash = keccak256(HEADER_TYPE.as_bytes());
        let words = self.abi_words();
        let mut refs: Vec<&[u8]> = Vec::with_capacity(9);
        refs.push(&type_hash);
        refs.extend(words.iter().map(|w| w.as_slice()));
        keccak256_many(&refs)
    }

    /// Message validators sign: keccak256(0x19 0x01 ‖ domainSeparator ‖ structHash).
    pub fn signing_digest(&self, domain: &Eip712Domain) -> Hash {
        let separator = domain.separator();
        let struct_hash = self.struct_hash();
        keccak256_many(&[&[0x19, 0x01], &separator, &struct_hash])
    }
}

/// EIP-712 domain of a settlement contract.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
    pub chain_id: ChainId,
    #[serde_as(as = "Hex")]
    pub verifying_contract: Address,
}

impl Eip712Domain {
    pub fn separator(&self) -> Hash {
        let type_hash = keccak256(DOMAIN_TYPE.as_bytes());
        let name_hash = keccak256(self.name.as_bytes());
        let version_hash = keccak256(self.version.as_bytes());
        let chain_id = word_from_u128(self.chain_id as u128);
        let contract = word_from_address(&self.verifying_contract);
        keccak256_many(&[&type_hash, &name_hash, &version_hash, &chain_id, &contract])
    }
}

/// Auxiliary key/value submitted alongside a header.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExtraData {
    #[serde_as(as = "Hex")]
    pub key: Hash,
    #[serde_as(as = "Hex")]
    pub value: Hash,
}
