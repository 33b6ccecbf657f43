//! # Relay Types Crate
//!
//! Data model shared by every relay subsystem.
//!
//! ## Clusters
//!
//! - **Primitives**: `Address`, `Hash`, `Epoch`, `Timestamp`, `CrossChainAddress`
//! - **Keys**: `KeyTag`, `KeyType`, `Key`
//! - **Validator set**: `Vault`, `Validator`, `ValidatorSet`, raw provider reads
//! - **Header**: `ValidatorSetHeader`, `Eip712Domain`, `ExtraData`
//! - **Configuration**: `NetworkConfig`, `QuorumThreshold`, `VerificationType`
//! - **Proofs**: `SignatureMessage`, `AggregationProof`, `SettlementProof`, `TxResult`
//! - **Committees**: `Roster`, the signing set a settlement proof is checked against
//!
//! Validator sets and headers are recomputed every epoch from chain reads;
//! they are replaced, never mutated.

pub mod config;
pub mod errors;
pub mod header;
pub mod keys;
pub mod phase;
pub mod primitives;
pub mod proof;
pub mod roster;
pub mod validator;

pub use config::{NetworkConfig, QuorumThreshold, VerificationType, THRESHOLD_PRECISION};
pub use errors::{TypesError, TypesResult};
pub use header::{
    extra_data_key, Eip712Domain, ExtraData, ValidatorSetHeader, TOTAL_ACTIVE_VALIDATORS,
    VALIDATORS_KECCAK,
};
pub use keys::{Key, KeyTag, KeyType};
pub use phase::Phase;
pub use primitives::{
    Address, ChainId, CrossChainAddress, Epoch, Hash, Timestamp, VotingPower, ZERO_HASH,
};
pub use proof::{AggregationProof, SettlementProof, SignatureMessage, TxResult};
pub use roster::{Roster, RosterEntry, ROSTER_ENTRY_LEN};
pub use validator::{OperatorVotingPower, OperatorWithKeys, Validator, ValidatorSet, Vault};

// Re-export U256 so downstream crates share one definition.
pub use primitive_types::U256;
