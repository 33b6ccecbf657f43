//! Pure derivation logic: no I/O, deterministic in its inputs.

pub mod derivation;
pub mod extra_data;
pub mod ssz;

pub use derivation::{build_validators, merge_voting_powers};
pub use extra_data::{extra_data_key, simple_extra_data, TOTAL_ACTIVE_VALIDATORS, VALIDATORS_KECCAK};
pub use ssz::validators_ssz_root;
