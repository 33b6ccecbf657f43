//! Extra data submitted with a header for simple verification.
//!
//! Two entries per header key tag: the number of active validators and the
//! keccak commitment to the set's [`Roster`]. A later header signed by this
//! set is checked against that commitment. Entry keys are
//! `keccak256(keccak256(name) ‖ tag)`.

use relay_types::{ExtraData, Roster, ValidatorSet};

pub use relay_types::{extra_data_key, TOTAL_ACTIVE_VALIDATORS, VALIDATORS_KECCAK};

/// Entries for the simple verification type, sorted by key.
pub fn simple_extra_data(valset: &ValidatorSet) -> Vec<ExtraData> {
    let tag = valset.required_key_tag;
    let active = valset.active_validators().count();

    let mut count = [0u8; 32];
    count[24..].copy_from_slice(&(active as u64).to_be_bytes());

    let mut entries = vec![
        ExtraData {
            key: extra_data_key(TOTAL_ACTIVE_VALIDATORS, tag),
            value: count,
        },
        ExtraData {
            key: extra_data_key(VALIDATORS_KECCAK, tag),
            value: Roster::from_valset(valset, tag).commitment(),
        },
    ];
    entries.sort();
    entries
}
