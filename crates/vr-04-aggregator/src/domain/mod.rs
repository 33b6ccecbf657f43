//! Signer selection.

pub mod signers;

pub use signers::{select_signers, total_power, Contribution, PARALLEL_THRESHOLD};
