//! # vr-02-valset-deriver
//!
//! Builds the canonical validator set for an epoch from chain reads.
//!
//! ## Overview
//!
//! 1. Voting power is read from every provider at the epoch's capture
//!    timestamp (concurrently) and merged per operator.
//! 2. Keys are read from the key registry and joined by operator; an
//!    operator without a key for the header key tag stays in the set as
//!    inactive.
//! 3. Power is capped, small operators are dropped and the set is truncated
//!    to `max_validators_count` (active first, then power, then address).
//! 4. Validators are sorted by address and committed to with an SSZ root.
//!
//! Identical inputs produce a byte-identical header regardless of the order
//! in which providers respond or list operators.
//!
//! ## Example
//!
//! ```rust,ignore
//! let deriver = ValidatorSetDeriver::new(gateway, driver);
//! let valset = deriver.get_validator_set(epoch, &config).await?;
//! let header = deriver.make_header(&valset)?;
//! let extra = deriver.extra_data(&valset, config.verification_type)?;
//! ```

pub mod domain;
pub mod error;
pub mod service;

pub use error::{DeriverError, DeriverResult};
pub use service::{extra_data, make_header, ValidatorSetDeriver, VALSET_VERSION};
