//! # vr-04-aggregator
//!
//! Combines gossiped partial BLS signatures into a quorum proof for a
//! validator set header, and verifies such proofs.
//!
//! ## Soundness
//!
//! A proof is only produced when the distinct, verified signatures of active
//! members reach `quorum_threshold`. Anything else (non-members, inactive
//! validators, wrong key tag, another digest or epoch) is silently left out.
//!
//! ```text
//! e(aggregate_signature, G2) == e(H(message_hash), Σ pk_i  for i in bitmap)
//! ```

pub mod domain;
pub mod error;
pub mod service;

pub use domain::Contribution;
pub use error::{AggregatorError, AggregatorResult};
pub use service::{Aggregator, QuorumTally};
