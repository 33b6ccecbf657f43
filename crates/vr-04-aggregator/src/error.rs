//! Error types for aggregation

use relay_crypto::CryptoError;
use relay_types::{KeyTag, VerificationType, VotingPower};
use thiserror::Error;

/// Aggregator errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregatorError {
    /// Valid signers do not reach the threshold yet
    #[error("Insufficient quorum: have {have}, need {need}")]
    InsufficientQuorum { have: VotingPower, need: VotingPower },

    /// Only simple (BLS aggregate) verification is implemented
    #[error("Verification type {0:?} not supported")]
    UnsupportedVerificationType(VerificationType),

    /// Key tag does not name a BLS12-381 key
    #[error("Key tag {0} is not a BLS key")]
    UnsupportedKeyTag(KeyTag),

    /// Point aggregation failed
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl AggregatorError {
    /// Insufficient quorum is the normal state while signatures arrive.
    pub fn is_insufficient_quorum(&self) -> bool {
        matches!(self, AggregatorError::InsufficientQuorum { .. })
    }
}

/// Result type for aggregator operations
pub type AggregatorResult<T> = Result<T, AggregatorError>;
