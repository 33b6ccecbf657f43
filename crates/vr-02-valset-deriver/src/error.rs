//! Error types for validator set derivation

use relay_types::{KeyTag, VerificationType};
use thiserror::Error;
use vr_01_chain_gateway::GatewayError;

/// Deriver errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeriverError {
    /// Chain read failed
    #[error("Chain read failed: {0}")]
    Gateway(#[from] GatewayError),

    /// No quorum threshold configured for the header key tag
    #[error("No quorum threshold configured for key tag {0}")]
    MissingQuorumThreshold(KeyTag),

    /// Network config lists no settlement replicas
    #[error("Network config has no settlement replicas")]
    NoReplicas,

    /// An SSZ list exceeds its declared limit
    #[error("SSZ list {what} has {len} items, limit {limit}")]
    SszLimitExceeded {
        what: &'static str,
        len: usize,
        limit: usize,
    },

    /// Extra data cannot be produced for this verification type
    #[error("Verification type {0:?} not supported")]
    UnsupportedVerificationType(VerificationType),
}

impl DeriverError {
    /// Configuration problems that retrying cannot fix.
    pub fn is_fatal(&self) -> bool {
        match self {
            DeriverError::Gateway(e) => e.is_fatal(),
            DeriverError::MissingQuorumThreshold(_) | DeriverError::NoReplicas => true,
            _ => false,
        }
    }
}

/// Result type for deriver operations
pub type DeriverResult<T> = Result<T, DeriverError>;
