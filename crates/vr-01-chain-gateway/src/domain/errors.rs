//! # Domain Errors
//!
//! Error types for chain access.

use relay_types::{ChainId, TypesError};
use thiserror::Error;

use super::RevertReason;

/// Chain gateway error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Call did not complete within the configured timeout.
    #[error("{method} timed out after {after_ms}ms")]
    Timeout {
        /// Gateway method name
        method: &'static str,
        /// Timeout in milliseconds
        after_ms: u64,
    },

    /// RPC transport failure (connection dropped, node unavailable).
    #[error("Connection error: {0}")]
    Connection(String),

    /// No connection configured for a referenced chain.
    #[error("No connection for chain {0}")]
    NoConnection(ChainId),

    /// Contract call reverted.
    #[error("{method} reverted: {reason}")]
    Reverted {
        /// Gateway method name
        method: &'static str,
        /// Decoded revert reason
        reason: RevertReason,
    },

    /// Contract not deployed at the given address.
    #[error("Unknown contract: {0}")]
    UnknownContract(String),

    /// Return data could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Retrying on the next tick may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Timeout { .. } | GatewayError::Connection(_))
    }

    /// The relay cannot make progress without operator intervention.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GatewayError::NoConnection(_))
    }
}

impl From<TypesError> for GatewayError {
    fn from(err: TypesError) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

/// Result alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
