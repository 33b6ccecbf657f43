//! Error types for signature gossip

use relay_crypto::CryptoError;
use thiserror::Error;

/// Gossip errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GossipError {
    /// Frame exceeds the single-read bound
    #[error("Frame of {size} bytes exceeds limit of {max}")]
    FrameTooLarge { size: usize, max: usize },

    /// Envelope or payload could not be decoded
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// Envelope type not handled
    #[error("Unknown message type: {0}")]
    UnknownType(String),

    /// Signature does not verify against its claimed key
    #[error("Signature does not verify against claimed public key")]
    InvalidSignature,

    /// Peer could not be reached
    #[error("Peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: String, reason: String },

    /// Socket error
    #[error("I/O error: {0}")]
    Io(String),

    /// Local signing or key error
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl From<std::io::Error> for GossipError {
    fn from(err: std::io::Error) -> Self {
        GossipError::Io(err.to_string())
    }
}

/// Result type for gossip operations
pub type GossipResult<T> = Result<T, GossipError>;
