//! Errors for decoding and validating shared types.

use thiserror::Error;

/// Errors raised while decoding or validating shared types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypesError {
    /// Proof bytes are shorter than the fixed prefix or the declared bitmap.
    #[error("Aggregation proof truncated: need {expected} bytes, got {actual}")]
    ProofTruncated { expected: usize, actual: usize },

    /// Trailing bytes after the declared bitmap.
    #[error("Aggregation proof has {0} trailing bytes")]
    ProofTrailingBytes(usize),

    /// Key type nibble does not name a known scheme.
    #[error("Unknown key type {0}")]
    UnknownKeyType(u8),

    /// Key id does not fit in the low nibble.
    #[error("Key id {0} out of range (max 15)")]
    KeyIdOutOfRange(u8),

    /// Verification type value is not known.
    #[error("Unknown verification type {0}")]
    UnknownVerificationType(u32),
}

/// Result alias for shared-type operations.
pub type TypesResult<T> = Result<T, TypesError>;
