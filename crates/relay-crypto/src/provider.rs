//! # Crypto Provider Ports
//!
//! The aggregation and gossip code never touches curve types directly; it
//! works with raw bytes through these traits so the curve library can be
//! swapped without touching the protocol logic.

use crate::CryptoError;

/// Signature verification and aggregation for one BLS scheme.
pub trait BlsProvider: Send + Sync {
    /// Verify `signature` over `message` against `public_key`.
    ///
    /// Returns `false` for malformed inputs instead of erroring.
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool;

    /// Combine signatures by point addition in the signature group.
    fn aggregate_signatures(&self, signatures: &[&[u8]]) -> Result<Vec<u8>, CryptoError>;

    /// Combine public keys by point addition in the public key group.
    fn aggregate_public_keys(&self, public_keys: &[&[u8]]) -> Result<Vec<u8>, CryptoError>;
}

/// Holder of the local signing key.
pub trait Signer: Send + Sync {
    /// Serialized public key matching the signatures produced by `sign`.
    fn public_key(&self) -> Vec<u8>;

    /// Sign `message`.
    fn sign(&self, message: &[u8]) -> Vec<u8>;
}
