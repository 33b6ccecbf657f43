//! # Relay Crypto
//!
//! Cryptographic primitives used by the valset relay.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `bls` | BLS12-381 (`min_sig`) | Header signing, signature/key aggregation |
//! | `hashing` | Keccak-256, SHA-256 | Header digests, SSZ merkleisation |
//! | `provider` | - | Capability traits the aggregation code is written against |
//!
//! ## Group Layout
//!
//! Signatures live on G1 (48 bytes compressed), public keys on G2 (96 bytes
//! compressed). An aggregate signature verifies against the sum of the
//! signers' public keys with a single pairing check:
//!
//! ```text
//! e(aggregate_signature, G2) == e(H(message), aggregate_public_key)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bls;
pub mod errors;
pub mod hashing;
pub mod provider;

// Re-exports
pub use bls::{
    Bls12381Provider, BlsKeyPair, BlsPublicKey, BlsSecretKey, BlsSignature, PUBLIC_KEY_LENGTH,
    SIGNATURE_LENGTH,
};
pub use errors::CryptoError;
pub use hashing::{keccak256, keccak256_many, sha256, sha256_pair, Hash};
pub use provider::{BlsProvider, Signer};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
