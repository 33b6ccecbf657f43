//! BLS12-381 Signature Implementation
//!
//! Provides BLS signature primitives for:
//! - Key generation
//! - Sign/verify operations
//! - Signature and public key aggregation
//!
//! Uses blst's `min_sig` variant: signatures on G1 (48 bytes), public keys on
//! G2 (96 bytes). Signatures are verified with proof-of-possession semantics,
//! so same-message aggregation is sound as long as the keys came from the
//! on-chain key registry.

use blst::min_sig::{AggregatePublicKey, AggregateSignature, PublicKey, SecretKey, Signature};
use blst::BLST_ERROR;
use rand::RngCore;
use zeroize::Zeroize;

use crate::{BlsProvider, CryptoError, Signer};

/// Domain separation tag for G1 signatures (hash-to-G1, proof-of-possession suite)
const DST: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_POP_";

/// Compressed G1 signature length
pub const SIGNATURE_LENGTH: usize = 48;

/// Compressed G2 public key length
pub const PUBLIC_KEY_LENGTH: usize = 96;

/// BLS secret key wrapper (32 bytes)
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct BlsSecretKey([u8; 32]);

impl BlsSecretKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(*bytes)
    }

    /// Parse from a hex string (with or without `0x` prefix)
    pub fn from_hex(value: &str) -> Result<Self, CryptoError> {
        let raw = hex::decode(value.trim_start_matches("0x"))
            .map_err(|_| CryptoError::InvalidPrivateKey)?;
        let bytes: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                actual: raw.len(),
            })?;
        Ok(Self(bytes))
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for BlsSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BlsSecretKey(..)")
    }
}

/// BLS public key (96 bytes compressed, G2)
#[derive(Clone, Debug)]
pub struct BlsPublicKey(PublicKey);

impl PartialEq for BlsPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for BlsPublicKey {}

/// BLS signature (48 bytes compressed, G1)
#[derive(Clone, Debug)]
pub struct BlsSignature(Signature);

impl PartialEq for BlsSignature {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for BlsSignature {}

/// BLS key pair for signing operations
pub struct BlsKeyPair {
    secret: SecretKey,
    public: BlsPublicKey,
}

impl BlsKeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Result<Self, CryptoError> {
        let mut ikm = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut ikm);
        let pair = Self::from_seed(&ikm);
        ikm.zeroize();
        pair
    }

    /// Derive a key pair from 32 bytes of input key material
    pub fn from_seed(ikm: &[u8; 32]) -> Result<Self, CryptoError> {
        let secret = SecretKey::key_gen(ikm, &[]).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let public = BlsPublicKey(secret.sk_to_pk());
        Ok(Self { secret, public })
    }

    /// Create from existing secret key bytes
    pub fn from_secret(secret: &BlsSecretKey) -> Result<Self, CryptoError> {
        let secret =
            SecretKey::from_bytes(secret.as_bytes()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let public = BlsPublicKey(secret.sk_to_pk());
        Ok(Self { secret, public })
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> BlsSignature {
        BlsSignature(self.secret.sign(message, DST, &[]))
    }

    /// Get the public key
    pub fn public_key(&self) -> BlsPublicKey {
        self.public.clone()
    }

    /// Get the secret key bytes (be careful with this!)
    pub fn secret(&self) -> BlsSecretKey {
        BlsSecretKey(self.secret.to_bytes())
    }
}

impl Signer for BlsKeyPair {
    fn public_key(&self) -> Vec<u8> {
        self.public.to_bytes().to_vec()
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        BlsKeyPair::sign(self, message).to_bytes().to_vec()
    }
}

impl BlsPublicKey {
    /// Verify a signature against this public key
    pub fn verify(&self, message: &[u8], signature: &BlsSignature) -> bool {
        signature.0.verify(true, message, DST, &[], &self.0, true) == BLST_ERROR::BLST_SUCCESS
    }

    /// Parse from the 96-byte compressed representation
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: PUBLIC_KEY_LENGTH,
                actual: bytes.len(),
            });
        }
        PublicKey::from_bytes(bytes)
            .map(BlsPublicKey)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Serialize to 96-byte compressed form
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Aggregate multiple public keys into one
    pub fn aggregate(keys: &[BlsPublicKey]) -> Result<Self, CryptoError> {
        if keys.is_empty() {
            return Err(CryptoError::EmptyAggregation("public key"));
        }
        let refs: Vec<&PublicKey> = keys.iter().map(|k| &k.0).collect();
        AggregatePublicKey::aggregate(&refs, true)
            .map(|apk| BlsPublicKey(apk.to_public_key()))
            .map_err(|_| CryptoError::AggregationFailed)
    }
}

impl BlsSignature {
    /// Parse from the 48-byte compressed representation
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(CryptoError::InvalidSignature);
        }
        Signature::from_bytes(bytes)
            .map(BlsSignature)
            .map_err(|_| CryptoError::InvalidSignature)
    }

    /// Serialize to 48-byte compressed form
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0.to_bytes()
    }

    /// Aggregate multiple signatures into one
    pub fn aggregate(sigs: &[BlsSignature]) -> Result<Self, CryptoError> {
        if sigs.is_empty() {
            return Err(CryptoError::EmptyAggregation("signature"));
        }
        let refs: Vec<&Signature> = sigs.iter().map(|s| &s.0).collect();
        AggregateSignature::aggregate(&refs, true)
            .map(|asig| BlsSignature(asig.to_signature()))
            .map_err(|_| CryptoError::AggregationFailed)
    }
}

/// [`BlsProvider`] backed by blst.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bls12381Provider;

impl Bls12381Provider {
    /// Create a new provider.
    pub fn new() -> Self {
        Self
    }
}

impl BlsProvider for Bls12381Provider {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let Ok(pk) = BlsPublicKey::from_bytes(public_key) else {
            return false;
        };
        let Ok(sig) = BlsSignature::from_bytes(signature) else {
            return false;
        };
        pk.verify(message, &sig)
    }

    fn aggregate_signatures(&self, signatures: &[&[u8]]) -> Result<Vec<u8>, CryptoError> {
        let parsed = signatures
            .iter()
            .map(|bytes| BlsSignature::from_bytes(bytes))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BlsSignature::aggregate(&parsed)?.to_bytes().to_vec())
    }

    fn aggregate_public_keys(&self, public_keys: &[&[u8]]) -> Result<Vec<u8>, CryptoError> {
        let parsed = public_keys
            .iter()
            .map(|bytes| BlsPublicKey::from_bytes(bytes))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BlsPublicKey::aggregate(&parsed)?.to_bytes().to_vec())
    }
}
