//! Key tags and key material.
//!
//! A key tag packs the signature scheme into the high nibble and a
//! per-scheme index into the low nibble, so a validator can register
//! several keys of the same scheme.

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use std::fmt;

use crate::{TypesError, TypesResult};

/// Signature scheme carried in the high nibble of a [`KeyTag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    Bls12381 = 0,
    EcdsaSecp256k1 = 1,
}

impl TryFrom<u8> for KeyType {
    type Error = TypesError;

    fn try_from(value: u8) -> TypesResult<Self> {
        match value {
            0 => Ok(KeyType::Bls12381),
            1 => Ok(KeyType::EcdsaSecp256k1),
            other => Err(TypesError::UnknownKeyType(other)),
        }
    }
}

/// Small integer identifying a key scheme and slot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct KeyTag(pub u8);

impl KeyTag {
    /// Build a tag from scheme and index.
    pub fn new(key_type: KeyType, key_id: u8) -> TypesResult<Self> {
        if key_id > 0x0f {
            return Err(TypesError::KeyIdOutOfRange(key_id));
        }
        Ok(KeyTag(((key_type as u8) << 4) | key_id))
    }

    /// Scheme encoded in the high nibble.
    pub fn key_type(&self) -> TypesResult<KeyType> {
        KeyType::try_from(self.0 >> 4)
    }

    /// Index encoded in the low nibble.
    pub fn key_id(&self) -> u8 {
        self.0 & 0x0f
    }

    pub fn is_bls(&self) -> bool {
        matches!(self.key_type(), Ok(KeyType::Bls12381))
    }
}

impl fmt::Display for KeyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key_type() {
            Ok(t) => write!(f, "{:?}/{}", t, self.key_id()),
            Err(_) => write!(f, "unknown({})", self.0),
        }
    }
}

/// Raw public-key bytes registered under a tag.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    pub tag: KeyTag,
    #[serde_as(as = "Hex")]
    pub payload: Vec<u8>,
}

impl Key {
    pub fn new(tag: KeyTag, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            payload: payload.into(),
        }
    }
}
