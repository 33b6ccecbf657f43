//! Signature messages, aggregation proofs and transaction receipts.

use bitvec::prelude::*;
use relay_crypto::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::{Epoch, Hash, KeyTag, Roster, TypesError, TypesResult, VotingPower};

/// A partial signature over a header digest.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureMessage {
    pub epoch: Epoch,
    #[serde_as(as = "Hex")]
    pub message_hash: Hash,
    #[serde_as(as = "Hex")]
    pub signature: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub public_key: Vec<u8>,
}

/// Fixed prefix: signature, aggregate key, voting power, bitmap length.
const PROOF_PREFIX_LEN: usize = SIGNATURE_LENGTH + PUBLIC_KEY_LENGTH + 16 + 4;

/// Quorum proof over a header digest.
///
/// The signer bitmap has one bit per validator in canonical order
/// (most significant bit first within each byte).
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationProof {
    pub key_tag: KeyTag,
    #[serde_as(as = "Hex")]
    pub message_hash: Hash,
    /// Aggregated signature (G1)
    #[serde_as(as = "Hex")]
    pub signature: [u8; SIGNATURE_LENGTH],
    /// Aggregated public key of the signers (G2)
    #[serde_as(as = "Hex")]
    pub aggregated_public_key: [u8; PUBLIC_KEY_LENGTH],
    /// Total voting power of the signers
    pub voting_power: VotingPower,
    /// Participation bitmap showing which validators signed
    #[serde_as(as = "Hex")]
    pub signers_bitmap: Vec<u8>,
}

impl AggregationProof {
    pub fn new(
        key_tag: KeyTag,
        message_hash: Hash,
        signature: [u8; SIGNATURE_LENGTH],
        aggregated_public_key: [u8; PUBLIC_KEY_LENGTH],
        voting_power: VotingPower,
        signers: BitVec<u8, Msb0>,
    ) -> Self {
        Self {
            key_tag,
            message_hash,
            signature,
            aggregated_public_key,
            voting_power,
            signers_bitmap: signers.into_vec(),
        }
    }

    /// Bitmap as a bit slice.
    pub fn signers(&self) -> &BitSlice<u8, Msb0> {
        self.signers_bitmap.view_bits::<Msb0>()
    }

    /// Whether the validator at canonical `index` signed.
    pub fn is_signer(&self, index: usize) -> bool {
        self.signers().get(index).map(|b| *b).unwrap_or(false)
    }

    /// Get participant count from bitmap
    pub fn signer_count(&self) -> usize {
        self.signers().count_ones()
    }

    /// On-chain encoding:
    /// `sig(48) ‖ apk(96) ‖ voting_power(u128 BE) ‖ bitmap_len(u32 BE) ‖ bitmap`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PROOF_PREFIX_LEN + self.signers_bitmap.len());
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&self.aggregated_public_key);
        out.extend_from_slice(&self.voting_power.to_be_bytes());
        out.extend_from_slice(&(self.signers_bitmap.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.signers_bitmap);
        out
    }

    /// Decode the on-chain encoding. Tag and digest travel out of band.
    pub fn from_bytes(key_tag: KeyTag, message_hash: Hash, bytes: &[u8]) -> TypesResult<Self> {
        let (proof, rest) = Self::decode_prefix(key_tag, message_hash, bytes)?;
        if !rest.is_empty() {
            return Err(TypesError::ProofTrailingBytes(rest.len()));
        }
        Ok(proof)
    }

    /// Decode a proof from the front of `bytes`, returning the remainder.
    pub fn decode_prefix(
        key_tag: KeyTag,
        message_hash: Hash,
        bytes: &[u8],
    ) -> TypesResult<(Self, &[u8])> {
        if bytes.len() < PROOF_PREFIX_LEN {
            return Err(TypesError::ProofTruncated {
                expected: PROOF_PREFIX_LEN,
                actual: bytes.len(),
            });
        }
        let (signature, rest) = bytes.split_at(SIGNATURE_LENGTH);
        let (apk, rest) = rest.split_at(PUBLIC_KEY_LENGTH);
        let (vp, rest) = rest.split_at(16);
        let (len, rest) = rest.split_at(4);

        let mut vp_buf = [0u8; 16];
        vp_buf.copy_from_slice(vp);
        let mut len_buf = [0u8; 4];
        len_buf.copy_from_slice(len);
        let bitmap_len = u32::from_be_bytes(len_buf) as usize;

        if rest.len() < bitmap_len {
            return Err(TypesError::ProofTruncated {
                expected: PROOF_PREFIX_LEN + bitmap_len,
                actual: bytes.len(),
            });
        }
        let (bitmap, rest) = rest.split_at(bitmap_len);

        let mut sig_buf = [0u8; SIGNATURE_LENGTH];
        sig_buf.copy_from_slice(signature);
        let mut apk_buf = [0u8; PUBLIC_KEY_LENGTH];
        apk_buf.copy_from_slice(apk);

        let proof = Self {
            key_tag,
            message_hash,
            signature: sig_buf,
            aggregated_public_key: apk_buf,
            voting_power: u128::from_be_bytes(vp_buf),
            signers_bitmap: bitmap.to_vec(),
        };
        Ok((proof, rest))
    }
}

/// What a header commit carries: the aggregate over the committee's
/// signatures and the committee roster its bitmap indexes into.
///
/// Settlement checks the roster against the commitment stored with the
/// committee's header and recomputes the aggregate key and power from it.
/// The aggregate key and power inside `aggregate` are informational.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementProof {
    pub aggregate: AggregationProof,
    pub roster: Roster,
}

impl SettlementProof {
    pub fn new(aggregate: AggregationProof, roster: Roster) -> Self {
        Self { aggregate, roster }
    }

    /// `aggregation proof ‖ roster`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.aggregate.to_bytes();
        out.extend_from_slice(&self.roster.to_bytes());
        out
    }

    pub fn from_bytes(key_tag: KeyTag, message_hash: Hash, bytes: &[u8]) -> TypesResult<Self> {
        let (aggregate, rest) = AggregationProof::decode_prefix(key_tag, message_hash, bytes)?;
        let (roster, rest) = Roster::decode_prefix(rest)?;
        if !rest.is_empty() {
            return Err(TypesError::ProofTrailingBytes(rest.len()));
        }
        Ok(Self { aggregate, roster })
    }
}

/// Receipt of a state-mutating chain call.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    #[serde_as(as = "Hex")]
    pub tx_hash: Hash,
    pub gas_used: u64,
}
