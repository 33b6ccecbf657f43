//! Aggregator service.

use std::sync::Arc;

use bitvec::prelude::*;
use relay_crypto::{BlsProvider, CryptoError, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use relay_types::{
    AggregationProof, Epoch, Hash, KeyTag, SignatureMessage, ValidatorSet, VerificationType,
    VotingPower,
};
use tracing::{debug, warn};

use crate::domain::{select_signers, total_power};
use crate::error::{AggregatorError, AggregatorResult};

/// Current standing of collected signatures against the threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuorumTally {
    pub signers: usize,
    pub have: VotingPower,
    pub need: VotingPower,
}

impl QuorumTally {
    pub fn is_met(&self) -> bool {
        self.signers > 0 && self.have >= self.need
    }
}

/// Combines partial signatures into quorum proofs and checks proofs.
pub struct Aggregator {
    provider: Arc<dyn BlsProvider>,
}

impl Aggregator {
    pub fn new(provider: Arc<dyn BlsProvider>) -> Self {
        Self { provider }
    }

    fn check_scheme(key_tag: KeyTag, verification_type: VerificationType) -> AggregatorResult<()> {
        if verification_type != VerificationType::Simple {
            return Err(AggregatorError::UnsupportedVerificationType(
                verification_type,
            ));
        }
        if !key_tag.is_bls() {
            return Err(AggregatorError::UnsupportedKeyTag(key_tag));
        }
        Ok(())
    }

    /// Voting power of the valid distinct signers for `message_hash`.
    pub fn tally(
        &self,
        valset: &ValidatorSet,
        key_tag: KeyTag,
        message_hash: &Hash,
        signatures: &[SignatureMessage],
    ) -> QuorumTally {
        self.tally_at(valset.epoch, valset, key_tag, message_hash, signatures)
    }

    /// [`Aggregator::tally`] for signatures of `epoch` counted against a
    /// committee derived for an earlier epoch.
    pub fn tally_at(
        &self,
        epoch: Epoch,
        valset: &ValidatorSet,
        key_tag: KeyTag,
        message_hash: &Hash,
        signatures: &[SignatureMessage],
    ) -> QuorumTally {
        let signers = select_signers(
            valset,
            epoch,
            key_tag,
            message_hash,
            signatures,
            self.provider.as_ref(),
        );
        QuorumTally {
            signers: signers.len(),
            have: total_power(&signers),
            need: valset.quorum_threshold,
        }
    }

    /// Build a quorum proof over `message_hash`.
    ///
    /// Fails with [`AggregatorError::InsufficientQuorum`] unless the distinct
    /// member signers reach `valset.quorum_threshold`.
    pub fn aggregate(
        &self,
        valset: &ValidatorSet,
        key_tag: KeyTag,
        verification_type: VerificationType,
        message_hash: &Hash,
        signatures: &[SignatureMessage],
    ) -> AggregatorResult<AggregationProof> {
        self.aggregate_at(
            valset.epoch,
            valset,
            key_tag,
            verification_type,
            message_hash,
            signatures,
        )
    }

    /// Build a proof over signatures of `epoch` from the members of
    /// `valset`, typically the set committed for an earlier epoch.
    ///
    /// The bitmap indexes `valset` and the threshold is
    /// `valset.quorum_threshold`.
    pub fn aggregate_at(
        &self,
        epoch: Epoch,
        valset: &ValidatorSet,
        key_tag: KeyTag,
        verification_type: VerificationType,
        message_hash: &Hash,
        signatures: &[SignatureMessage],
    ) -> AggregatorResult<AggregationProof> {
        Self::check_scheme(key_tag, verification_type)?;

        let signers = select_signers(
            valset,
            epoch,
            key_tag,
            message_hash,
            signatures,
            self.provider.as_ref(),
        );
        let have = total_power(&signers);
        let need = valset.quorum_threshold;
        if signers.is_empty() || have < need {
            debug!(
                epoch,
                committee_epoch = valset.epoch,
                signers = signers.len(),
                have,
                need,
                "[vr-04] Quorum not reached"
            );
            return Err(AggregatorError::InsufficientQuorum { have, need });
        }

        let sigs: Vec<&[u8]> = signers.iter().map(|c| c.signature.as_slice()).collect();
        let keys: Vec<&[u8]> = signers.iter().map(|c| c.public_key.as_slice()).collect();
        let signature = self.provider.aggregate_signatures(&sigs)?;
        let aggregated_public_key = self.provider.aggregate_public_keys(&keys)?;

        let mut bitmap = bitvec![u8, Msb0; 0; valset.validators.len()];
        for c in &signers {
            bitmap.set(c.index, true);
        }

        debug!(
            epoch,
            committee_epoch = valset.epoch,
            signers = signers.len(),
            voting_power = have,
            "[vr-04] Aggregated quorum proof"
        );

        Ok(AggregationProof::new(
            key_tag,
            *message_hash,
            to_array::<SIGNATURE_LENGTH>(&signature, CryptoError::InvalidSignature)?,
            to_array::<PUBLIC_KEY_LENGTH>(&aggregated_public_key, CryptoError::InvalidPublicKey)?,
            have,
            bitmap,
        ))
    }

    /// Check a proof against the validator set.
    ///
    /// The aggregate key is re-derived from the bitmap, the signers' power
    /// must match the proof and reach the threshold, and the aggregate
    /// signature must pass the pairing check.
    pub fn verify(&self, valset: &ValidatorSet, key_tag: KeyTag, proof: &AggregationProof) -> bool {
        if proof.key_tag != key_tag || !key_tag.is_bls() {
            return false;
        }

        let bits = proof.signers();
        if bits.len() < valset.validators.len() || bits[valset.validators.len()..].any() {
            warn!(epoch = valset.epoch, "[vr-04] Proof bitmap does not fit validator set");
            return false;
        }

        let mut keys: Vec<&[u8]> = Vec::with_capacity(bits.count_ones());
        let mut power: VotingPower = 0;
        for index in bits.iter_ones() {
            let validator = &valset.validators[index];
            let key = match validator.key(key_tag) {
                Some(key) if validator.counts_toward_quorum() => key,
                _ => return false,
            };
            keys.push(&key.payload);
            power = power.saturating_add(validator.voting_power);
        }

        if keys.is_empty() || power != proof.voting_power || power < valset.quorum_threshold {
            return false;
        }

        let derived = match self.provider.aggregate_public_keys(&keys) {
            Ok(apk) => apk,
            Err(_) => return false,
        };
        if derived.as_slice() != proof.aggregated_public_key.as_slice() {
            return false;
        }

        self.provider
            .verify(&derived, &proof.message_hash, &proof.signature)
    }
}

fn to_array<const N: usize>(bytes: &[u8], err: CryptoError) -> AggregatorResult<[u8; N]> {
    bytes.try_into().map_err(|_| AggregatorError::Crypto(err))
}
