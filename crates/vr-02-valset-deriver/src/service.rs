//! Validator Set Deriver Service
//!
//! Reads operator data through the chain gateway and turns it into the
//! canonical validator set, header and extra data for an epoch.

use futures::future::try_join_all;
use relay_types::{
    CrossChainAddress, Epoch, ExtraData, NetworkConfig, ValidatorSet, ValidatorSetHeader,
    VerificationType, ZERO_HASH,
};
use std::sync::Arc;
use tracing::debug;
use vr_01_chain_gateway::ChainGateway;

use crate::domain::{build_validators, merge_voting_powers, simple_extra_data, validators_ssz_root};
use crate::error::{DeriverError, DeriverResult};

/// Header format version.
pub const VALSET_VERSION: u8 = 1;

/// Validator set deriver
pub struct ValidatorSetDeriver<G: ChainGateway> {
    gateway: Arc<G>,
    driver: CrossChainAddress,
}

impl<G: ChainGateway> ValidatorSetDeriver<G> {
    pub fn new(gateway: Arc<G>, driver: CrossChainAddress) -> Self {
        Self { gateway, driver }
    }

    /// Derive the canonical validator set for `epoch`.
    pub async fn get_validator_set(
        &self,
        epoch: Epoch,
        config: &NetworkConfig,
    ) -> DeriverResult<ValidatorSet> {
        let threshold = config
            .threshold_for(config.required_header_key_tag)
            .copied()
            .ok_or(DeriverError::MissingQuorumThreshold(
                config.required_header_key_tag,
            ))?;
        let primary = *config.primary_replica().ok_or(DeriverError::NoReplicas)?;

        let capture_timestamp = self.gateway.get_epoch_start(&self.driver, epoch).await?;

        let power_reads = try_join_all(
            config
                .voting_power_providers
                .iter()
                .map(|provider| self.gateway.get_voting_powers(provider, capture_timestamp)),
        )
        .await?;
        let keys = self
            .gateway
            .get_keys(&config.keys_provider, capture_timestamp)
            .await?;

        let validators = build_validators(config, merge_voting_powers(power_reads), keys);

        let previous_header_hash = if epoch == 0 {
            ZERO_HASH
        } else {
            self.gateway
                .get_valset_header_at(&primary, epoch - 1)
                .await?
                .map(|h| h.hash())
                .unwrap_or(ZERO_HASH)
        };

        let mut valset = ValidatorSet {
            version: VALSET_VERSION,
            required_key_tag: config.required_header_key_tag,
            epoch,
            capture_timestamp,
            quorum_threshold: 0,
            previous_header_hash,
            total_active_voting_power: 0,
            validators,
        };
        valset.total_active_voting_power = valset.compute_active_voting_power();
        valset.quorum_threshold = threshold.absolute(valset.total_active_voting_power);

        debug!(
            "[vr-02] Derived validator set for epoch {}: {} validators, active power {}, threshold {}",
            epoch,
            valset.validators.len(),
            valset.total_active_voting_power,
            valset.quorum_threshold
        );
        Ok(valset)
    }

    /// Header committing to `valset`.
    pub fn make_header(&self, valset: &ValidatorSet) -> DeriverResult<ValidatorSetHeader> {
        make_header(valset)
    }

    /// Extra data to submit alongside the header.
    pub fn extra_data(
        &self,
        valset: &ValidatorSet,
        verification_type: VerificationType,
    ) -> DeriverResult<Vec<ExtraData>> {
        extra_data(valset, verification_type)
    }
}

/// Header committing to `valset`.
pub fn make_header(valset: &ValidatorSet) -> DeriverResult<ValidatorSetHeader> {
    Ok(ValidatorSetHeader {
        version: valset.version,
        required_key_tag: valset.required_key_tag,
        epoch: valset.epoch,
        capture_timestamp: valset.capture_timestamp,
        quorum_threshold: valset.quorum_threshold,
        total_voting_power: valset.total_active_voting_power,
        validators_ssz_mroot: validators_ssz_root(&valset.validators)?,
        previous_header_hash: valset.previous_header_hash,
    })
}

/// Extra data for `verification_type`.
pub fn extra_data(
    valset: &ValidatorSet,
    verification_type: VerificationType,
) -> DeriverResult<Vec<ExtraData>> {
    match verification_type {
        VerificationType::Simple => Ok(simple_extra_data(valset)),
        VerificationType::Zk => Err(DeriverError::UnsupportedVerificationType(
            verification_type,
        )),
    }
}
