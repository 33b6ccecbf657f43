//! # Outbound Ports
//!
//! The narrow contract the relay core depends on for all chain access.
//!
//! Each method addresses one contract instance by [`CrossChainAddress`]:
//! the driver for config and epoch schedule, voting-power providers and the
//! key registry for operator data, and settlement replicas for headers.

use async_trait::async_trait;
use relay_types::{
    CrossChainAddress, Eip712Domain, Epoch, ExtraData, Hash, KeyTag, NetworkConfig,
    OperatorVotingPower, OperatorWithKeys, Timestamp, TxResult, ValidatorSetHeader, VotingPower,
};
use std::sync::Arc;

use crate::domain::GatewayResult;

/// Chain access - outbound port.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Network configuration declared on the driver at `timestamp`.
    async fn get_config(
        &self,
        driver: &CrossChainAddress,
        timestamp: Timestamp,
    ) -> GatewayResult<NetworkConfig>;

    /// Current epoch according to the driver.
    async fn get_current_epoch(&self, driver: &CrossChainAddress) -> GatewayResult<Epoch>;

    /// Start (capture) timestamp of `epoch`.
    async fn get_epoch_start(
        &self,
        driver: &CrossChainAddress,
        epoch: Epoch,
    ) -> GatewayResult<Timestamp>;

    /// Duration of `epoch` in seconds.
    async fn get_epoch_duration(
        &self,
        driver: &CrossChainAddress,
        epoch: Epoch,
    ) -> GatewayResult<u64>;

    /// Header committed for `epoch`, if any.
    async fn get_valset_header_at(
        &self,
        settlement: &CrossChainAddress,
        epoch: Epoch,
    ) -> GatewayResult<Option<ValidatorSetHeader>>;

    async fn is_valset_header_committed_at(
        &self,
        settlement: &CrossChainAddress,
        epoch: Epoch,
    ) -> GatewayResult<bool>;

    /// Per-operator voting power at `timestamp`.
    async fn get_voting_powers(
        &self,
        provider: &CrossChainAddress,
        timestamp: Timestamp,
    ) -> GatewayResult<Vec<OperatorVotingPower>>;

    /// Per-operator keys at `timestamp`.
    async fn get_keys(
        &self,
        keys_provider: &CrossChainAddress,
        timestamp: Timestamp,
    ) -> GatewayResult<Vec<OperatorWithKeys>>;

    /// Submit a header with its quorum proof.
    async fn commit_valset_header(
        &self,
        settlement: &CrossChainAddress,
        header: &ValidatorSetHeader,
        extra_data: &[ExtraData],
        proof: &[u8],
    ) -> GatewayResult<TxResult>;

    /// Epoch of the newest header on `settlement`, `None` before genesis.
    async fn get_last_committed_header_epoch(
        &self,
        settlement: &CrossChainAddress,
    ) -> GatewayResult<Option<Epoch>>;

    /// Install the first header without a proof.
    async fn set_genesis(
        &self,
        settlement: &CrossChainAddress,
        header: &ValidatorSetHeader,
        extra_data: &[ExtraData],
    ) -> GatewayResult<TxResult>;

    /// Ask the settlement contract to check a quorum proof against the set
    /// committed at `epoch`.
    async fn verify_quorum_sig(
        &self,
        settlement: &CrossChainAddress,
        epoch: Epoch,
        message: Hash,
        key_tag: KeyTag,
        threshold: VotingPower,
        proof: &[u8],
    ) -> GatewayResult<bool>;

    /// EIP-712 domain used for header signing digests.
    async fn get_eip712_domain(
        &self,
        settlement: &CrossChainAddress,
    ) -> GatewayResult<Eip712Domain>;
}

#[async_trait]
impl<G: ChainGateway + ?Sized> ChainGateway for Arc<G> {
    async fn get_config(
        &self,
        driver: &CrossChainAddress,
        timestamp: Timestamp,
    ) -> GatewayResult<NetworkConfig> {
        (**self).get_config(driver, timestamp).await
    }

    async fn get_current_epoch(&self, driver: &CrossChainAddress) -> GatewayResult<Epoch> {
        (**self).get_current_epoch(driver).await
    }

    async fn get_epoch_start(
        &self,
        driver: &CrossChainAddress,
        epoch: Epoch,
    ) -> GatewayResult<Timestamp> {
        (**self).get_epoch_start(driver, epoch).await
    }

    async fn get_epoch_duration(
        &self,
        driver: &CrossChainAddress,
        epoch: Epoch,
    ) -> GatewayResult<u64> {
        (**self).get_epoch_duration(driver, epoch).await
    }

    async fn get_valset_header_at(
        &self,
        settlement: &CrossChainAddress,
        epoch: Epoch,
    ) -> GatewayResult<Option<ValidatorSetHeader>> {
        (**self).get_valset_header_at(settlement, epoch).await
    }

    async fn is_valset_header_committed_at(
        &self,
        settlement: &CrossChainAddress,
        epoch: Epoch,
    ) -> GatewayResult<bool> {
        (**self).is_valset_header_committed_at(settlement, epoch).await
    }

    async fn get_voting_powers(
        &self,
        provider: &CrossChainAddress,
        timestamp: Timestamp,
    ) -> GatewayResult<Vec<OperatorVotingPower>> {
        (**self).get_voting_powers(provider, timestamp).await
    }

    async fn get_keys(
        &self,
        keys_provider: &CrossChainAddress,
        timestamp: Timestamp,
    ) -> GatewayResult<Vec<OperatorWithKeys>> {
        (**self).get_keys(keys_provider, timestamp).await
    }

    async fn commit_valset_header(
        &self,
        settlement: &CrossChainAddress,
        header: &ValidatorSetHeader,
        extra_data: &[ExtraData],
        proof: &[u8],
    ) -> GatewayResult<TxResult> {
        (**self)
            .commit_valset_header(settlement, header, extra_data, proof)
            .await
    }

    async fn get_last_committed_header_epoch(
        &self,
        settlement: &CrossChainAddress,
    ) -> GatewayResult<Option<Epoch>> {
        (**self).get_last_committed_header_epoch(settlement).await
    }

    async fn set_genesis(
        &self,
        settlement: &CrossChainAddress,
        header: &ValidatorSetHeader,
        extra_data: &[ExtraData],
    ) -> GatewayResult<TxResult> {
        (**self).set_genesis(settlement, header, extra_data).await
    }

    async fn verify_quorum_sig(
        &self,
        settlement: &CrossChainAddress,
        epoch: Epoch,
        message: Hash,
        key_tag: KeyTag,
        threshold: VotingPower,
        proof: &[u8],
    ) -> GatewayResult<bool> {
        (**self)
            .verify_quorum_sig(settlement, epoch, message, key_tag, threshold, proof)
            .await
    }

    async fn get_eip712_domain(
        &self,
        settlement: &CrossChainAddress,
    ) -> GatewayResult<Eip712Domain> {
        (**self).get_eip712_domain(settlement).await
    }
}
