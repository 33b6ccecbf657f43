//! Per-call timeout decorator.

use async_trait::async_trait;
use relay_types::{
    CrossChainAddress, Eip712Domain, Epoch, ExtraData, Hash, KeyTag, NetworkConfig,
    OperatorVotingPower, OperatorWithKeys, Timestamp, TxResult, ValidatorSetHeader, VotingPower,
};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::domain::{GatewayError, GatewayResult};
use crate::ports::ChainGateway;

/// Wraps a gateway so that every call is bounded by `timeout`.
///
/// An expired call is dropped and reported as [`GatewayError::Timeout`].
pub struct TimedChainGateway<G> {
    inner: G,
    timeout: Duration,
}

impl<G: ChainGateway> TimedChainGateway<G> {
    pub fn new(inner: G, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn timed<T: Send>(
        &self,
        method: &'static str,
        call: impl Future<Output = GatewayResult<T>> + Send,
    ) -> GatewayResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                let after_ms = self.timeout.as_millis() as u64;
                warn!("[vr-01] {} timed out after {}ms", method, after_ms);
                Err(GatewayError::Timeout { method, after_ms })
            }
        }
    }
}

#[async_trait]
impl<G: ChainGateway> ChainGateway for TimedChainGateway<G> {
    async fn get_config(
        &self,
        driver: &CrossChainAddress,
        timestamp: Timestamp,
    ) -> GatewayResult<NetworkConfig> {
        self.timed("get_config", self.inner.get_config(driver, timestamp))
            .await
    }

    async fn get_current_epoch(&self, driver: &CrossChainAddress) -> GatewayResult<Epoch> {
        self.timed("get_current_epoch", self.inner.get_current_epoch(driver))
            .await
    }

    async fn get_epoch_start(
        &self,
        driver: &CrossChainAddress,
        epoch: Epoch,
    ) -> GatewayResult<Timestamp> {
        self.timed("get_epoch_start", self.inner.get_epoch_start(driver, epoch))
            .await
    }

    async fn get_epoch_duration(
        &self,
        driver: &CrossChainAddress,
        epoch: Epoch,
    ) -> GatewayResult<u64> {
        self.timed(
            "get_epoch_duration",
            self.inner.get_epoch_duration(driver, epoch),
        )
        .await
    }

    async fn get_valset_header_at(
        &self,
        settlement: &CrossChainAddress,
        epoch: Epoch,
    ) -> GatewayResult<Option<ValidatorSetHeader>> {
        self.timed(
            "get_valset_header_at",
            self.inner.get_valset_header_at(settlement, epoch),
        )
        .await
    }

    async fn is_valset_header_committed_at(
        &self,
        settlement: &CrossChainAddress,
        epoch: Epoch,
    ) -> GatewayResult<bool> {
        self.timed(
            "is_valset_header_committed_at",
            self.inner.is_valset_header_committed_at(settlement, epoch),
        )
        .await
    }

    async fn get_voting_powers(
        &self,
        provider: &CrossChainAddress,
        timestamp: Timestamp,
    ) -> GatewayResult<Vec<OperatorVotingPower>> {
        self.timed(
            "get_voting_powers",
            self.inner.get_voting_powers(provider, timestamp),
        )
        .await
    }

    async fn get_keys(
        &self,
        keys_provider: &CrossChainAddress,
        timestamp: Timestamp,
    ) -> GatewayResult<Vec<OperatorWithKeys>> {
        self.timed("get_keys", self.inner.get_keys(keys_provider, timestamp))
            .await
    }

    async fn commit_valset_header(
        &self,
        settlement: &CrossChainAddress,
        header: &ValidatorSetHeader,
        extra_data: &[ExtraData],
        proof: &[u8],
    ) -> GatewayResult<TxResult> {
        self.timed(
            "commit_valset_header",
            self.inner
                .commit_valset_header(settlement, header, extra_data, proof),
        )
        .await
    }

    async fn get_last_committed_header_epoch(
        &self,
        settlement: &CrossChainAddress,
    ) -> GatewayResult<Option<Epoch>> {
        self.timed(
            "get_last_committed_header_epoch",
            self.inner.get_last_committed_header_epoch(settlement),
        )
        .await
    }

    async fn set_genesis(
        &self,
        settlement: &CrossChainAddress,
        header: &ValidatorSetHeader,
        extra_data: &[ExtraData],
    ) -> GatewayResult<TxResult> {
        self.timed(
            "set_genesis",
            self.inner.set_genesis(settlement, header, extra_data),
        )
        .await
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
        self.timed(
            "verify_quorum_sig",
            self.inner
                .verify_quorum_sig(settlement, epoch, message, key_tag, threshold, proof),
        )
        .await
    }

    async fn get_eip712_domain(
        &self,
        settlement: &CrossChainAddress,
    ) -> GatewayResult<Eip712Domain> {
        self.timed(
            "get_eip712_domain",
            self.inner.get_eip712_domain(settlement),
        )
        .await
    }
}
