//! In-process chain state.
//!
//! Holds driver, provider, key registry and settlement state for a set of
//! chains behind one lock. Settlement writes enforce the same rules the
//! contract does (epoch ordering, one header per epoch, quorum proof) and
//! revert with encoded custom errors, so callers exercise the real decode
//! path.
//!
//! A header is accepted on the strength of the last committed set: the
//! proof's roster must match the `validatorsKeccak` entry stored with that
//! header, and the aggregate key and voting power are recomputed from the
//! roster and the signer bitmap. Claimed values in the proof are ignored.

use async_trait::async_trait;
use parking_lot::RwLock;
use relay_crypto::{keccak256_many, BlsProvider};
use relay_types::{
    extra_data_key, ChainId, CrossChainAddress, Eip712Domain, Epoch, ExtraData, Hash, KeyTag,
    NetworkConfig, OperatorVotingPower, OperatorWithKeys, SettlementProof, Timestamp, TxResult,
    ValidatorSetHeader, VotingPower, VALIDATORS_KECCAK,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use crate::domain::{decode_revert, encode_custom_error, GatewayError, GatewayResult};
use crate::ports::ChainGateway;

/// Source of "block time" for epoch computation.
pub type ClockFn = Arc<dyn Fn() -> Timestamp + Send + Sync>;

const BASE_COMMIT_GAS: u64 = 180_000;
const EXTRA_DATA_GAS: u64 = 22_000;

struct DriverState {
    config: NetworkConfig,
    start_time: Timestamp,
}

struct SettlementState {
    domain: Eip712Domain,
    headers: BTreeMap<Epoch, (ValidatorSetHeader, Vec<ExtraData>)>,
}

#[derive(Default)]
struct ChainState {
    connected: HashSet<ChainId>,
    offline: HashSet<ChainId>,
    drivers: HashMap<CrossChainAddress, DriverState>,
    /// Per provider, readings keyed by the timestamp they take effect
    voting_powers: HashMap<CrossChainAddress, BTreeMap<Timestamp, Vec<OperatorVotingPower>>>,
    keys: HashMap<CrossChainAddress, Vec<OperatorWithKeys>>,
    settlements: HashMap<CrossChainAddress, SettlementState>,
}

impl ChainState {
    fn check(&self, addr: &CrossChainAddress) -> GatewayResult<()> {
        if !self.connected.contains(&addr.chain_id) {
            return Err(GatewayError::NoConnection(addr.chain_id));
        }
        if self.offline.contains(&addr.chain_id) {
            return Err(GatewayError::Connection(format!(
                "chain {} unreachable",
                addr.chain_id
            )));
        }
        Ok(())
    }

    fn driver(&self, addr: &CrossChainAddress) -> GatewayResult<&DriverState> {
        self.check(addr)?;
        self.drivers
            .get(addr)
            .ok_or_else(|| GatewayError::UnknownContract(addr.to_string()))
    }

    fn settlement(&self, addr: &CrossChainAddress) -> GatewayResult<&SettlementState> {
        self.check(addr)?;
        self.settlements
            .get(addr)
            .ok_or_else(|| GatewayError::UnknownContract(addr.to_string()))
    }

    fn settlement_mut(&mut self, addr: &CrossChainAddress) -> GatewayResult<&mut SettlementState> {
        self.check(addr)?;
        self.settlements
            .get_mut(addr)
            .ok_or_else(|| GatewayError::UnknownContract(addr.to_string()))
    }
}

/// Revert the way the contract would: encoded custom error, then decoded.
fn revert(method: &'static str, signature: &str) -> GatewayError {
    GatewayError::Reverted {
        method,
        reason: decode_revert(&encode_custom_error(signature)),
    }
}

fn system_now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// In-memory implementation of [`ChainGateway`] for tests and devnet.
pub struct InMemoryChainGateway {
    state: RwLock<ChainState>,
    provider: Arc<dyn BlsProvider>,
    clock: ClockFn,
    writes: AtomicU64,
}

impl InMemoryChainGateway {
    /// Create an empty gateway using the system clock.
    pub fn new(provider: Arc<dyn BlsProvider>) -> Self {
        Self {
            state: RwLock::new(ChainState::default()),
            provider,
            clock: Arc::new(system_now),
            writes: AtomicU64::new(0),
        }
    }

    /// Replace the clock used to derive the current epoch.
    pub fn with_clock(mut self, clock: ClockFn) -> Self {
        self.clock = clock;
        self
    }

    /// Make `chain_id` reachable.
    pub fn connect_chain(&self, chain_id: ChainId) {
        self.state.write().connected.insert(chain_id);
    }

    /// Simulate an RPC outage for `chain_id`.
    pub fn set_chain_offline(&self, chain_id: ChainId, offline: bool) {
        let mut state = self.state.write();
        if offline {
            state.offline.insert(chain_id);
        } else {
            state.offline.remove(&chain_id);
        }
    }

    /// Deploy (or replace) a driver with its config and epoch-0 start time.
    pub fn install_driver(
        &self,
        addr: CrossChainAddress,
        config: NetworkConfig,
        start_time: Timestamp,
    ) {
        self.state
            .write()
            .drivers
            .insert(addr, DriverState { config, start_time });
    }

    /// Replace every reading of `provider` with `powers`.
    pub fn set_voting_powers(&self, provider: CrossChainAddress, powers: Vec<OperatorVotingPower>) {
        self.state
            .write()
            .voting_powers
            .insert(provider, BTreeMap::from([(0, powers)]));
    }

    /// Serve `powers` for reads at or after `from`; earlier reads keep the
    /// previous values.
    pub fn set_voting_powers_from(
        &self,
        provider: CrossChainAddress,
        from: Timestamp,
        powers: Vec<OperatorVotingPower>,
    ) {
        self.state
            .write()
            .voting_powers
            .entry(provider)
            .or_default()
            .insert(from, powers);
    }

    pub fn set_keys(&self, keys_provider: CrossChainAddress, keys: Vec<OperatorWithKeys>) {
        self.state.write().keys.insert(keys_provider, keys);
    }

    /// Deploy an empty settlement contract.
    pub fn install_settlement(&self, addr: CrossChainAddress, domain: Eip712Domain) {
        self.state.write().settlements.insert(
            addr,
            SettlementState {
                domain,
                headers: BTreeMap::new(),
            },
        );
    }

    /// Number of successful state-mutating calls.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Headers committed on `settlement`, ascending by epoch.
    pub fn committed_headers(&self, settlement: &CrossChainAddress) -> Vec<ValidatorSetHeader> {
        self.state
            .read()
            .settlements
            .get(settlement)
            .map(|s| s.headers.values().map(|(h, _)| h.clone()).collect())
            .unwrap_or_default()
    }

    /// Extra data submitted with the header at `epoch`.
    pub fn extra_data_at(&self, settlement: &CrossChainAddress, epoch: Epoch) -> Vec<ExtraData> {
        self.state
            .read()
            .settlements
            .get(settlement)
            .and_then(|s| s.headers.get(&epoch))
            .map(|(_, extra)| extra.clone())
            .unwrap_or_default()
    }

    /// Check `proof` over `message` against the committee whose header
    /// carried `committee` as extra data.
    fn check_proof(
        &self,
        committee: &[ExtraData],
        key_tag: KeyTag,
        message: Hash,
        threshold: VotingPower,
        proof: &[u8],
    ) -> bool {
        let Ok(proof) = SettlementProof::from_bytes(key_tag, message, proof) else {
            return false;
        };
        let commitment_key = extra_data_key(VALIDATORS_KECCAK, key_tag);
        let Some(commitment) = committee.iter().find(|e| e.key == commitment_key) else {
            debug!("[vr-01] No roster commitment for key tag {}", key_tag);
            return false;
        };
        if proof.roster.commitment() != commitment.value {
            debug!("[vr-01] Proof roster does not match committed set");
            return false;
        }

        let Some((keys, power)) = proof.roster.signers(proof.aggregate.signers()) else {
            return false;
        };
        if keys.is_empty() || power < threshold {
            return false;
        }
        let Ok(apk) = self.provider.aggregate_public_keys(&keys) else {
            return false;
        };
        self.provider
            .verify(&apk, &message, &proof.aggregate.signature)
    }

    fn record_write(&self, settlement: &CrossChainAddress, header: &ValidatorSetHeader, extra: usize) -> TxResult {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let header_hash = header.hash();
        TxResult {
            tx_hash: keccak256_many(&[
                &header_hash,
                &settlement.chain_id.to_be_bytes(),
                &settlement.address,
            ]),
            gas_used: BASE_COMMIT_GAS + EXTRA_DATA_GAS * extra as u64,
        }
    }
}

fn has_duplicate_keys(extra_data: &[ExtraData]) -> bool {
    let mut seen = HashSet::with_capacity(extra_data.len());
    extra_data.iter().any(|e| !seen.insert(e.key))
}

#[async_trait]
impl ChainGateway for InMemoryChainGateway {
    async fn get_config(
        &self,
        driver: &CrossChainAddress,
        _timestamp: Timestamp,
    ) -> GatewayResult<NetworkConfig> {
        let state = self.state.read();
        Ok(state.driver(driver)?.config.clone())
    }

    async fn get_current_epoch(&self, driver: &CrossChainAddress) -> GatewayResult<Epoch> {
        let state = self.state.read();
        let d = state.driver(driver)?;
        if d.config.epoch_duration == 0 {
            return Err(revert("get_current_epoch", "ValSetDriver_ZeroEpochDuration()"));
        }
        let now = (self.clock)();
        Ok(now.saturating_sub(d.start_time) / d.config.epoch_duration)
    }

    async fn get_epoch_start(
        &self,
        driver: &CrossChainAddress,
        epoch: Epoch,
    ) -> GatewayResult<Timestamp> {
        let state = self.state.read();
        let d = state.driver(driver)?;
        epoch
            .checked_mul(d.config.epoch_duration)
            .and_then(|offset| d.start_time.checked_add(offset))
            .ok_or_else(|| revert("get_epoch_start", "ValSetDriver_InvalidEpoch()"))
    }

    async fn get_epoch_duration(
        &self,
        driver: &CrossChainAddress,
        _epoch: Epoch,
    ) -> GatewayResult<u64> {
        let state = self.state.read();
        Ok(state.driver(driver)?.config.epoch_duration)
    }

    async fn get_valset_header_at(
        &self,
        settlement: &CrossChainAddress,
        epoch: Epoch,
    ) -> GatewayResult<Option<ValidatorSetHeader>> {
        let state = self.state.read();
        Ok(state
            .settlement(settlement)?
            .headers
            .get(&epoch)
            .map(|(h, _)| h.clone()))
    }

    async fn is_valset_header_committed_at(
        &self,
        settlement: &CrossChainAddress,
        epoch: Epoch,
    ) -> GatewayResult<bool> {
        let state = self.state.read();
        Ok(state.settlement(settlement)?.headers.contains_key(&epoch))
    }

    async fn get_voting_powers(
        &self,
        provider: &CrossChainAddress,
        timestamp: Timestamp,
    ) -> GatewayResult<Vec<OperatorVotingPower>> {
        let state = self.state.read();
        state.check(provider)?;
        let history = state
            .voting_powers
            .get(provider)
            .ok_or_else(|| GatewayError::UnknownContract(provider.to_string()))?;
        Ok(history
            .range(..=timestamp)
            .next_back()
            .map(|(_, powers)| powers.clone())
            .unwrap_or_default())
    }

    async fn get_keys(
        &self,
        keys_provider: &CrossChainAddress,
        _timestamp: Timestamp,
    ) -> GatewayResult<Vec<OperatorWithKeys>> {
        let state = self.state.read();
        state.check(keys_provider)?;
        state
            .keys
            .get(keys_provider)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownContract(keys_provider.to_string()))
    }

    async fn commit_valset_header(
        &self,
        settlement: &CrossChainAddress,
        header: &ValidatorSetHeader,
        extra_data: &[ExtraData],
        proof: &[u8],
    ) -> GatewayResult<TxResult> {
        const METHOD: &str = "commit_valset_header";
        let mut state = self.state.write();
        let s = state.settlement_mut(settlement)?;

        let Some(last_epoch) = s.headers.keys().next_back().copied() else {
            return Err(revert(METHOD, "Settlement_NotInitialized()"));
        };
        if s.headers.contains_key(&header.epoch) {
            return Err(revert(METHOD, "Settlement_ValSetHeaderAlreadySubmitted()"));
        }
        if header.epoch <= last_epoch {
            return Err(revert(METHOD, "Settlement_InvalidEpoch()"));
        }
        if header.quorum_threshold > header.total_voting_power {
            return Err(revert(METHOD, "Settlement_QuorumThresholdGtTotalVotingPower()"));
        }
        if has_duplicate_keys(extra_data) {
            return Err(revert(METHOD, "Settlement_DuplicateExtraDataKey()"));
        }

        let digest = header.signing_digest(&s.domain);
        let verified = match s.headers.get(&last_epoch) {
            Some((committee, committee_extra)) => self.check_proof(
                committee_extra,
                committee.required_key_tag,
                digest,
                committee.quorum_threshold,
                proof,
            ),
            None => false,
        };
        if !verified {
            return Err(revert(METHOD, "Settlement_VerificationFailed()"));
        }

        s.headers
            .insert(header.epoch, (header.clone(), extra_data.to_vec()));
        drop(state);

        info!(
            "[vr-01] Header for epoch {} committed on {}",
            header.epoch, settlement
        );
        Ok(self.record_write(settlement, header, extra_data.len()))
    }

    async fn set_genesis(
        &self,
        settlement: &CrossChainAddress,
        header: &ValidatorSetHeader,
        extra_data: &[ExtraData],
    ) -> GatewayResult<TxResult> {
        const METHOD: &str = "set_genesis";
        let mut state = self.state.write();
        let s = state.settlement_mut(settlement)?;
        if !s.headers.is_empty() {
            return Err(revert(METHOD, "Settlement_ValSetHeaderAlreadySubmitted()"));
        }
        if has_duplicate_keys(extra_data) {
            return Err(revert(METHOD, "Settlement_DuplicateExtraDataKey()"));
        }
        s.headers
            .insert(header.epoch, (header.clone(), extra_data.to_vec()));
        drop(state);

        debug!("[vr-01] Genesis at epoch {} set on {}", header.epoch, settlement);
        Ok(self.record_write(settlement, header, extra_data.len()))
    }

    async fn get_last_committed_header_epoch(
        &self,
        settlement: &CrossChainAddress,
    ) -> GatewayResult<Option<Epoch>> {
        let state = self.state.read();
        Ok(state.settlement(settlement)?.headers.keys().next_back().copied())
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
        let state = self.state.read();
        let Some((_, committee)) = state.settlement(settlement)?.headers.get(&epoch) else {
            return Ok(false);
        };
        Ok(self.check_proof(committee, key_tag, message, threshold, proof))
    }

    async fn get_eip712_domain(
        &self,
        settlement: &CrossChainAddress,
    ) -> GatewayResult<Eip712Domain> {
        let state = self.state.read();
        Ok(state.settlement(settlement)?.domain.clone())
    }
}
