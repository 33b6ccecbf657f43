//! Epoch Controller Service
//!
//! One `tick` observes the chain, derives the phase for the current epoch
//! and, inside the commit window, drives sign → gossip → aggregate → commit
//! for every replica still missing the header. Every tick starts from chain
//! state, so a failed tick leaves nothing behind and the next one simply
//! retries.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use relay_telemetry::{log_epoch_event, COMMITS, CURRENT_EPOCH, SUBSYSTEM_ERRORS, TICKS, TICK_DURATION};
use relay_types::{
    CrossChainAddress, Epoch, ExtraData, Hash, NetworkConfig, Phase, Roster, SettlementProof,
    Timestamp, ValidatorSet, ValidatorSetHeader,
};
use tracing::{debug, info, warn};
use vr_01_chain_gateway::{ChainGateway, GatewayError, RevertReason};
use vr_02_valset_deriver::{DeriverError, ValidatorSetDeriver};
use vr_03_signature_gossip::{PeerTransport, SignatureGossip};
use vr_04_aggregator::{Aggregator, AggregatorError};

use crate::config::ControllerConfig;
use crate::domain::{derive_phase, RebroadcastPacer};
use crate::error::{ControllerError, ControllerResult};
use crate::ports::TimeSource;

const ALREADY_SUBMITTED: &str = "Settlement_ValSetHeaderAlreadySubmitted()";

/// Why a tick did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Previous tick still running
    TickInProgress,
    /// Current epoch is not in its commit window
    Phase(Phase),
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Skipped { reason: SkipReason },
    /// Signed and waiting for more signatures
    Collecting {
        epoch: Epoch,
        have: u128,
        need: u128,
    },
    /// Local key is not an active committee member; waiting on others
    NotSigner {
        epoch: Epoch,
        have: u128,
        need: u128,
    },
    /// Header committed on every replica that was still missing it
    Committed { epoch: Epoch, tx_hashes: Vec<Hash> },
    /// Committed on some replicas; `pending` still lack the header
    PartiallyCommitted {
        epoch: Epoch,
        tx_hashes: Vec<Hash>,
        pending: Vec<CrossChainAddress>,
    },
}

impl TickOutcome {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            TickOutcome::Skipped {
                reason: SkipReason::TickInProgress,
            } => "overlap",
            TickOutcome::Skipped {
                reason: SkipReason::Phase(phase),
            } => phase.as_str(),
            TickOutcome::Collecting { .. } => "collecting",
            TickOutcome::NotSigner { .. } => "not_signer",
            TickOutcome::Committed { .. } => "committed",
            TickOutcome::PartiallyCommitted { .. } => "partial",
        }
    }
}

/// Where one replica stands after a tick.
#[derive(Debug)]
enum ReplicaProgress {
    Committed(Hash),
    /// Another relay got there first
    AlreadyCommitted,
    Collecting {
        signer: bool,
        have: u128,
        need: u128,
    },
}

/// Epoch controller
pub struct EpochController<G: ChainGateway, T: PeerTransport> {
    config: ControllerConfig,
    gateway: Arc<G>,
    deriver: ValidatorSetDeriver<G>,
    gossip: Arc<SignatureGossip<T>>,
    aggregator: Aggregator,
    clock: Arc<dyn TimeSource>,
    pacer: Mutex<RebroadcastPacer>,
    /// Committees keyed by the hash of the header that committed them
    committees: Mutex<HashMap<Hash, Arc<ValidatorSet>>>,
    tick_guard: tokio::sync::Mutex<()>,
}

impl<G: ChainGateway, T: PeerTransport> EpochController<G, T> {
    pub fn new(
        config: ControllerConfig,
        gateway: Arc<G>,
        gossip: Arc<SignatureGossip<T>>,
        aggregator: Aggregator,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let deriver = ValidatorSetDeriver::new(Arc::clone(&gateway), config.driver);
        let pacer = RebroadcastPacer::new(config.rebroadcast_interval.as_secs());
        Self {
            config,
            gateway,
            deriver,
            gossip,
            aggregator,
            clock,
            pacer: Mutex::new(pacer),
            committees: Mutex::new(HashMap::new()),
            tick_guard: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn gossip(&self) -> &Arc<SignatureGossip<T>> {
        &self.gossip
    }

    /// Run one observation step. An overlapping call returns immediately.
    pub async fn tick(&self) -> ControllerResult<TickOutcome> {
        let Ok(_guard) = self.tick_guard.try_lock() else {
            TICKS.with_label_values(&["overlap"]).inc();
            return Ok(TickOutcome::Skipped {
                reason: SkipReason::TickInProgress,
            });
        };

        let timer = TICK_DURATION.start_timer();
        let result = self.run_tick().await;
        timer.observe_duration();

        match &result {
            Ok(outcome) => TICKS.with_label_values(&[outcome.label()]).inc(),
            Err(e) => {
                TICKS.with_label_values(&["error"]).inc();
                SUBSYSTEM_ERRORS
                    .with_label_values(&["vr-05", e.kind()])
                    .inc();
            }
        }
        result
    }

    async fn run_tick(&self) -> ControllerResult<TickOutcome> {
        let now = self.clock.now();
        let driver = &self.config.driver;

        let epoch = self.gateway.get_current_epoch(driver).await?;
        CURRENT_EPOCH.set(epoch as f64);
        self.gossip.set_current_epoch(epoch);
        let epoch_start = self.gateway.get_epoch_start(driver, epoch).await?;
        let network = self.gateway.get_config(driver, epoch_start).await?;
        if network.replicas.is_empty() {
            return Err(DeriverError::NoReplicas.into());
        }

        let pending = self.pending_replicas(&network.replicas, epoch).await;
        let phase = derive_phase(
            epoch_start,
            now,
            network.commit_duration,
            network.prolong_duration,
            pending.is_empty(),
        );

        if phase.is_terminal() {
            self.collect_garbage(epoch);
        }
        if phase != Phase::Commit {
            debug!(epoch, %phase, "[vr-05] Nothing to do");
            return Ok(TickOutcome::Skipped {
                reason: SkipReason::Phase(phase),
            });
        }

        let valset = self.deriver.get_validator_set(epoch, &network).await?;
        let header = self.deriver.make_header(&valset)?;
        let extra_data = self.deriver.extra_data(&valset, network.verification_type)?;

        let mut progress = Vec::with_capacity(pending.len());
        for replica in pending {
            let result = self
                .advance_replica(&replica, &network, &header, &extra_data, now)
                .await;
            if let Err(e) = &result {
                warn!(epoch, %replica, error = %e, "[vr-05] Replica did not advance");
            }
            progress.push((replica, result));
        }
        summarize(epoch, progress)
    }

    /// Sign, collect, aggregate and commit `header` on one replica.
    async fn advance_replica(
        &self,
        replica: &CrossChainAddress,
        network: &NetworkConfig,
        header: &ValidatorSetHeader,
        extra_data: &[ExtraData],
        now: Timestamp,
    ) -> ControllerResult<ReplicaProgress> {
        let epoch = header.epoch;
        let committee = self.committee(replica).await?;
        let domain = self.gateway.get_eip712_domain(replica).await?;
        let message_hash = header.signing_digest(&domain);
        let key_tag = committee.required_key_tag;

        let signer = self.is_signer(&committee);
        if signer {
            self.broadcast_if_due(epoch, message_hash, now).await?;
        }

        let signatures = self.gossip.store().snapshot(epoch, &message_hash);
        let proof = match self.aggregator.aggregate_at(
            epoch,
            &committee,
            key_tag,
            network.verification_type,
            &message_hash,
            &signatures,
        ) {
            Ok(proof) => proof,
            Err(AggregatorError::InsufficientQuorum { have, need }) => {
                log_epoch_event!(
                    debug,
                    "vr-05",
                    "[vr-05] Collecting signatures",
                    epoch,
                    have,
                    need,
                    signatures = signatures.len(),
                    replica = %replica
                );
                return Ok(ReplicaProgress::Collecting { signer, have, need });
            }
            Err(e) => return Err(e.into()),
        };

        if !self.aggregator.verify(&committee, key_tag, &proof) {
            warn!(epoch, %replica, "[vr-05] Aggregated proof failed self-check, not committing");
            return Err(ControllerError::SelfCheckFailed { epoch });
        }

        let signers = proof.signer_count();
        let proof_bytes =
            SettlementProof::new(proof, Roster::from_valset(&committee, key_tag)).to_bytes();

        match self
            .gateway
            .commit_valset_header(replica, header, extra_data, &proof_bytes)
            .await
        {
            Ok(tx) => {
                COMMITS.inc();
                info!(
                    epoch,
                    %replica,
                    tx_hash = %hex::encode(tx.tx_hash),
                    gas_used = tx.gas_used,
                    signers,
                    "[vr-05] Header committed"
                );
                Ok(ReplicaProgress::Committed(tx.tx_hash))
            }
            Err(e) if is_already_submitted(&e) => {
                info!(epoch, %replica, "[vr-05] Header already committed by another relay");
                Ok(ReplicaProgress::AlreadyCommitted)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The set behind the newest header on `replica`, which signs the next
    /// one there.
    ///
    /// Re-derived from chain reads and checked against the committed header
    /// before use.
    async fn committee(&self, replica: &CrossChainAddress) -> ControllerResult<Arc<ValidatorSet>> {
        let not_initialized = || ControllerError::NotInitialized { replica: *replica };
        let last = self
            .gateway
            .get_last_committed_header_epoch(replica)
            .await?
            .ok_or_else(not_initialized)?;
        let committed = self
            .gateway
            .get_valset_header_at(replica, last)
            .await?
            .ok_or_else(not_initialized)?;

        let key = committed.hash();
        if let Some(committee) = self.committees.lock().get(&key) {
            return Ok(Arc::clone(committee));
        }

        let driver = &self.config.driver;
        let start = self.gateway.get_epoch_start(driver, last).await?;
        let config = self.gateway.get_config(driver, start).await?;
        let valset = self.deriver.get_validator_set(last, &config).await?;
        let derived = self.deriver.make_header(&valset)?;
        if derived.required_key_tag != committed.required_key_tag
            || derived.validators_ssz_mroot != committed.validators_ssz_mroot
            || derived.total_voting_power != committed.total_voting_power
            || derived.quorum_threshold != committed.quorum_threshold
        {
            warn!(epoch = last, %replica, "[vr-05] Committed header does not match derived set");
            return Err(ControllerError::CommitteeMismatch {
                epoch: last,
                replica: *replica,
            });
        }

        debug!(epoch = last, %replica, validators = valset.validators.len(), "[vr-05] Committee derived");
        let committee = Arc::new(valset);
        self.committees.lock().insert(key, Arc::clone(&committee));
        Ok(committee)
    }

    /// Replicas that have not committed `epoch` yet.
    ///
    /// An unreadable replica counts as pending; its error resurfaces when
    /// the tick tries to advance it.
    async fn pending_replicas(
        &self,
        replicas: &[CrossChainAddress],
        epoch: Epoch,
    ) -> Vec<CrossChainAddress> {
        let mut pending = Vec::new();
        for replica in replicas {
            match self.gateway.is_valset_header_committed_at(replica, epoch).await {
                Ok(true) => {}
                Ok(false) => pending.push(*replica),
                Err(e) => {
                    debug!(epoch, %replica, error = %e, "[vr-05] Commit status unknown");
                    pending.push(*replica);
                }
            }
        }
        pending
    }

    fn is_signer(&self, committee: &ValidatorSet) -> bool {
        committee
            .find_by_key(committee.required_key_tag, &self.gossip.public_key())
            .map(|(_, v)| v.counts_toward_quorum())
            .unwrap_or(false)
    }

    async fn broadcast_if_due(
        &self,
        epoch: Epoch,
        message_hash: Hash,
        now: Timestamp,
    ) -> ControllerResult<()> {
        if !self.pacer.lock().is_due(epoch, &message_hash, now) {
            return Ok(());
        }
        let report = self.gossip.broadcast(epoch, message_hash).await?;
        self.pacer.lock().record(epoch, message_hash, now);
        debug!(
            epoch,
            delivered = report.delivered,
            failed = report.failed.len(),
            "[vr-05] Signature published"
        );
        Ok(())
    }

    fn collect_garbage(&self, epoch: Epoch) {
        let removed = self.gossip.store().prune_through(epoch);
        self.pacer.lock().prune_through(epoch);
        self.committees.lock().retain(|_, c| c.epoch >= epoch);
        if removed > 0 {
            debug!(epoch, removed, "[vr-05] Pruned collected signatures");
        }
    }
}

/// Fold per-replica progress into one outcome.
///
/// Any commit wins over errors on other replicas, which are reported as
/// pending instead. With no commit, the first error is returned.
fn summarize(
    epoch: Epoch,
    progress: Vec<(CrossChainAddress, ControllerResult<ReplicaProgress>)>,
) -> ControllerResult<TickOutcome> {
    let mut tx_hashes = Vec::new();
    let mut pending = Vec::new();
    let mut first_error = None;
    let mut collecting = None;

    for (replica, result) in progress {
        match result {
            Ok(ReplicaProgress::Committed(tx_hash)) => tx_hashes.push(tx_hash),
            Ok(ReplicaProgress::AlreadyCommitted) => {}
            Ok(ReplicaProgress::Collecting { signer, have, need }) => {
                pending.push(replica);
                collecting.get_or_insert((signer, have, need));
            }
            Err(e) => {
                pending.push(replica);
                first_error.get_or_insert(e);
            }
        }
    }

    if !tx_hashes.is_empty() {
        if pending.is_empty() {
            return Ok(TickOutcome::Committed { epoch, tx_hashes });
        }
        warn!(epoch, pending = pending.len(), "[vr-05] Header committed on some replicas only");
        return Ok(TickOutcome::PartiallyCommitted {
            epoch,
            tx_hashes,
            pending,
        });
    }
    if let Some(e) = first_error {
        return Err(e);
    }
    Ok(match collecting {
        Some((true, have, need)) => TickOutcome::Collecting { epoch, have, need },
        Some((false, have, need)) => TickOutcome::NotSigner { epoch, have, need },
        None => TickOutcome::Skipped {
            reason: SkipReason::Phase(Phase::Accept),
        },
    })
}

fn is_already_submitted(err: &GatewayError) -> bool {
    matches!(
        err,
        GatewayError::Reverted {
            reason: RevertReason::Custom(sig),
            ..
        } if *sig == ALREADY_SUBMITTED
    )
}
