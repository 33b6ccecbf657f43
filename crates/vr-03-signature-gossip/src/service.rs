//! Signature gossip service.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::RwLock;
use relay_crypto::{BlsProvider, Signer};
use relay_telemetry::{
    log_peer_event, BROADCASTS, KNOWN_PEERS, SIGNATURES_DROPPED, SIGNATURES_RECEIVED,
};
use relay_types::{Epoch, Hash, SignatureMessage};
use tracing::{debug, info};

use crate::domain::{
    Envelope, InsertOutcome, PeerId, PeerRegistry, SignatureStore, StoreLimits, SIGNATURE_TYPE,
};
use crate::error::{GossipError, GossipResult};
use crate::ports::{DropReason, FrameHandler, PeerDiscovery, PeerTransport, ReceiveOutcome};

/// Per-peer result of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: Vec<PeerId>,
}

/// Epochs accepted on either side of the current one.
pub const EPOCH_WINDOW: Epoch = 1;

/// Disseminates the local partial signature and collects those of peers.
///
/// Membership is not checked here: any signature that verifies against its
/// own claimed key is stored. Filtering happens at aggregation. Once the
/// current epoch is known, inbound signatures outside
/// `current ± EPOCH_WINDOW` are dropped.
pub struct SignatureGossip<T: PeerTransport> {
    node_id: PeerId,
    signer: Arc<dyn Signer>,
    provider: Arc<dyn BlsProvider>,
    transport: Arc<T>,
    peers: Arc<PeerRegistry>,
    store: Arc<SignatureStore>,
    current_epoch: RwLock<Option<Epoch>>,
}

impl<T: PeerTransport> SignatureGossip<T> {
    pub fn new(
        node_id: impl Into<PeerId>,
        signer: Arc<dyn Signer>,
        provider: Arc<dyn BlsProvider>,
        transport: Arc<T>,
    ) -> Self {
        Self::with_store_limits(node_id, signer, provider, transport, StoreLimits::default())
    }

    pub fn with_store_limits(
        node_id: impl Into<PeerId>,
        signer: Arc<dyn Signer>,
        provider: Arc<dyn BlsProvider>,
        transport: Arc<T>,
        limits: StoreLimits,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            signer,
            provider,
            transport,
            peers: Arc::new(PeerRegistry::new()),
            store: Arc::new(SignatureStore::with_limits(limits)),
            current_epoch: RwLock::new(None),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn public_key(&self) -> Vec<u8> {
        self.signer.public_key()
    }

    pub fn peers(&self) -> &Arc<PeerRegistry> {
        &self.peers
    }

    pub fn store(&self) -> &Arc<SignatureStore> {
        &self.store
    }

    pub fn current_epoch(&self) -> Option<Epoch> {
        *self.current_epoch.read()
    }

    /// Record the epoch being collected and drop stored signatures that
    /// fall outside its window.
    pub fn set_current_epoch(&self, epoch: Epoch) {
        *self.current_epoch.write() = Some(epoch);
        let mut removed = self.store.prune_after(epoch.saturating_add(EPOCH_WINDOW));
        if let Some(stale) = epoch.checked_sub(EPOCH_WINDOW + 1) {
            removed += self.store.prune_through(stale);
        }
        if removed > 0 {
            debug!(epoch, removed, "[vr-03] Dropped signatures outside the epoch window");
        }
    }

    fn accepts_epoch(&self, epoch: Epoch) -> bool {
        match *self.current_epoch.read() {
            None => true,
            Some(current) => {
                epoch.saturating_add(EPOCH_WINDOW) >= current
                    && epoch <= current.saturating_add(EPOCH_WINDOW)
            }
        }
    }

    /// Sign `message_hash`, keep the signature locally and send it to every
    /// known peer concurrently.
    pub async fn broadcast(&self, epoch: Epoch, message_hash: Hash) -> GossipResult<BroadcastReport> {
        let message = SignatureMessage {
            epoch,
            message_hash,
            signature: self.signer.sign(&message_hash),
            public_key: self.signer.public_key(),
        };
        self.store.insert(message.clone());

        let payload =
            serde_json::to_vec(&message).map_err(|e| GossipError::Malformed(e.to_string()))?;
        let frame = Envelope::new(SIGNATURE_TYPE, &self.node_id, unix_now(), payload).encode()?;

        let peers = self.peers.snapshot();
        let sends = peers
            .iter()
            .filter(|peer| peer.id != self.node_id)
            .map(|peer| {
                let frame = frame.clone();
                async move { (peer, self.transport.send(peer, frame).await) }
            });

        let mut report = BroadcastReport::default();
        for (peer, result) in join_all(sends).await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    log_peer_event!(warn, "vr-03", "[vr-03] Broadcast send failed", peer.id, error = %e);
                    report.failed.push(peer.id.clone());
                }
            }
        }

        BROADCASTS
            .with_label_values(&["delivered"])
            .inc_by(report.delivered as f64);
        BROADCASTS
            .with_label_values(&["failed"])
            .inc_by(report.failed.len() as f64);
        info!(
            epoch,
            message_hash = %hex::encode(message_hash),
            delivered = report.delivered,
            failed = report.failed.len(),
            "[vr-03] Signature broadcast"
        );
        Ok(report)
    }

    /// Decode, verify and store one inbound frame.
    pub fn on_receive(&self, frame: &[u8]) -> ReceiveOutcome {
        let outcome = match Envelope::decode(frame) {
            Err(GossipError::FrameTooLarge { size, .. }) => {
                debug!(size, "[vr-03] Dropping oversized frame");
                ReceiveOutcome::Dropped(DropReason::Oversized)
            }
            Err(e) => {
                debug!(error = %e, "[vr-03] Dropping malformed envelope");
                ReceiveOutcome::Dropped(DropReason::Malformed)
            }
            Ok(envelope) if envelope.message_type == SIGNATURE_TYPE => {
                self.receive_signature(&envelope)
            }
            Ok(envelope) => {
                debug!(
                    message_type = %envelope.message_type,
                    sender = %envelope.sender,
                    "[vr-03] Dropping unknown message type"
                );
                ReceiveOutcome::Dropped(DropReason::UnknownType)
            }
        };

        match outcome {
            ReceiveOutcome::Stored => SIGNATURES_RECEIVED.inc(),
            ReceiveOutcome::Dropped(reason) => SIGNATURES_DROPPED
                .with_label_values(&[reason.as_str()])
                .inc(),
            ReceiveOutcome::Duplicate => {}
        }
        outcome
    }

    fn receive_signature(&self, envelope: &Envelope) -> ReceiveOutcome {
        let message: SignatureMessage = match serde_json::from_slice(&envelope.data) {
            Ok(message) => message,
            Err(e) => {
                debug!(sender = %envelope.sender, error = %e, "[vr-03] Malformed signature payload");
                return ReceiveOutcome::Dropped(DropReason::Malformed);
            }
        };

        if !self.accepts_epoch(message.epoch) {
            debug!(
                sender = %envelope.sender,
                epoch = message.epoch,
                current = ?self.current_epoch(),
                "[vr-03] Signature epoch outside window"
            );
            return ReceiveOutcome::Dropped(DropReason::EpochOutOfWindow);
        }

        if !self
            .provider
            .verify(&message.public_key, &message.message_hash, &message.signature)
        {
            debug!(
                sender = %envelope.sender,
                epoch = message.epoch,
                "[vr-03] Signature does not verify against claimed key"
            );
            return ReceiveOutcome::Dropped(DropReason::BadSignature);
        }

        let epoch = message.epoch;
        match self.store.insert(message) {
            InsertOutcome::Stored => {
                debug!(sender = %envelope.sender, epoch, "[vr-03] Signature stored");
                ReceiveOutcome::Stored
            }
            InsertOutcome::Duplicate => ReceiveOutcome::Duplicate,
            InsertOutcome::Full => {
                debug!(sender = %envelope.sender, epoch, "[vr-03] Signature store full");
                ReceiveOutcome::Dropped(DropReason::StoreFull)
            }
        }
    }

    /// Pull peers from `discovery` into the registry. Returns how many were new.
    pub async fn refresh_peers(&self, discovery: &dyn PeerDiscovery) -> usize {
        let added = discovery
            .discover()
            .await
            .into_iter()
            .filter(|peer| peer.id != self.node_id)
            .filter(|peer| self.peers.add(peer.clone()))
            .count();
        KNOWN_PEERS.set(self.peers.len() as f64);
        if added > 0 {
            info!(added, known = self.peers.len(), "[vr-03] Peers discovered");
        }
        added
    }
}

#[async_trait]
impl<T: PeerTransport + 'static> FrameHandler for SignatureGossip<T> {
    async fn handle_frame(&self, frame: &[u8]) -> ReceiveOutcome {
        self.on_receive(frame)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
