//! Known peers.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

pub type PeerId = String;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerInfo {
    pub id: PeerId,
    /// Transport address; `host:port` for TCP, ignored in memory.
    pub address: String,
}

impl PeerInfo {
    pub fn new(id: impl Into<PeerId>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
        }
    }
}

/// Peer set written by discovery and read by broadcast.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: RwLock<HashMap<PeerId, PeerInfo>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a peer. Returns `true` if the id was new.
    pub fn add(&self, peer: PeerInfo) -> bool {
        self.peers.write().insert(peer.id.clone(), peer).is_none()
    }

    pub fn remove(&self, id: &str) -> Option<PeerInfo> {
        self.peers.write().remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.peers.read().contains_key(id)
    }

    /// Copy of the current peer set, sorted by id.
    pub fn snapshot(&self) -> Vec<PeerInfo> {
        let mut peers: Vec<PeerInfo> = self.peers.read().values().cloned().collect();
        peers.sort_by(|a, b| a.id.cmp(&b.id));
        peers
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }
}
