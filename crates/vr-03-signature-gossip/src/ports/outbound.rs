//! Outbound ports - what gossip needs from the network.

use async_trait::async_trait;

use crate::domain::PeerInfo;
use crate::error::GossipResult;

/// Delivers one encoded frame to one peer.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn send(&self, peer: &PeerInfo, frame: Vec<u8>) -> GossipResult<()>;
}

/// Source of peers to add to the registry.
#[async_trait]
pub trait PeerDiscovery: Send + Sync {
    async fn discover(&self) -> Vec<PeerInfo>;
}
