//! Static bootstrap discovery.

use async_trait::async_trait;

use crate::domain::PeerInfo;
use crate::ports::PeerDiscovery;

/// Returns a fixed peer list, typically from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    peers: Vec<PeerInfo>,
}

impl StaticDiscovery {
    pub fn new(peers: Vec<PeerInfo>) -> Self {
        Self { peers }
    }

    /// Parse `id@host:port` entries; a bare `host:port` uses the address as id.
    pub fn from_bootstrap(entries: &[String]) -> Self {
        let peers = entries
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .map(|e| match e.split_once('@') {
                Some((id, addr)) => PeerInfo::new(id, addr),
                None => PeerInfo::new(e, e),
            })
            .collect();
        Self { peers }
    }
}

#[async_trait]
impl PeerDiscovery for StaticDiscovery {
    async fn discover(&self) -> Vec<PeerInfo> {
        self.peers.clone()
    }
}
