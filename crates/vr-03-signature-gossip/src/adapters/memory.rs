//! In-process network for tests and the devnet runtime.
//!
//! Frames are handed to the destination's handler inline, so a `send` that
//! returns `Ok` means the frame has already been processed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::{PeerId, PeerInfo};
use crate::error::{GossipError, GossipResult};
use crate::ports::{FrameHandler, PeerTransport};

#[derive(Default)]
pub struct InMemoryNetwork {
    handlers: RwLock<HashMap<PeerId, Arc<dyn FrameHandler>>>,
    unreachable: RwLock<HashSet<PeerId>>,
}

impl InMemoryNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Attach a handler under `id`, replacing any previous one.
    pub fn register(&self, id: impl Into<PeerId>, handler: Arc<dyn FrameHandler>) {
        self.handlers.write().insert(id.into(), handler);
    }

    pub fn unregister(&self, id: &str) {
        self.handlers.write().remove(id);
    }

    /// Toggle whether sends to `id` succeed.
    pub fn set_reachable(&self, id: &str, reachable: bool) {
        let mut unreachable = self.unreachable.write();
        if reachable {
            unreachable.remove(id);
        } else {
            unreachable.insert(id.to_string());
        }
    }

    /// Transport endpoint for one node.
    pub fn transport(self: &Arc<Self>) -> InMemoryTransport {
        InMemoryTransport {
            network: Arc::clone(self),
        }
    }

    fn route(&self, peer: &PeerInfo) -> GossipResult<Arc<dyn FrameHandler>> {
        if self.unreachable.read().contains(&peer.id) {
            return Err(GossipError::PeerUnreachable {
                peer: peer.id.clone(),
                reason: "marked unreachable".to_string(),
            });
        }
        self.handlers
            .read()
            .get(&peer.id)
            .cloned()
            .ok_or_else(|| GossipError::PeerUnreachable {
                peer: peer.id.clone(),
                reason: "no such peer".to_string(),
            })
    }
}

#[derive(Clone)]
pub struct InMemoryTransport {
    network: Arc<InMemoryNetwork>,
}

#[async_trait]
impl PeerTransport for InMemoryTransport {
    async fn send(&self, peer: &PeerInfo, frame: Vec<u8>) -> GossipResult<()> {
        // Lock released before the handler runs.
        let handler = self.network.route(peer)?;
        handler.handle_frame(&frame).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ReceiveOutcome;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        frames: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl FrameHandler for Recorder {
        async fn handle_frame(&self, frame: &[u8]) -> ReceiveOutcome {
            self.frames.lock().push(frame.to_vec());
            ReceiveOutcome::Stored
        }
    }

    #[tokio::test]
    async fn test_routing_and_reachability() {
        let network = InMemoryNetwork::new();
        let recorder = Arc::new(Recorder::default());
        network.register("b", recorder.clone());
        let transport = network.transport();
        let b = PeerInfo::new("b", "");

        transport.send(&b, vec![1]).await.unwrap();
        network.set_reachable("b", false);
        assert!(transport.send(&b, vec![2]).await.is_err());
        network.set_reachable("b", true);
        transport.send(&b, vec![3]).await.unwrap();

        assert_eq!(*recorder.frames.lock(), vec![vec![1], vec![3]]);
        assert!(transport.send(&PeerInfo::new("c", ""), vec![4]).await.is_err());
    }
}
