//! Runtime owning every devnet node and the shared chain state.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use futures::future::select_all;
use relay_crypto::{Bls12381Provider, BlsProvider};
use relay_types::Timestamp;
use tokio::sync::watch;
use tracing::{error, info};
use vr_01_chain_gateway::InMemoryChainGateway;
use vr_03_signature_gossip::PeerInfo;

use crate::container::RelayConfig;
use crate::genesis::DevnetGenesis;
use crate::wiring::node::{BoundListener, NodeContext, RelayNode};

/// The relay runtime.
pub struct RelayRuntime {
    gateway: Arc<InMemoryChainGateway>,
    nodes: Vec<RelayNode>,
    /// Stops every gossip listener at once.
    shutdown_tx: watch::Sender<bool>,
}

impl RelayRuntime {
    /// Start the runtime.
    ///
    /// ## Startup Sequence
    ///
    /// 1. Validate configuration
    /// 2. Seed the devnet chain and commit genesis
    /// 3. Bind one gossip listener per operator
    /// 4. Start each node with every other node as a peer
    pub async fn start(config: RelayConfig) -> Result<Self> {
        config.validate().context("Invalid relay configuration")?;

        let provider: Arc<dyn BlsProvider> = Arc::new(Bls12381Provider::new());
        let genesis = DevnetGenesis::new(&config, unix_now())
            .context("Failed to build devnet genesis")?;
        let gateway = Arc::new(InMemoryChainGateway::new(Arc::clone(&provider)));
        genesis
            .install(&gateway)
            .await
            .context("Failed to install devnet genesis")?;

        let mut listeners = Vec::with_capacity(genesis.operators().len());
        for i in 0..genesis.operators().len() {
            // Port 0 lets every node pick its own free port.
            let port = match config.p2p_port {
                0 => 0,
                first => first + i as u16,
            };
            listeners.push(BoundListener::bind(&config.listen_host, port).await?);
        }
        let peers: Vec<PeerInfo> = genesis
            .operators()
            .iter()
            .zip(&listeners)
            .map(|(op, bound)| PeerInfo::new(op.node_id.clone(), bound.address.to_string()))
            .collect();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut nodes = Vec::with_capacity(listeners.len());
        for (i, (operator, bound)) in genesis.operators().iter().zip(listeners).enumerate() {
            let bootstrap: &[String] = if i == 0 { &config.bootstrap_peers } else { &[] };
            let ctx = NodeContext {
                config: &config,
                gateway: &gateway,
                provider: &provider,
                peers: &peers,
                shutdown: shutdown_rx.clone(),
            };
            nodes.push(RelayNode::start(operator, bound, ctx, bootstrap).await?);
        }

        info!(
            nodes = nodes.len(),
            epoch_duration = genesis.network_config().epoch_duration,
            commit_duration = genesis.network_config().commit_duration,
            "All relay nodes running"
        );

        Ok(Self {
            gateway,
            nodes,
            shutdown_tx,
        })
    }

    pub fn gateway(&self) -> &Arc<InMemoryChainGateway> {
        &self.gateway
    }

    pub fn nodes(&self) -> &[RelayNode] {
        &self.nodes
    }

    /// Resolves when the first node's tick loop ends, returning its id.
    pub async fn wait_for_exit(&self) -> String {
        if self.nodes.is_empty() {
            return std::future::pending().await;
        }
        let (_, index, _) = select_all(self.nodes.iter().map(|n| Box::pin(n.exited()))).await;
        self.nodes[index].id().to_string()
    }

    /// Shutdown the runtime gracefully.
    ///
    /// ## Shutdown Sequence
    ///
    /// 1. Signal every gossip listener
    /// 2. Stop and join each tick loop
    /// 3. Report the first fatal error, if any node hit one
    pub async fn shutdown(self) -> Result<()> {
        info!("Initiating graceful shutdown...");
        let _ = self.shutdown_tx.send(true);

        let mut first_error = None;
        for node in self.nodes {
            if let Err(e) = node.stop().await {
                error!(error = %format!("{e:#}"), "Relay node failed");
                first_error.get_or_insert(e);
            }
        }

        info!("Shutdown complete");
        first_error.map_or(Ok(()), Err)
    }
}

fn unix_now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
