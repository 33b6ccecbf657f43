//! One relay node: gossip listener plus epoch controller loop.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use relay_crypto::{BlsProvider, Signer};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use vr_01_chain_gateway::{InMemoryChainGateway, TimedChainGateway};
use vr_03_signature_gossip::{
    serve_tcp, GossipResult, PeerInfo, SignatureGossip, StaticDiscovery, TcpTransport,
};
use vr_04_aggregator::Aggregator;
use vr_05_epoch_controller::{ControllerConfig, EpochController, SystemClock, TickScheduler};

use crate::container::RelayConfig;
use crate::genesis::{DevnetGenesis, DevnetOperator};

/// Chain access as seen by a node: every call bounded by the call timeout.
pub type NodeGateway = TimedChainGateway<Arc<InMemoryChainGateway>>;
pub type NodeController = EpochController<NodeGateway, TcpTransport>;

/// Listener bound for a node before any node starts, so every peer address
/// is known up front.
pub struct BoundListener {
    pub listener: TcpListener,
    pub address: SocketAddr,
}

impl BoundListener {
    pub async fn bind(host: &str, port: u16) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("Failed to bind gossip listener on {host}:{port}"))?;
        let address = listener.local_addr()?;
        Ok(Self { listener, address })
    }
}

/// A running relay node.
pub struct RelayNode {
    id: String,
    address: SocketAddr,
    gossip: Arc<SignatureGossip<TcpTransport>>,
    controller: Arc<NodeController>,
    listener: JoinHandle<GossipResult<()>>,
    scheduler: TickScheduler,
}

/// Everything a node needs from its neighbours at startup.
pub struct NodeContext<'a> {
    pub config: &'a RelayConfig,
    pub gateway: &'a Arc<InMemoryChainGateway>,
    pub provider: &'a Arc<dyn BlsProvider>,
    pub peers: &'a [PeerInfo],
    pub shutdown: watch::Receiver<bool>,
}

impl RelayNode {
    /// Wire gossip, aggregation and the controller for `operator` and start
    /// its listener and tick loop.
    pub async fn start(
        operator: &DevnetOperator,
        bound: BoundListener,
        ctx: NodeContext<'_>,
        bootstrap: &[String],
    ) -> Result<Self> {
        let signer: Arc<dyn Signer> = Arc::clone(&operator.keypair) as Arc<dyn Signer>;
        let gossip = Arc::new(SignatureGossip::new(
            operator.node_id.clone(),
            signer,
            Arc::clone(ctx.provider),
            Arc::new(TcpTransport::new(ctx.config.call_timeout)),
        ));
        gossip
            .refresh_peers(&StaticDiscovery::new(ctx.peers.to_vec()))
            .await;
        if !bootstrap.is_empty() {
            gossip
                .refresh_peers(&StaticDiscovery::from_bootstrap(bootstrap))
                .await;
        }

        let listener = tokio::spawn(serve_tcp(
            bound.listener,
            Arc::clone(&gossip),
            ctx.shutdown,
        ));

        let controller_config = ControllerConfig {
            tick_interval: ctx.config.tick_interval,
            rebroadcast_interval: ctx.config.rebroadcast_interval,
            ..ControllerConfig::new(DevnetGenesis::driver())
        };
        let gateway = Arc::new(TimedChainGateway::new(
            Arc::clone(ctx.gateway),
            ctx.config.call_timeout,
        ));
        let controller = Arc::new(EpochController::new(
            controller_config,
            gateway,
            Arc::clone(&gossip),
            Aggregator::new(Arc::clone(ctx.provider)),
            Arc::new(SystemClock),
        ));
        let scheduler = TickScheduler::spawn(Arc::clone(&controller), ctx.config.tick_interval);

        info!(
            node = %operator.node_id,
            address = %bound.address,
            voting_power = operator.voting_power,
            peers = gossip.peers().len(),
            "Relay node started"
        );

        Ok(Self {
            id: operator.node_id.clone(),
            address: bound.address,
            gossip,
            controller,
            listener,
            scheduler,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn gossip(&self) -> &Arc<SignatureGossip<TcpTransport>> {
        &self.gossip
    }

    pub fn controller(&self) -> &Arc<NodeController> {
        &self.controller
    }

    /// Resolves once the tick loop has ended.
    pub async fn exited(&self) {
        self.scheduler.exited().await
    }

    /// Stop the tick loop and wait for the listener. The shutdown signal for
    /// the listener is owned by the runtime and must already be sent.
    pub async fn stop(self) -> Result<()> {
        let result = self.scheduler.stop().await;
        match self.listener.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(node = %self.id, error = %e, "Gossip listener failed"),
            Err(e) => warn!(node = %self.id, error = %e, "Gossip listener task panicked"),
        }
        result.with_context(|| format!("Relay node {} stopped on a fatal error", self.id))
    }
}
