//! # Valset Relay Runtime
//!
//! Runs a devnet of relay nodes in one process against an in-memory chain.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (`VR_LOG_LEVEL`, `VR_JSON_LOGS`, ...)
//! 2. Load configuration from the environment
//! 3. Seed the devnet chain and commit genesis
//! 4. Start gossip listeners and tick loops
//! 5. Run until Ctrl+C or until a node stops on a fatal error

use anyhow::{Context, Result};
use relay_runtime::{RelayConfig, RelayRuntime};
use relay_telemetry::{init_telemetry, TelemetryConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = RelayConfig::from_env().context("Failed to load configuration")?;

    info!("===========================================");
    info!("  Valset Relay v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    info!(
        node = %config.node_id,
        operators = config.devnet_operators,
        p2p_port = config.p2p_port,
        tick_secs = config.tick_interval.as_secs(),
        "Starting relay"
    );

    let runtime = RelayRuntime::start(config).await?;

    info!("Relay is running. Press Ctrl+C to stop.");
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            info!("Shutdown signal received");
        }
        node = runtime.wait_for_exit() => {
            error!(%node, "Relay node stopped unexpectedly");
        }
    }

    runtime.shutdown().await
}
