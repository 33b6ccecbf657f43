//! Timer loop driving [`EpochController::tick`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use vr_01_chain_gateway::ChainGateway;
use vr_03_signature_gossip::PeerTransport;

use crate::error::{ControllerError, ControllerResult};
use crate::service::EpochController;

/// Runs ticks on a fixed interval until stopped or a fatal error occurs.
///
/// Missed ticks are skipped, not bursted. Shutdown also cancels a tick that
/// is in flight.
pub struct TickScheduler {
    shutdown: watch::Sender<bool>,
    exited: watch::Receiver<bool>,
    handle: JoinHandle<ControllerResult<()>>,
}

impl TickScheduler {
    pub fn spawn<G, T>(controller: Arc<EpochController<G, T>>, tick_interval: Duration) -> Self
    where
        G: ChainGateway + 'static,
        T: PeerTransport + 'static,
    {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (exited_tx, exited) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let result = run_loop(controller, tick_interval, shutdown_rx).await;
            let _ = exited_tx.send(true);
            result
        });
        Self {
            shutdown,
            exited,
            handle,
        }
    }

    /// Resolves once the loop has ended, for whatever reason.
    pub async fn exited(&self) {
        let mut exited = self.exited.clone();
        let _ = exited.wait_for(|done| *done).await;
    }

    /// Signal shutdown and join the loop. Returns the fatal error if the loop
    /// had already stopped on one.
    pub async fn stop(self) -> ControllerResult<()> {
        let _ = self.shutdown.send(true);
        self.handle
            .await
            .map_err(|e| ControllerError::Task(e.to_string()))?
    }
}

async fn run_loop<G, T>(
    controller: Arc<EpochController<G, T>>,
    tick_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> ControllerResult<()>
where
    G: ChainGateway + 'static,
    T: PeerTransport + 'static,
{
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(interval_ms = tick_interval.as_millis() as u64, "[vr-05] Tick scheduler started");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = interval.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            result = controller.tick() => result,
        };

        match result {
            Ok(outcome) => debug!(?outcome, "[vr-05] Tick finished"),
            Err(e) if e.is_fatal() => {
                error!(error = %e, "[vr-05] Fatal error, stopping scheduler");
                return Err(e);
            }
            Err(e) => warn!(error = %e, "[vr-05] Tick aborted, retrying next interval"),
        }
    }

    info!("[vr-05] Tick scheduler stopped");
    Ok(())
}
