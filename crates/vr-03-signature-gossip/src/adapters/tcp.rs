//! TCP transport.
//!
//! One frame per connection: the sender writes the envelope and closes its
//! write half, the receiver does a single bounded read to EOF.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::{PeerInfo, MAX_FRAME_SIZE};
use crate::error::{GossipError, GossipResult};
use crate::ports::{FrameHandler, PeerTransport};

/// Default connect/write timeout for one send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Inbound streams that stall longer than this are dropped.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TcpTransport {
    send_timeout: Duration,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_SEND_TIMEOUT)
    }
}

impl TcpTransport {
    pub fn new(send_timeout: Duration) -> Self {
        Self { send_timeout }
    }

    async fn deliver(address: &str, frame: &[u8]) -> std::io::Result<()> {
        let mut stream = TcpStream::connect(address).await?;
        stream.write_all(frame).await?;
        stream.shutdown().await
    }
}

#[async_trait]
impl PeerTransport for TcpTransport {
    async fn send(&self, peer: &PeerInfo, frame: Vec<u8>) -> GossipResult<()> {
        let unreachable = |reason: String| GossipError::PeerUnreachable {
            peer: peer.id.clone(),
            reason,
        };
        match timeout(self.send_timeout, Self::deliver(&peer.address, &frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(unreachable(e.to_string())),
            Err(_) => Err(unreachable(format!(
                "send timed out after {}ms",
                self.send_timeout.as_millis()
            ))),
        }
    }
}

/// Read at most `MAX_FRAME_SIZE + 1` bytes so oversized frames are detectable
/// without buffering them whole.
async fn read_frame(stream: &mut TcpStream) -> GossipResult<Vec<u8>> {
    let mut frame = Vec::new();
    let limit = (MAX_FRAME_SIZE + 1) as u64;
    match timeout(READ_TIMEOUT, stream.take(limit).read_to_end(&mut frame)).await {
        Ok(Ok(_)) => Ok(frame),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(GossipError::Io("read timed out".to_string())),
    }
}

async fn handle_stream<H: FrameHandler + ?Sized>(
    mut stream: TcpStream,
    remote: SocketAddr,
    handler: Arc<H>,
) {
    match read_frame(&mut stream).await {
        Ok(frame) if frame.is_empty() => debug!(%remote, "[vr-03] Empty inbound stream"),
        Ok(frame) => {
            let outcome = handler.handle_frame(&frame).await;
            debug!(%remote, bytes = frame.len(), ?outcome, "[vr-03] Inbound frame handled");
        }
        Err(e) => debug!(%remote, error = %e, "[vr-03] Failed to read inbound frame"),
    }
}

/// Accept loop. Each inbound stream is handled on its own task; returns when
/// `shutdown` flips to `true` or its sender is dropped.
pub async fn serve_tcp<H>(
    listener: TcpListener,
    handler: Arc<H>,
    mut shutdown: watch::Receiver<bool>,
) -> GossipResult<()>
where
    H: FrameHandler + ?Sized + 'static,
{
    let local = listener.local_addr()?;
    info!(%local, "[vr-03] Gossip listener started");

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, remote)) => {
                    tokio::spawn(handle_stream(stream, remote, Arc::clone(&handler)));
                }
                Err(e) => warn!(error = %e, "[vr-03] Accept failed"),
            },
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!(%local, "[vr-03] Gossip listener stopped");
    Ok(())
}
