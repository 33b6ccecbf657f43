//! Ports for signature gossip.

pub mod inbound;
pub mod outbound;

pub use inbound::{DropReason, FrameHandler, ReceiveOutcome};
pub use outbound::{PeerDiscovery, PeerTransport};
