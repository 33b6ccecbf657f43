//! # vr-03-signature-gossip
//!
//! Best-effort dissemination of partial BLS signatures over header digests.
//!
//! ## Wire Format
//!
//! One JSON envelope per stream, read once with a 64 KiB bound:
//!
//! ```text
//! {"type": "signature", "sender": "node-1", "timestamp": 1700000000, "data": "<hex>"}
//! ```
//!
//! ## Receive Path
//!
//! ```text
//! frame ──→ size bound ──→ envelope ──→ type dispatch ──→ epoch window ──→ BLS verify ──→ SignatureStore
//!              │              │              │                │               │              │
//!              └──────────────┴──────────────┴─── dropped + counted ─────────┴──── full ────┘
//! ```
//!
//! Validator-set membership is not checked here; the aggregator filters
//! signers against the derived set.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{serve_tcp, InMemoryNetwork, InMemoryTransport, StaticDiscovery, TcpTransport};
pub use domain::{
    Envelope, InsertOutcome, PeerId, PeerInfo, PeerRegistry, SignatureStore, StoreLimits,
    MAX_FRAME_SIZE,
};
pub use error::{GossipError, GossipResult};
pub use ports::{DropReason, FrameHandler, PeerDiscovery, PeerTransport, ReceiveOutcome};
pub use service::{BroadcastReport, SignatureGossip, EPOCH_WINDOW};
