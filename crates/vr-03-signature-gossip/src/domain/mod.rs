//! Gossip domain: wire envelope, signature store, peer registry.

pub mod envelope;
pub mod peers;
pub mod store;

pub use envelope::{Envelope, MAX_FRAME_SIZE, SIGNATURE_TYPE};
pub use peers::{PeerId, PeerInfo, PeerRegistry};
pub use store::{InsertOutcome, SignatureStore, StoreLimits};
