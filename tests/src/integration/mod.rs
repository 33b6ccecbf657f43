//! Cross-subsystem integration tests.

pub mod aggregation;
pub mod controller;
pub mod derivation;
pub mod gossip;
