//! # Valset Relay Test Suite
//!
//! Cross-subsystem tests that need more than one crate wired together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # In-memory chain, keys and node builders
//! └── integration/
//!     ├── derivation.rs # vr-01 → vr-02: canonical sets and headers
//!     ├── aggregation.rs# vr-02 → vr-04: quorum soundness and membership
//!     ├── gossip.rs     # vr-03 → vr-04: delivery, epochs, TCP
//!     └── controller.rs # vr-05 driving everything end to end
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p relay-tests
//! cargo test -p relay-tests integration::controller::
//!
//! # Benchmarks
//! cargo bench -p relay-tests
//! ```

#[cfg(test)]
pub mod fixtures;
pub mod integration;
