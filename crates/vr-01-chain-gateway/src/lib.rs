//! # VR-01 Chain Gateway
//!
//! Read/write access to the contracts the relay depends on.
//!
//! **Subsystem ID:** 01
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Purpose
//!
//! Every on-chain interaction of the relay goes through the [`ChainGateway`]
//! port:
//! - driver reads (network config, epoch schedule)
//! - voting-power and key-registry reads
//! - settlement reads (committed headers, EIP-712 domain)
//! - settlement writes (genesis, header commits)
//!
//! ## Module Structure
//!
//! ```text
//! vr-01-chain-gateway/
//! ├── domain/          # GatewayError, revert decoding
//! ├── ports/           # ChainGateway
//! └── adapters/        # TimedChainGateway, InMemoryChainGateway
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{ClockFn, InMemoryChainGateway, TimedChainGateway};
pub use domain::{
    decode_revert, encode_custom_error, encode_error_string, selector, GatewayError,
    GatewayResult, RevertReason,
};
pub use ports::ChainGateway;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
