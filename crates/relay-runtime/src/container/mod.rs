//! # Relay Container
//!
//! Configuration the runtime is assembled from.

pub mod config;

pub use config::{ConfigError, RelayConfig, MAX_DEVNET_OPERATORS};
