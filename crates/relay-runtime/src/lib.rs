//! # Relay Runtime Library
//!
//! Exposes the runtime modules for testing. The entry point is the
//! `relay-runtime` binary.
//!
//! ## Modular Structure
//!
//! - `container/` - Environment configuration
//! - `genesis/` - Devnet chain seeding and genesis header
//! - `wiring/` - Per-node subsystem wiring and the runtime that owns them

#![warn(clippy::all)]

pub mod container;
pub mod genesis;
pub mod wiring;

pub use container::{ConfigError, RelayConfig};
pub use genesis::{DevnetGenesis, GenesisError};
pub use wiring::{RelayNode, RelayRuntime};
