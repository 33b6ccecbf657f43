//! # Genesis Module
//!
//! Seeds the in-memory chain so the relay can run without external RPCs.
//!
//! ## Initialization Sequence
//!
//! 1. Derive deterministic operator keys (node 0 may use `VR_BLS_SECRET`)
//! 2. Deploy driver, voting-power provider, key registry and settlement
//! 3. Derive the epoch-0 validator set and commit it with `set_genesis`

pub mod devnet;

pub use devnet::{
    DevnetGenesis, DevnetOperator, GenesisError, DEVNET_CHAIN_ID, DEVNET_COMMIT_DURATION,
    DEVNET_EPOCH_DURATION,
};
