//! # Subsystem Wiring
//!
//! Connects the subsystems of each devnet node:
//!
//! ```text
//!             ┌──────────────────────────────────────┐
//!             │        InMemoryChainGateway (01)     │
//!             └──────────────────┬───────────────────┘
//!                                │ TimedChainGateway
//!                    ┌───────────┴───────────┐
//!                    ▼                       ▼
//!            EpochController (05) ──► ValidatorSetDeriver (02)
//!              │            │
//!              ▼            ▼
//!   SignatureGossip (03)  Aggregator (04)
//!              │
//!              ▼ TcpTransport / serve_tcp
//!         other relay nodes
//! ```

pub mod node;
pub mod runtime;

pub use node::{BoundListener, NodeContext, NodeController, NodeGateway, RelayNode};
pub use runtime::RelayRuntime;
