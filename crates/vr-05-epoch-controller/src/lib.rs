//! # vr-05-epoch-controller
//!
//! The phase state machine that paces the relay.
//!
//! ```text
//!            epoch starts            window elapses
//!   Idle ───────────────→ Commit ─────────────────→ Fail
//!                            │                        │
//!                            │ header on every        │
//!                            ▼ replica                │
//!                         Accept ◄────────────────────┘ (next epoch → Idle)
//! ```
//!
//! The controller keeps no protocol state between ticks beyond collected
//! signatures and rebroadcast times: every tick re-reads the epoch, config
//! and commit status from chain, so restarts and failed ticks are harmless.
//!
//! ## Tick, in the commit window
//!
//! 1. Derive the validator set and header for the current epoch.
//! 2. For every replica still missing it, the committee is the set behind
//!    that replica's last committed header. Compute the digest under the
//!    replica's EIP-712 domain; committee members sign and gossip (paced).
//! 3. Aggregate the committee's signatures; below threshold → wait.
//! 4. Verify the proof locally, then commit it with the committee roster.
//!
//! Replicas progress independently; a tick that commits on some but not
//! all of them reports [`TickOutcome::PartiallyCommitted`].

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod scheduler;
pub mod service;

pub use adapters::{ManualClock, SystemClock};
pub use config::ControllerConfig;
pub use domain::derive_phase;
pub use error::{ControllerError, ControllerResult};
pub use ports::TimeSource;
pub use scheduler::TickScheduler;
pub use service::{EpochController, SkipReason, TickOutcome};
