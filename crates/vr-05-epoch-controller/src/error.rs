//! Error types for the epoch controller

use relay_types::{CrossChainAddress, Epoch};
use thiserror::Error;
use vr_01_chain_gateway::GatewayError;
use vr_02_valset_deriver::DeriverError;
use vr_03_signature_gossip::GossipError;
use vr_04_aggregator::AggregatorError;

/// Controller errors
///
/// Any of these aborts the current tick; only [`ControllerError::is_fatal`]
/// ones stop the scheduler.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Chain gateway: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Validator set derivation: {0}")]
    Deriver(#[from] DeriverError),

    #[error("Signature gossip: {0}")]
    Gossip(#[from] GossipError),

    #[error("Aggregation: {0}")]
    Aggregator(#[from] AggregatorError),

    /// Aggregated proof failed local verification; never committed
    #[error("Aggregated proof for epoch {epoch} failed self-check")]
    SelfCheckFailed { epoch: Epoch },

    /// Replica has no committed header to sign against
    #[error("Settlement {replica} has no committed header")]
    NotInitialized { replica: CrossChainAddress },

    /// Locally derived set disagrees with the header a replica committed
    #[error("Derived set for epoch {epoch} does not match the header on {replica}")]
    CommitteeMismatch {
        epoch: Epoch,
        replica: CrossChainAddress,
    },

    /// Scheduler task panicked or was cancelled
    #[error("Scheduler task failed: {0}")]
    Task(String),
}

impl ControllerError {
    /// Configuration errors that retrying cannot fix.
    pub fn is_fatal(&self) -> bool {
        match self {
            ControllerError::Gateway(e) => e.is_fatal(),
            ControllerError::Deriver(e) => e.is_fatal(),
            _ => false,
        }
    }

    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            ControllerError::Gateway(e) if e.is_transient() => "gateway_transient",
            ControllerError::Gateway(_) => "gateway",
            ControllerError::Deriver(_) => "deriver",
            ControllerError::Gossip(_) => "gossip",
            ControllerError::Aggregator(_) => "aggregator",
            ControllerError::SelfCheckFailed { .. } => "self_check",
            ControllerError::NotInitialized { .. } => "not_initialized",
            ControllerError::CommitteeMismatch { .. } => "committee_mismatch",
            ControllerError::Task(_) => "task",
        }
    }
}

/// Result type for controller operations
pub type ControllerResult<T> = Result<T, ControllerError>;
