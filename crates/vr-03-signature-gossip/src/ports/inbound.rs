//! Inbound port - what transports call when a frame arrives.

use async_trait::async_trait;

/// Why an inbound frame was not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Oversized,
    Malformed,
    UnknownType,
    BadSignature,
    /// Epoch too far from the one being collected
    EpochOutOfWindow,
    /// Signature store limit reached
    StoreFull,
}

impl DropReason {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::Oversized => "oversized",
            DropReason::Malformed => "malformed",
            DropReason::UnknownType => "unknown_type",
            DropReason::BadSignature => "bad_signature",
            DropReason::EpochOutOfWindow => "epoch_out_of_window",
            DropReason::StoreFull => "store_full",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// New signature stored
    Stored,
    /// Same key already signed this `(epoch, hash)`
    Duplicate,
    Dropped(DropReason),
}

/// Handler for a single complete inbound frame.
///
/// Never fails: anything that cannot be used is dropped and reported.
#[async_trait]
pub trait FrameHandler: Send + Sync {
    async fn handle_frame(&self, frame: &[u8]) -> ReceiveOutcome;
}
