//! Pure controller logic.

pub mod pacing;
pub mod phase;

pub use pacing::RebroadcastPacer;
pub use phase::derive_phase;
