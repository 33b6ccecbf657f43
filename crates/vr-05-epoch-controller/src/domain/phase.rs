//! Phase derivation.
//!
//! ```text
//!   committed on every replica ───────────────→ Accept
//!   now < epoch_start ────────────────────────→ Idle
//!   now - epoch_start < commit + prolong ─────→ Commit
//!   otherwise ────────────────────────────────→ Fail
//! ```

use relay_types::{Phase, Timestamp};

pub fn derive_phase(
    epoch_start: Timestamp,
    now: Timestamp,
    commit_duration: u64,
    prolong_duration: u64,
    committed: bool,
) -> Phase {
    if committed {
        return Phase::Accept;
    }
    if now < epoch_start {
        return Phase::Idle;
    }
    if now - epoch_start < commit_duration.saturating_add(prolong_duration) {
        Phase::Commit
    } else {
        Phase::Fail
    }
}
