//! Clock port.

use relay_types::Timestamp;

/// Wall clock in unix seconds.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}
