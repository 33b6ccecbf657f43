//! Clock adapters.

pub mod clock;

pub use clock::{ManualClock, SystemClock};
