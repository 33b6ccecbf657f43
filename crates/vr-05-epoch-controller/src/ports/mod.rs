//! Controller ports.

pub mod time;

pub use time::TimeSource;
