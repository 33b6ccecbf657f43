//! Chain gateway adapters.

pub mod in_memory;
pub mod timed;

pub use in_memory::{ClockFn, InMemoryChainGateway};
pub use timed::TimedChainGateway;
