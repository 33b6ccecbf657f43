//! Transport and discovery adapters.

pub mod discovery;
pub mod memory;
pub mod tcp;

pub use discovery::StaticDiscovery;
pub use memory::{InMemoryNetwork, InMemoryTransport};
pub use tcp::{serve_tcp, TcpTransport};
