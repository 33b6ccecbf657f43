//! Ports for the chain gateway.

pub mod outbound;

pub use outbound::ChainGateway;
