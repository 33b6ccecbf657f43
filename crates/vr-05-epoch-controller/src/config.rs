//! Controller configuration.

use std::time::Duration;

use relay_types::CrossChainAddress;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_REBROADCAST_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Driver contract the epoch schedule and network config are read from
    pub driver: CrossChainAddress,
    pub tick_interval: Duration,
    /// Minimum spacing between broadcasts of the same signature
    pub rebroadcast_interval: Duration,
}

impl ControllerConfig {
    pub fn new(driver: CrossChainAddress) -> Self {
        Self {
            driver,
            tick_interval: DEFAULT_TICK_INTERVAL,
            rebroadcast_interval: DEFAULT_REBROADCAST_INTERVAL,
        }
    }
}
