//! # Relay Configuration
//!
//! Defaults suitable for a local devnet, overridable from the environment.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VR_NODE_ID` | `relay-0` | Peer id of the local node |
//! | `VR_LISTEN_HOST` | `127.0.0.1` | Gossip listen address |
//! | `VR_P2P_PORT` | `7400` | Gossip port of the first devnet node |
//! | `VR_BOOTSTRAP_PEERS` | - | Comma separated `id@host:port` entries |
//! | `VR_BLS_SECRET` | - | Hex BLS secret of the local node |
//! | `VR_TICK_INTERVAL_SECS` | `2` | Controller tick interval |
//! | `VR_CALL_TIMEOUT_SECS` | `5` | Per-call chain and peer timeout |
//! | `VR_REBROADCAST_SECS` | `10` | Minimum spacing of signature rebroadcasts |
//! | `VR_DEVNET_OPERATORS` | `4` | Operators seeded into the devnet |

use std::time::Duration;

use relay_crypto::{BlsKeyPair, BlsSecretKey};
use thiserror::Error;

/// Largest devnet the runtime will start in one process.
pub const MAX_DEVNET_OPERATORS: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a valid value")]
    Invalid { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("VR_DEVNET_OPERATORS must be between 1 and {MAX_DEVNET_OPERATORS}, got {0}")]
    OperatorCount(usize),

    #[error("Gossip ports {first}..{last} exceed the port range")]
    PortRange { first: u16, last: usize },
}

/// Complete relay configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub node_id: String,
    pub listen_host: String,
    pub p2p_port: u16,
    pub bootstrap_peers: Vec<String>,
    /// Hex encoded; parsed by [`RelayConfig::local_keypair`]
    pub bls_secret: Option<String>,
    pub tick_interval: Duration,
    pub call_timeout: Duration,
    pub rebroadcast_interval: Duration,
    pub devnet_operators: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            node_id: "relay-0".to_string(),
            listen_host: "127.0.0.1".to_string(),
            p2p_port: 7400,
            bootstrap_peers: Vec::new(),
            bls_secret: None,
            tick_interval: Duration::from_secs(2),
            call_timeout: Duration::from_secs(5),
            rebroadcast_interval: Duration::from_secs(10),
            devnet_operators: 4,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(id) = lookup("VR_NODE_ID") {
            config.node_id = id;
        }
        if let Some(host) = lookup("VR_LISTEN_HOST") {
            config.listen_host = host;
        }
        if let Some(port) = lookup("VR_P2P_PORT") {
            config.p2p_port = parse("VR_P2P_PORT", &port)?;
        }
        if let Some(peers) = lookup("VR_BOOTSTRAP_PEERS") {
            config.bootstrap_peers = peers
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        config.bls_secret = lookup("VR_BLS_SECRET").filter(|s| !s.trim().is_empty());
        if let Some(secs) = lookup("VR_TICK_INTERVAL_SECS") {
            config.tick_interval = Duration::from_secs(parse("VR_TICK_INTERVAL_SECS", &secs)?);
        }
        if let Some(secs) = lookup("VR_CALL_TIMEOUT_SECS") {
            config.call_timeout = Duration::from_secs(parse("VR_CALL_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = lookup("VR_REBROADCAST_SECS") {
            config.rebroadcast_interval =
                Duration::from_secs(parse("VR_REBROADCAST_SECS", &secs)?);
        }
        if let Some(count) = lookup("VR_DEVNET_OPERATORS") {
            config.devnet_operators = parse("VR_DEVNET_OPERATORS", &count)?;
        }

        Ok(config)
    }

    /// Reject configurations the runtime cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Zero("VR_TICK_INTERVAL_SECS"));
        }
        if self.call_timeout.is_zero() {
            return Err(ConfigError::Zero("VR_CALL_TIMEOUT_SECS"));
        }
        if self.devnet_operators == 0 || self.devnet_operators > MAX_DEVNET_OPERATORS {
            return Err(ConfigError::OperatorCount(self.devnet_operators));
        }
        let last = self.p2p_port as usize + self.devnet_operators - 1;
        if last > u16::MAX as usize {
            return Err(ConfigError::PortRange {
                first: self.p2p_port,
                last,
            });
        }
        self.local_keypair()?;
        Ok(())
    }

    /// Key pair of the local node, if a secret was configured.
    pub fn local_keypair(&self) -> Result<Option<BlsKeyPair>, ConfigError> {
        let Some(hex) = self.bls_secret.as_deref() else {
            return Ok(None);
        };
        BlsSecretKey::from_hex(hex)
            .and_then(|secret| BlsKeyPair::from_secret(&secret))
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var: "VR_BLS_SECRET",
                value: "<redacted>".to_string(),
            })
    }
}

fn parse<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
    })
}
