//! Process configuration

use crate::error::ConfigError;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_STATIC_DIR: &str = "public";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Directory served at `/`, if any
    pub static_dir: Option<PathBuf>,
    pub session: SessionSettings,
}

/// Per-connection tuning.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Outbound frames buffered per connection before deliveries are dropped
    pub max_send_queue: usize,
    pub heartbeat_interval: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_send_queue: 256,
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            static_dir: Some(PathBuf::from(DEFAULT_STATIC_DIR)),
            session: SessionSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Read `PORT` and `STATIC_DIR` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT").filter(|p| !p.is_empty()) {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port))?;
        }

        if let Some(dir) = lookup("STATIC_DIR") {
            config.static_dir = (!dir.is_empty()).then(|| PathBuf::from(dir));
        }

        Ok(config)
    }
}
