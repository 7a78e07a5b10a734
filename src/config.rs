use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use crate::Error;

const SERVER_VAR: &str = "STUN_SERVER";
const TIMEOUT_VAR: &str = "STUN_TIMEOUT_MS";
const MAX_ATTEMPTS_VAR: &str = "STUN_MAX_ATTEMPTS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `host:port` of the STUN server.
    pub server: String,
    /// How long to wait for a response to each request.
    pub timeout: Duration,
    /// Total number of requests, each with a fresh transaction ID.
    pub max_attempts: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be an integer, got `{value}`")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: "stun.l.google.com:19302".to_string(),
            timeout: Duration::from_secs(2),
            max_attempts: 2,
        }
    }
}

impl Config {
    /// Starts from [`Config::default`] and applies `STUN_*` environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(server) = lookup(SERVER_VAR) {
            config.server = server;
        }
        if let Some(millis) = parse_var(&lookup, TIMEOUT_VAR)? {
            config.timeout = Duration::from_millis(millis);
        }
        if let Some(attempts) = parse_var(&lookup, MAX_ATTEMPTS_VAR)? {
            config.max_attempts = u32::try_from(attempts).map_err(|_| {
                ConfigError::InvalidNumber {
                    var: MAX_ATTEMPTS_VAR,
                    value: attempts.to_string(),
                }
            })?;
        }

        Ok(config)
    }

    /// Resolves [`Config::server`] to its first IPv4 address.
    pub fn resolve_server(&self) -> Result<SocketAddr, Error> {
        self.server
            .to_socket_addrs()?
            .find(|addr| addr.is_ipv4())
            .ok_or_else(|| Error::NoIpv4Address(self.server.clone()))
    }
}

fn parse_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };

    let number = value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber { var, value })?;
    if number == 0 {
        return Err(ConfigError::Zero(var));
    }

    Ok(Some(number))
}
