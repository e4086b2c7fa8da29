//! Server configuration from environment variables.

use std::net::{AddrParseError, SocketAddr};
use std::num::{NonZeroUsize, ParseIntError};

use thiserror::Error;

/// Address used when `TANDEM_LISTEN_ADDR` is not set.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:4000";

/// Frames a slow connection may fall behind before it starts losing them.
pub const DEFAULT_CHANNEL_CAPACITY: NonZeroUsize = NonZeroUsize::new(1024).unwrap();

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid TANDEM_LISTEN_ADDR {value:?}: {source}")]
    InvalidAddress {
        value: String,
        #[source]
        source: AddrParseError,
    },
    #[error("Invalid TANDEM_CHANNEL_CAPACITY {value:?}: {source}")]
    InvalidCapacity {
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("TANDEM_CHANNEL_CAPACITY must be greater than zero")]
    ZeroCapacity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub channel_capacity: NonZeroUsize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 4000)),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Load from `TANDEM_LISTEN_ADDR` and `TANDEM_CHANNEL_CAPACITY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variables. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let addr = get("TANDEM_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr: SocketAddr = addr
            .parse()
            .map_err(|source| ConfigError::InvalidAddress { value: addr.clone(), source })?;

        let channel_capacity = match get("TANDEM_CHANNEL_CAPACITY") {
            Some(value) => {
                let capacity: usize = value
                    .parse()
                    .map_err(|source| ConfigError::InvalidCapacity { value: value.clone(), source })?;
                NonZeroUsize::new(capacity).ok_or(ConfigError::ZeroCapacity)?
            }
            None => DEFAULT_CHANNEL_CAPACITY,
        };

        Ok(Self {
            listen_addr,
            channel_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.listen_addr.port(), 4000);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("TANDEM_LISTEN_ADDR", "127.0.0.1:9001"),
            ("TANDEM_CHANNEL_CAPACITY", " 32 "),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr, SocketAddr::from(([127, 0, 0, 1], 9001)));
        assert_eq!(config.channel_capacity.get(), 32);
    }

    #[test]
    fn test_blank_is_unset() {
        let config = ServerConfig::from_lookup(lookup(&[("TANDEM_LISTEN_ADDR", "  ")])).unwrap();
        assert_eq!(config.listen_addr, ServerConfig::default().listen_addr);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("TANDEM_LISTEN_ADDR", "localhost")])),
            Err(ConfigError::InvalidAddress { .. })
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("TANDEM_CHANNEL_CAPACITY", "lots")])),
            Err(ConfigError::InvalidCapacity { .. })
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("TANDEM_CHANNEL_CAPACITY", "0")])),
            Err(ConfigError::ZeroCapacity)
        ));
    }
}
