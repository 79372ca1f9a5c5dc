//! Startup settings consumed by the socket layer.
//!
//! The socket layer needs exactly three values from configuration: a local
//! socket path, a TCP port and a timeout in seconds.

use std::path::PathBuf;

use gamelink_core::address::Address;
use gamelink_core::options::{EndpointOptions, DEFAULT_TIMEOUT_SECS};
use tracing::debug;

use crate::config::{parse_int, ConfigError, ConfigKey, ConfigSource, Result};

/// Local socket path used when none is configured.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/gaming_button.sock";

/// TCP port used when none is configured.
pub const DEFAULT_PORT: u16 = 8080;

/// Where the three settings live in the configuration source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsKeys {
    /// Local socket path
    pub socket_path: ConfigKey,
    /// TCP port
    pub port: ConfigKey,
    /// Timeout in seconds
    pub timeout: ConfigKey,
}

impl Default for SettingsKeys {
    fn default() -> Self {
        Self {
            socket_path: ConfigKey::new("gaming", "core", "socket_path"),
            port: ConfigKey::new("gaming-server", "core", "websocket_port"),
            timeout: ConfigKey::new("gaming", "core", "socket_timeout"),
        }
    }
}

/// Transport settings read at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    /// Rendezvous path for the local transport
    pub socket_path: PathBuf,
    /// Port for the remote transport
    pub port: u16,
    /// Blocking timeout in seconds, `0` meaning indefinite
    pub timeout_secs: u32,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            port: DEFAULT_PORT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TransportSettings {
    /// Load settings from `source`.
    ///
    /// Unset options keep their defaults; set but malformed options are errors.
    pub fn load(source: &dyn ConfigSource, keys: &SettingsKeys) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(path) = source.get(&keys.socket_path)? {
            let path = path.trim();
            if path.is_empty() {
                return Err(parse_error(&keys.socket_path, path, "socket path"));
            }
            settings.socket_path = PathBuf::from(path);
        }

        if let Some(raw) = source.get(&keys.port)? {
            let port = parse_int(&keys.port, &raw)?;
            settings.port = u16::try_from(port)
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| parse_error(&keys.port, &raw, "port (1-65535)"))?;
        }

        if let Some(raw) = source.get(&keys.timeout)? {
            let timeout = parse_int(&keys.timeout, &raw)?;
            settings.timeout_secs = u32::try_from(timeout)
                .map_err(|_| parse_error(&keys.timeout, &raw, "timeout in seconds"))?;
        }

        debug!("[CONFIG] Transport settings: {:?}", settings);
        Ok(settings)
    }

    /// Address of the local transport.
    pub fn local_address(&self) -> gamelink_core::error::Result<Address> {
        Address::local(&self.socket_path)
    }

    /// Address of the remote transport on `host`.
    pub fn remote_address(&self, host: &str) -> gamelink_core::error::Result<Address> {
        Address::remote(host, u32::from(self.port))
    }

    /// Endpoint options carrying the configured timeout.
    pub fn endpoint_options(&self) -> EndpointOptions {
        EndpointOptions::default().with_timeout(self.timeout_secs)
    }
}

fn parse_error(key: &ConfigKey, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::Parse {
        key: key.clone(),
        value: value.to_string(),
        expected,
    }
}
