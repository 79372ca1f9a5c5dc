//! # Gamelink
//!
//! Socket communication layer for the gaming console detection and control
//! daemons, plus the two collaborators every daemon needs at startup.
//!
//! ## Architecture
//!
//! - **`gamelink-core`**: endpoints over local (Unix domain) and IPv4 TCP
//!   transports, option management, transfer and readiness polling
//! - **`gamelink`**: this crate, re-exporting the core and adding
//!   - [`config`]: `(package, section, option)` configuration source backed by `uci`
//!   - [`settings`]: the socket path, port and timeout read at startup
//!   - [`logging`]: explicit tracing subscriber configuration
//!   - [`system_log`]: tracing layer forwarding events to the host's system log
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gamelink::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = UciConfig::new();
//! let settings = TransportSettings::load(&config, &SettingsKeys::default())?;
//! LogConfig::new("gaming-server").try_init()?;
//!
//! let listener = Endpoint::create_listener(
//!     &settings.local_address()?,
//!     &settings.endpoint_options(),
//! )?;
//! let conn = listener.accept()?;
//! if conn.is_readable(1000) {
//!     let request = conn.receive(DEFAULT_BUFFER_SIZE)?;
//!     conn.send_all(&request)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Blocking model
//!
//! Every call either returns immediately or blocks the calling thread for at
//! most the configured timeout. Non-blocking endpoints report
//! [`SocketError::WouldBlock`]; pair them with [`Endpoint::poll_readiness`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod logging;
pub mod settings;
pub mod system_log;

// Re-export core types
pub use bytes::Bytes;
pub use gamelink_core::address::{Address, Transport, MAX_LOCAL_PATH_LEN};
pub use gamelink_core::endpoint::{Endpoint, Role, State};
pub use gamelink_core::error::{SocketError, Step};
pub use gamelink_core::options::{
    EndpointOptions, DEFAULT_BACKLOG, DEFAULT_BUFFER_SIZE, DEFAULT_TIMEOUT_SECS, MAX_RECEIVE_LEN,
};
pub use gamelink_core::readiness::{Direction, Readiness};

/// Everything a daemon usually needs.
pub mod prelude {
    pub use crate::config::{ConfigError, ConfigKey, ConfigSource, MemoryConfig, UciConfig};
    pub use crate::logging::{LogConfig, LogLevel, LogTarget};
    pub use crate::settings::{SettingsKeys, TransportSettings};
    pub use gamelink_core::prelude::*;
}
