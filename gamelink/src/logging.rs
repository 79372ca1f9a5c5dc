//! Logging setup.
//!
//! All log configuration is an explicit [`LogConfig`] value. Building a
//! subscriber does not touch any global state, so tests can run several
//! independently configured subscribers side by side with
//! [`tracing::subscriber::with_default`]. Only [`LogConfig::try_init`] and
//! [`init_from_env`] install a global subscriber.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::config::{self, ConfigKey, ConfigSource};
use crate::system_log::SyslogLayer;

/// Log severity threshold, ordered from least to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    /// Failures only
    Error,
    /// Failures and warnings
    Warn,
    /// Normal operation (default)
    #[default]
    Info,
    /// Everything
    Debug,
}

impl LogLevel {
    /// Upper-case label, `WARNING` for [`LogLevel::Warn`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARNING",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }

    /// Whether a message at `message` passes this threshold.
    #[must_use]
    pub fn allows(&self, message: LogLevel) -> bool {
        message <= *self
    }

    /// Equivalent tracing filter.
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a log level or target string is not recognized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unrecognized {kind}: {value:?}")]
pub struct ParseLogError {
    kind: &'static str,
    value: String,
}

impl FromStr for LogLevel {
    type Err = ParseLogError;

    /// Accepts names (any case) and the numeric codes 3 (error) to 0 (debug).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" | "3" => Ok(Self::Error),
            "warn" | "warning" | "2" => Ok(Self::Warn),
            "info" | "1" => Ok(Self::Info),
            "debug" | "0" => Ok(Self::Debug),
            _ => Err(ParseLogError {
                kind: "log level",
                value: s.to_string(),
            }),
        }
    }
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogTarget {
    /// The host's system log only
    Syslog,
    /// Standard error (default)
    #[default]
    Console,
    /// Both
    Both,
}

impl LogTarget {
    /// Whether console output is enabled.
    pub fn writes_console(&self) -> bool {
        matches!(self, Self::Console | Self::Both)
    }

    /// Whether system-log output is enabled.
    pub fn writes_syslog(&self) -> bool {
        matches!(self, Self::Syslog | Self::Both)
    }
}

impl FromStr for LogTarget {
    type Err = ParseLogError;

    /// Accepts names (any case) and the numeric codes 0 (syslog), 1 (console), 2 (both).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "syslog" | "0" => Ok(Self::Syslog),
            "console" | "1" => Ok(Self::Console),
            "both" | "2" => Ok(Self::Both),
            _ => Err(ParseLogError {
                kind: "log target",
                value: s.to_string(),
            }),
        }
    }
}

/// Explicit logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Program identifier
    pub ident: String,
    /// Severity threshold
    pub level: LogLevel,
    /// Output target
    pub target: LogTarget,
    /// ANSI colors on console output
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            ident: "gaming".to_string(),
            level: LogLevel::Info,
            target: LogTarget::Console,
            ansi: false,
        }
    }
}

impl LogConfig {
    /// Default configuration with the given identifier.
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            ..Self::default()
        }
    }

    /// Set the severity threshold.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the output target.
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Enable or disable ANSI colors.
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Override the level from the `level_key` option of `source`, if set.
    pub fn load_level(
        mut self,
        source: &dyn ConfigSource,
        level_key: &ConfigKey,
    ) -> config::Result<Self> {
        if let Some(raw) = source.get(level_key)? {
            self.level = raw.parse().map_err(|_| config::ConfigError::Parse {
                key: level_key.clone(),
                value: raw.clone(),
                expected: "log level",
            })?;
        }
        Ok(self)
    }

    /// Filter derived only from this configuration, never from `RUST_LOG`.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(self.level.to_level_filter().into())
            .parse_lossy("")
    }

    /// Build a subscriber without installing it.
    ///
    /// For [`LogTarget::Syslog`] and [`LogTarget::Both`] this connects to the
    /// local system log. If that fails, console output is enabled instead so
    /// diagnostics are never silently dropped.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let syslog = if self.target.writes_syslog() {
            SyslogLayer::connect(&self.ident).ok()
        } else {
            None
        };
        self.subscriber_with(syslog)
    }

    /// Build a subscriber that sends system-log output to `syslog`.
    ///
    /// Console output is on when the target asks for it or when `syslog` is
    /// `None`.
    pub fn subscriber_with(
        &self,
        syslog: Option<SyslogLayer>,
    ) -> impl tracing::Subscriber + Send + Sync + 'static {
        let console = (self.target.writes_console() || syslog.is_none()).then(|| {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(self.ansi)
        });
        tracing_subscriber::registry()
            .with(self.env_filter())
            .with(console)
            .with(syslog)
    }

    /// Install this configuration as the global subscriber.
    ///
    /// Fails if a global subscriber is already set.
    pub fn try_init(&self) -> Result<(), TryInitError> {
        self.subscriber().try_init()?;
        info!(
            "[{}] Logging initialized (level={}, target={:?})",
            self.ident, self.level, self.target
        );
        Ok(())
    }
}

/// Development helper: initialize tracing subscriber when `RUST_LOG` is set.
///
/// Benches and tests can call `gamelink::logging::init_from_env()` to enable
/// structured logging for debugging. This is a no-op when `RUST_LOG` is not set
/// or when a global subscriber is already installed.
pub fn init_from_env() {
    use std::env;

    if env::var("RUST_LOG").is_ok() {
        // Best-effort: try to init a fmt subscriber from env filter.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }
}
