//! Key/value configuration source.
//!
//! Options are addressed by `(package, section, option)` triples, the way the
//! OpenWrt `uci` tool addresses them. [`UciConfig`] talks to the real tool,
//! [`MemoryConfig`] keeps everything in memory for tests and embedding.
//!
//! # Examples
//!
//! ```
//! use gamelink::config::{ConfigKey, ConfigSource, MemoryConfig};
//!
//! let config = MemoryConfig::new();
//! let key = ConfigKey::new("gaming", "core", "enabled");
//! config.set_bool(&key, true).unwrap();
//! assert!(config.get_bool(&key).unwrap());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Output};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

/// Address of one configuration option.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigKey {
    /// Configuration file name, e.g. `gaming`
    pub package: String,
    /// Section inside the file
    pub section: String,
    /// Option inside the section
    pub option: String,
}

impl ConfigKey {
    /// Build a key from its three parts.
    pub fn new(
        package: impl Into<String>,
        section: impl Into<String>,
        option: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            section: section.into(),
            option: option.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        for part in [&self.package, &self.section, &self.option] {
            if part.is_empty() || part.chars().any(|c| c == '.' || c == '=' || c.is_whitespace()) {
                return Err(ConfigError::InvalidKey(self.to_string()));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.package, self.section, self.option)
    }
}

/// Errors raised by configuration sources.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The option is not set
    #[error("Config option not found: {0}")]
    NotFound(ConfigKey),

    /// The key contains characters the store cannot address
    #[error("Invalid config key: {0:?}")]
    InvalidKey(String),

    /// The stored value has the wrong shape
    #[error("Config option {key} = {value:?} is not a valid {expected}")]
    Parse {
        /// Offending key
        key: ConfigKey,
        /// Raw stored value
        value: String,
        /// What the value should have been
        expected: &'static str,
    },

    /// The external tool exited unsuccessfully
    #[error("`{command}` failed: {stderr}")]
    Command {
        /// Command line that was run
        command: String,
        /// Trimmed standard error output
        stderr: String,
    },

    /// The external tool could not be run
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// A `(package, section, option)` addressed key/value store.
pub trait ConfigSource {
    /// Raw value of `key`, or `None` if it is not set.
    fn get(&self, key: &ConfigKey) -> Result<Option<String>>;

    /// Stage a new value for `key`.
    fn set(&self, key: &ConfigKey, value: &str) -> Result<()>;

    /// Persist staged changes of `package`.
    fn commit(&self, package: &str) -> Result<()>;

    /// Value of `key`, failing with [`ConfigError::NotFound`] if unset.
    fn get_string(&self, key: &ConfigKey) -> Result<String> {
        self.get(key)?
            .ok_or_else(|| ConfigError::NotFound(key.clone()))
    }

    /// Integer value of `key`. Surrounding whitespace is ignored.
    fn get_int(&self, key: &ConfigKey) -> Result<i64> {
        let value = self.get_string(key)?;
        parse_int(key, &value)
    }

    /// Boolean value of `key`: `1`, `true` and `yes` (any case) are true,
    /// anything else is false.
    fn get_bool(&self, key: &ConfigKey) -> Result<bool> {
        Ok(parse_bool(&self.get_string(key)?))
    }

    /// Stage an integer value.
    fn set_int(&self, key: &ConfigKey, value: i64) -> Result<()> {
        self.set(key, &value.to_string())
    }

    /// Stage a boolean value as `1` or `0`.
    fn set_bool(&self, key: &ConfigKey, value: bool) -> Result<()> {
        self.set(key, if value { "1" } else { "0" })
    }
}

pub(crate) fn parse_int(key: &ConfigKey, value: &str) -> Result<i64> {
    value.trim().parse().map_err(|_| ConfigError::Parse {
        key: key.clone(),
        value: value.to_string(),
        expected: "integer",
    })
}

pub(crate) fn parse_bool(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
}

/// Configuration backed by the external `uci` command.
///
/// Arguments are passed directly to the program, never through a shell.
#[derive(Debug, Clone)]
pub struct UciConfig {
    program: PathBuf,
}

impl Default for UciConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("uci"),
        }
    }
}

impl UciConfig {
    /// Use the `uci` found on `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific program instead of `uci`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        debug!("[CONFIG] {} {}", self.program.display(), args.join(" "));
        Ok(Command::new(&self.program).args(args).output()?)
    }

    fn run_checked(&self, args: &[&str]) -> Result<()> {
        let output = self.run(args)?;
        if output.status.success() {
            return Ok(());
        }
        let command = format!("{} {}", self.program.display(), args.join(" "));
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!("[CONFIG] `{}` exited with {}: {}", command, output.status, stderr);
        Err(ConfigError::Command { command, stderr })
    }
}

impl ConfigSource for UciConfig {
    fn get(&self, key: &ConfigKey) -> Result<Option<String>> {
        key.validate()?;
        let output = self.run(&["get", &key.to_string()])?;
        // uci exits non-zero with "Entry not found" for unset options
        if !output.status.success() {
            return Ok(None);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().map(str::to_string))
    }

    fn set(&self, key: &ConfigKey, value: &str) -> Result<()> {
        key.validate()?;
        self.run_checked(&["set", &format!("{key}={value}")])
    }

    fn commit(&self, package: &str) -> Result<()> {
        if package.is_empty() || package.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidKey(package.to_string()));
        }
        self.run_checked(&["commit", package])
    }
}

#[derive(Debug, Default)]
struct Store {
    staged: HashMap<ConfigKey, String>,
    committed: HashMap<ConfigKey, String>,
}

/// In-memory configuration source.
///
/// `get` sees staged values, like `uci get` does; [`MemoryConfig::committed`]
/// only sees what [`ConfigSource::commit`] persisted.
#[derive(Debug, Default)]
pub struct MemoryConfig {
    store: Mutex<Store>,
}

impl MemoryConfig {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with committed entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ConfigKey>,
        V: Into<String>,
    {
        let committed = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            store: Mutex::new(Store {
                staged: HashMap::new(),
                committed,
            }),
        }
    }

    /// Committed value of `key`, ignoring staged changes.
    pub fn committed(&self, key: &ConfigKey) -> Option<String> {
        self.store.lock().committed.get(key).cloned()
    }
}

impl From<(&str, &str, &str)> for ConfigKey {
    fn from((package, section, option): (&str, &str, &str)) -> Self {
        ConfigKey::new(package, section, option)
    }
}

impl ConfigSource for MemoryConfig {
    fn get(&self, key: &ConfigKey) -> Result<Option<String>> {
        key.validate()?;
        let store = self.store.lock();
        Ok(store
            .staged
            .get(key)
            .or_else(|| store.committed.get(key))
            .cloned())
    }

    fn set(&self, key: &ConfigKey, value: &str) -> Result<()> {
        key.validate()?;
        self.store.lock().staged.insert(key.clone(), value.to_string());
        Ok(())
    }

    fn commit(&self, package: &str) -> Result<()> {
        let mut store = self.store.lock();
        let keys: Vec<ConfigKey> = store
            .staged
            .keys()
            .filter(|k| k.package == package)
            .cloned()
            .collect();
        for key in keys {
            if let Some(value) = store.staged.remove(&key) {
                store.committed.insert(key, value);
            }
        }
        Ok(())
    }
}
