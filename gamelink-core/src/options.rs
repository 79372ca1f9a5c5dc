//! Endpoint configuration options
//!
//! Per-endpoint behavior that is applied after creation: blocking timeout,
//! non-blocking mode, address reuse and listen backlog. Options are plain
//! values; nothing is persisted.

use std::time::Duration;

/// Listen backlog used when none (or a non-positive one) is configured.
pub const DEFAULT_BACKLOG: i32 = 5;

/// Default blocking timeout, in seconds, used by daemons at startup.
pub const DEFAULT_TIMEOUT_SECS: u32 = 5;

/// Default receive buffer size for callers that read in chunks.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Largest buffer a single [`Endpoint::receive`](crate::endpoint::Endpoint::receive)
/// call allocates. Larger requests are clamped, which is still a valid short read.
pub const MAX_RECEIVE_LEN: usize = 64 * 1024;

/// Endpoint configuration.
///
/// # Examples
///
/// ```
/// use gamelink_core::options::EndpointOptions;
///
/// let opts = EndpointOptions::default()
///     .with_timeout(5)
///     .with_backlog(16);
/// assert_eq!(opts.effective_backlog(), 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointOptions {
    /// Receive/send timeout in seconds (SO_RCVTIMEO / SO_SNDTIMEO)
    ///
    /// - `None`: leave the platform default untouched (block indefinitely)
    /// - `Some(0)`: explicitly wait indefinitely
    /// - `Some(n)`: blocking transfers give up after `n` seconds
    pub timeout: Option<u32>,

    /// Non-blocking mode (O_NONBLOCK)
    ///
    /// Transfers return [`SocketError::WouldBlock`](crate::error::SocketError::WouldBlock)
    /// instead of waiting. Takes precedence over `timeout`.
    pub nonblocking: bool,

    /// Address reuse (SO_REUSEADDR)
    ///
    /// Only meaningful before the bind step of a remote listener.
    /// - Default: `true`
    pub reuse_address: bool,

    /// Listen backlog
    ///
    /// Values `<= 0` fall back to [`DEFAULT_BACKLOG`].
    pub backlog: i32,
}

impl Default for EndpointOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            nonblocking: false,
            reuse_address: true,
            backlog: DEFAULT_BACKLOG,
        }
    }
}

impl EndpointOptions {
    /// Create new endpoint options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the blocking timeout in seconds. `0` means wait indefinitely.
    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Enable or disable non-blocking mode.
    pub fn with_nonblocking(mut self, nonblocking: bool) -> Self {
        self.nonblocking = nonblocking;
        self
    }

    /// Enable or disable address reuse.
    pub fn with_reuse_address(mut self, reuse: bool) -> Self {
        self.reuse_address = reuse;
        self
    }

    /// Set the listen backlog.
    pub fn with_backlog(mut self, backlog: i32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Backlog actually passed to `listen(2)`.
    #[must_use]
    pub fn effective_backlog(&self) -> i32 {
        if self.backlog > 0 {
            self.backlog
        } else {
            DEFAULT_BACKLOG
        }
    }

    /// Timeout as a socket-level duration; `0` seconds maps to `None`.
    #[must_use]
    pub fn timeout_duration(&self) -> Option<Duration> {
        timeout_from_secs(self.timeout?)
    }
}

/// `0` means "no timeout" at the socket level.
pub(crate) fn timeout_from_secs(seconds: u32) -> Option<Duration> {
    if seconds == 0 {
        None
    } else {
        Some(Duration::from_secs(u64::from(seconds)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = EndpointOptions::default();
        assert_eq!(opts.timeout, None);
        assert!(!opts.nonblocking);
        assert!(opts.reuse_address);
        assert_eq!(opts.backlog, DEFAULT_BACKLOG);
    }

    #[test]
    fn test_effective_backlog_falls_back() {
        assert_eq!(EndpointOptions::new().with_backlog(0).effective_backlog(), 5);
        assert_eq!(EndpointOptions::new().with_backlog(-3).effective_backlog(), 5);
        assert_eq!(EndpointOptions::new().with_backlog(1).effective_backlog(), 1);
        assert_eq!(EndpointOptions::new().with_backlog(128).effective_backlog(), 128);
    }

    #[test]
    fn test_zero_timeout_means_indefinite() {
        assert_eq!(EndpointOptions::new().with_timeout(0).timeout_duration(), None);
        assert_eq!(
            EndpointOptions::new().with_timeout(3).timeout_duration(),
            Some(Duration::from_secs(3))
        );
        assert_eq!(EndpointOptions::new().timeout_duration(), None);
    }
}
