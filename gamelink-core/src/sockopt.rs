//! Socket option manager.
//!
//! Cross-cutting behavior applied to an already open endpoint. Each setter is
//! idempotent and fails with [`SocketError::OptionFailed`] when the kernel
//! rejects the option.

use tracing::{debug, error};

use crate::endpoint::Endpoint;
use crate::error::{Result, SocketError};
use crate::options::{timeout_from_secs, EndpointOptions};

impl Endpoint {
    /// Bound both receive and send waits to `seconds`.
    ///
    /// `0` restores the platform default of waiting indefinitely; it does not
    /// mean "fail immediately". Use [`Endpoint::set_nonblocking`] for that.
    pub fn set_timeout(&mut self, seconds: u32) -> Result<()> {
        let timeout = timeout_from_secs(seconds);
        let socket = self.socket()?;

        socket.set_read_timeout(timeout).map_err(|e| {
            error!("[SOCKOPT] SO_RCVTIMEO={:?} failed: {}", timeout, e);
            SocketError::option_failed("SO_RCVTIMEO", e)
        })?;
        socket.set_write_timeout(timeout).map_err(|e| {
            error!("[SOCKOPT] SO_SNDTIMEO={:?} failed: {}", timeout, e);
            SocketError::option_failed("SO_SNDTIMEO", e)
        })?;

        self.timeout = timeout;
        debug!("[SOCKOPT] Timeout set to {:?} on {}", timeout, self.address());
        Ok(())
    }

    /// Make transfers return [`SocketError::WouldBlock`] instead of waiting.
    pub fn set_nonblocking(&mut self) -> Result<()> {
        self.set_blocking_mode(true)
    }

    /// Revert [`Endpoint::set_nonblocking`].
    pub fn set_blocking(&mut self) -> Result<()> {
        self.set_blocking_mode(false)
    }

    /// Set `SO_REUSEADDR`.
    ///
    /// Has no retroactive effect on an endpoint that is already bound; for
    /// listeners use [`EndpointOptions::reuse_address`] so it is applied
    /// before the bind step.
    pub fn set_reuse_address(&mut self) -> Result<()> {
        self.socket()?.set_reuse_address(true).map_err(|e| {
            error!("[SOCKOPT] SO_REUSEADDR failed: {}", e);
            SocketError::option_failed("SO_REUSEADDR", e)
        })
    }

    /// Apply the post-creation parts of `options`: timeout and blocking mode.
    pub fn apply(&mut self, options: &EndpointOptions) -> Result<()> {
        if let Some(seconds) = options.timeout {
            self.set_timeout(seconds)?;
        }
        if options.nonblocking != self.nonblocking {
            self.set_blocking_mode(options.nonblocking)?;
        }
        Ok(())
    }

    fn set_blocking_mode(&mut self, nonblocking: bool) -> Result<()> {
        self.socket()?.set_nonblocking(nonblocking).map_err(|e| {
            error!("[SOCKOPT] O_NONBLOCK={} failed: {}", nonblocking, e);
            SocketError::option_failed("O_NONBLOCK", e)
        })?;
        self.nonblocking = nonblocking;
        Ok(())
    }
}
