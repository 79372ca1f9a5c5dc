/// Gamelink Error Types
///
/// Every failure of the socket layer is reported to the immediate caller as a
/// [`SocketError`]. Nothing is retried internally and nothing terminates the
/// process.

use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::endpoint::Role;

/// The system call step that failed while creating an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// `socket(2)`
    Create,
    /// `bind(2)`
    Bind,
    /// `listen(2)`
    Listen,
    /// `connect(2)`
    Connect,
    /// `accept(2)`
    Accept,
}

impl Step {
    /// Lowercase name of the system call.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "socket",
            Self::Bind => "bind",
            Self::Listen => "listen",
            Self::Connect => "connect",
            Self::Accept => "accept",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for socket layer operations
#[derive(Error, Debug)]
pub enum SocketError {
    /// The target description could not be turned into an address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The endpoint was already released
    #[error("Invalid handle: endpoint is closed")]
    InvalidHandle,

    /// Creating, binding, listening, connecting or accepting failed
    #[error("Connection failed at {step}: {source}")]
    ConnectionFailed {
        step: Step,
        #[source]
        source: io::Error,
    },

    /// A socket option could not be applied
    #[error("Failed to set {option}: {source}")]
    OptionFailed {
        option: &'static str,
        #[source]
        source: io::Error,
    },

    /// Send or receive failed
    #[error("Transfer failed: {0}")]
    TransferFailed(#[source] io::Error),

    /// Non-blocking endpoint had nothing to transfer
    #[error("Operation would block")]
    WouldBlock,

    /// Blocking transfer exceeded the configured timeout
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The operation does not apply to the endpoint's role
    #[error("Operation requires a {expected} endpoint, got {actual}")]
    RoleMismatch { expected: Role, actual: Role },
}

/// Result type alias for socket layer operations
pub type Result<T> = std::result::Result<T, SocketError>;

impl SocketError {
    /// Create an invalid address error with a message
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    /// Create a connection failure for the given step
    pub fn connection_failed(step: Step, source: io::Error) -> Self {
        Self::ConnectionFailed { step, source }
    }

    /// Create an option failure for the given option name
    pub fn option_failed(option: &'static str, source: io::Error) -> Self {
        Self::OptionFailed { option, source }
    }

    /// The failing step, for [`SocketError::ConnectionFailed`].
    #[must_use]
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::ConnectionFailed { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Check if retrying the same operation later may succeed
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::WouldBlock | Self::Timeout(_) => true,
            Self::TransferFailed(e) => matches!(e.kind(), io::ErrorKind::Interrupted),
            _ => false,
        }
    }

    /// Check if this is a connection error
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } => true,
            Self::TransferFailed(e) => matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::NotConnected
            ),
            _ => false,
        }
    }
}
