//! Gamelink Core
//!
//! This crate contains the blocking socket layer shared by the gaming
//! daemons:
//! - Address resolution for local (Unix domain) and remote (IPv4 TCP) targets (`address`)
//! - Endpoint factory and lifecycle: listen, connect, accept, close (`endpoint`)
//! - Endpoint configuration values (`options`)
//! - Socket option manager: timeout, blocking mode, address reuse (`sockopt`)
//! - Byte transfer primitives (`transfer`)
//! - Bounded readiness polling (`readiness`)
//! - Error types (`error`)
//!
//! Everything is synchronous. There is no background thread and no event
//! loop; callers needing concurrency run several threads, each owning its
//! own endpoints.

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod address;
pub mod endpoint;
pub mod error;
pub mod options;
pub mod readiness;
mod sockopt;
mod transfer;

// Keep it minimal to avoid API lock-in.
pub mod prelude {
    pub use crate::address::{Address, Transport, MAX_LOCAL_PATH_LEN};
    pub use crate::endpoint::{Endpoint, Role, State};
    pub use crate::error::{SocketError, Step};
    pub use crate::options::{
        EndpointOptions, DEFAULT_BACKLOG, DEFAULT_BUFFER_SIZE, DEFAULT_TIMEOUT_SECS, MAX_RECEIVE_LEN,
    };
    pub use crate::readiness::{Direction, Readiness};
}
