//! Readiness polling on a single endpoint.
//!
//! A bounded `select(2)` wait, used to build timeout-bounded non-blocking I/O
//! without an event loop. The millisecond timeout is split into whole seconds
//! and remaining microseconds for the `timeval` the syscall expects.

use std::fmt;
use std::io;
use std::os::unix::io::{AsFd, AsRawFd};

use nix::sys::select::{select, FdSet, FD_SETSIZE};
use nix::sys::time::TimeVal;
use tracing::trace;

use crate::endpoint::Endpoint;
use crate::error::Result;

/// Direction to wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => f.write_str("read"),
            Direction::Write => f.write_str("write"),
        }
    }
}

/// Outcome of a readiness poll.
#[derive(Debug)]
pub enum Readiness {
    /// The endpoint can be used in the requested direction without blocking
    Ready,
    /// The wait expired first
    TimedOut,
    /// The wait itself failed (for example `EINTR`)
    Failed(io::Error),
}

impl Readiness {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

/// Split a millisecond timeout into a `timeval`.
pub(crate) fn timeval_from_millis(timeout_ms: u32) -> TimeVal {
    let secs = timeout_ms / 1000;
    let micros = (timeout_ms % 1000) * 1000;
    TimeVal::new(secs as _, micros as _)
}

impl Endpoint {
    /// Wait up to `timeout_ms` milliseconds for the endpoint to become ready.
    ///
    /// Fails only with [`SocketError::InvalidHandle`](crate::error::SocketError::InvalidHandle)
    /// on a closed endpoint; wait errors are reported as [`Readiness::Failed`].
    /// A listening endpoint is read-ready when a connection is pending.
    pub fn poll_readiness(&self, direction: Direction, timeout_ms: u32) -> Result<Readiness> {
        let fd = self.socket()?.as_fd();

        if fd.as_raw_fd() >= FD_SETSIZE as i32 {
            return Ok(Readiness::Failed(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("descriptor {} exceeds FD_SETSIZE", fd.as_raw_fd()),
            )));
        }

        let mut set = FdSet::new();
        set.insert(fd);
        let mut timeout = timeval_from_millis(timeout_ms);

        let res = match direction {
            Direction::Read => select(None, &mut set, None, None, &mut timeout),
            Direction::Write => select(None, None, &mut set, None, &mut timeout),
        };

        let readiness = match res {
            Ok(n) if n > 0 && set.contains(fd) => Readiness::Ready,
            Ok(_) => Readiness::TimedOut,
            Err(errno) => Readiness::Failed(io::Error::from(errno)),
        };
        trace!(
            "[ENDPOINT] poll {} on {} ({}ms): {:?}",
            direction,
            self.address(),
            timeout_ms,
            readiness
        );
        Ok(readiness)
    }

    /// `true` only if the endpoint became readable within `timeout_ms`.
    ///
    /// Timeouts, wait errors and closed endpoints all yield `false`.
    pub fn is_readable(&self, timeout_ms: u32) -> bool {
        matches!(self.poll_readiness(Direction::Read, timeout_ms), Ok(Readiness::Ready))
    }

    /// `true` only if the endpoint became writable within `timeout_ms`.
    pub fn is_writable(&self, timeout_ms: u32) -> bool {
        matches!(self.poll_readiness(Direction::Write, timeout_ms), Ok(Readiness::Ready))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::error::SocketError;
    use crate::options::EndpointOptions;
    use std::time::{Duration, Instant};

    #[test]
    fn test_timeval_decomposition() {
        let tv = timeval_from_millis(1500);
        assert_eq!(tv.tv_sec(), 1);
        assert_eq!(tv.tv_usec(), 500_000);

        let tv = timeval_from_millis(999);
        assert_eq!(tv.tv_sec(), 0);
        assert_eq!(tv.tv_usec(), 999_000);

        let tv = timeval_from_millis(0);
        assert_eq!(tv.tv_sec(), 0);
        assert_eq!(tv.tv_usec(), 0);
    }

    #[test]
    fn test_listener_readable_when_connection_pending() {
        let port = portpicker::pick_unused_port().expect("no free port");
        let addr = Address::remote("127.0.0.1", u32::from(port)).unwrap();
        let listener = Endpoint::create_listener(&addr, &EndpointOptions::default()).unwrap();

        assert!(!listener.is_readable(10));
        let _client = Endpoint::connect(&addr).unwrap();
        assert!(listener.is_readable(1000));
    }

    #[test]
    fn test_connected_endpoint_writable() {
        let port = portpicker::pick_unused_port().expect("no free port");
        let addr = Address::remote("127.0.0.1", u32::from(port)).unwrap();
        let listener = Endpoint::create_listener(&addr, &EndpointOptions::default()).unwrap();
        let client = Endpoint::connect(&addr).unwrap();
        let _server = listener.accept().unwrap();

        let start = Instant::now();
        assert!(client.is_writable(100));
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_closed_endpoint_poll() {
        let port = portpicker::pick_unused_port().expect("no free port");
        let addr = Address::remote("127.0.0.1", u32::from(port)).unwrap();
        let mut listener = Endpoint::create_listener(&addr, &EndpointOptions::default()).unwrap();
        listener.close();

        assert!(matches!(
            listener.poll_readiness(Direction::Read, 10),
            Err(SocketError::InvalidHandle)
        ));
        assert!(!listener.is_readable(10));
        assert!(!listener.is_writable(10));
    }
}
