//! Address resolution for the two supported transports.
//!
//! Turns a transport selector plus a raw target description into an
//! [`Address`]. No I/O and no DNS lookups happen here: remote hosts must
//! already be numeric IPv4 addresses.
//!
//! # Local path length
//!
//! A Unix domain socket path lives in the fixed `sun_path` field of
//! `sockaddr_un` (108 bytes on Linux, including the terminating NUL). Paths
//! longer than [`MAX_LOCAL_PATH_LEN`] bytes would be truncated by the kernel
//! interface, which lets two distinct configured paths collide on the same
//! rendezvous file. Such paths are rejected with
//! [`SocketError::InvalidAddress`] instead of being truncated.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use socket2::{Domain, SockAddr};

use crate::error::{Result, SocketError};

/// Longest accepted local socket path, in bytes, excluding the NUL terminator.
pub const MAX_LOCAL_PATH_LEN: usize = 107;

/// Transport selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Path-addressed Unix domain stream socket
    Local,
    /// IPv4 TCP stream socket
    Remote,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Local => f.write_str("local"),
            Transport::Remote => f.write_str("remote"),
        }
    }
}

/// Resolved endpoint address. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// Local transport: `ipc:///path/to/socket`
    Local(PathBuf),
    /// Remote transport: `tcp://a.b.c.d:port`
    Remote(SocketAddrV4),
}

impl Address {
    /// Build a local address from a filesystem path.
    ///
    /// Fails when the path is empty, contains a NUL byte, or is longer than
    /// [`MAX_LOCAL_PATH_LEN`] bytes.
    pub fn local(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = path.as_os_str().as_bytes();
        if bytes.is_empty() {
            return Err(SocketError::invalid_address("local path is empty"));
        }
        if bytes.contains(&0) {
            return Err(SocketError::invalid_address(format!(
                "local path {} contains a NUL byte",
                path.display()
            )));
        }
        if bytes.len() > MAX_LOCAL_PATH_LEN {
            return Err(SocketError::invalid_address(format!(
                "local path is {} bytes, limit is {}",
                bytes.len(),
                MAX_LOCAL_PATH_LEN
            )));
        }
        Ok(Address::Local(path.to_path_buf()))
    }

    /// Build a remote address from a numeric IPv4 host and a port.
    ///
    /// # Examples
    ///
    /// ```
    /// use gamelink_core::address::Address;
    ///
    /// assert!(Address::remote("127.0.0.1", 8080).is_ok());
    /// assert!(Address::remote("127.0.0.1", 0).is_err());
    /// assert!(Address::remote("localhost", 8080).is_err());
    /// ```
    pub fn remote(host: &str, port: u32) -> Result<Self> {
        let port = validate_port(port)?;
        let ip = host.trim().parse::<Ipv4Addr>().map_err(|_| {
            SocketError::invalid_address(format!("host {host:?} is not a numeric IPv4 address"))
        })?;
        Ok(Address::Remote(SocketAddrV4::new(ip, port)))
    }

    /// Resolve a raw target description for the selected transport.
    ///
    /// For [`Transport::Local`] the target is the socket path. For
    /// [`Transport::Remote`] it is `host:port`.
    pub fn resolve(transport: Transport, target: &str) -> Result<Self> {
        match transport {
            Transport::Local => Address::local(target),
            Transport::Remote => {
                let (host, port) = target.rsplit_once(':').ok_or_else(|| {
                    SocketError::invalid_address(format!("{target:?} is missing a port"))
                })?;
                let port = port.parse::<u32>().map_err(|_| {
                    SocketError::invalid_address(format!("port {port:?} is not a number"))
                })?;
                Address::remote(host, port)
            }
        }
    }

    /// Parse an address from a URI-style string.
    ///
    /// Supported formats:
    /// - `tcp://127.0.0.1:5555`
    /// - `ipc:///tmp/socket.sock`
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    /// Transport this address belongs to.
    pub fn transport(&self) -> Transport {
        match self {
            Address::Local(_) => Transport::Local,
            Address::Remote(_) => Transport::Remote,
        }
    }

    /// Returns true if this is a local address.
    pub fn is_local(&self) -> bool {
        matches!(self, Address::Local(_))
    }

    /// Port of a remote address.
    pub fn port(&self) -> Option<u16> {
        match self {
            Address::Remote(addr) => Some(addr.port()),
            Address::Local(_) => None,
        }
    }

    pub(crate) fn domain(&self) -> Domain {
        match self {
            Address::Local(_) => Domain::UNIX,
            Address::Remote(_) => Domain::IPV4,
        }
    }

    /// Address used by `connect(2)`.
    pub(crate) fn to_sock_addr(&self) -> Result<SockAddr> {
        match self {
            Address::Local(path) => SockAddr::unix(path)
                .map_err(|e| SocketError::invalid_address(format!("{}: {e}", path.display()))),
            Address::Remote(addr) => Ok(SockAddr::from(SocketAddr::V4(*addr))),
        }
    }

    /// Address used by `bind(2)`: remote listeners bind the wildcard interface.
    pub(crate) fn to_bind_addr(&self) -> Result<SockAddr> {
        match self {
            Address::Local(_) => self.to_sock_addr(),
            Address::Remote(addr) => Ok(SockAddr::from(SocketAddr::V4(SocketAddrV4::new(
                Ipv4Addr::UNSPECIFIED,
                addr.port(),
            )))),
        }
    }
}

fn validate_port(port: u32) -> Result<u16> {
    match u16::try_from(port) {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(SocketError::invalid_address(format!(
            "port {port} is outside 1-65535"
        ))),
    }
}

impl FromStr for Address {
    type Err = SocketError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(target) = s.strip_prefix("tcp://") {
            Address::resolve(Transport::Remote, target)
        } else if let Some(path) = s.strip_prefix("ipc://") {
            Address::local(path)
        } else {
            Err(SocketError::invalid_address(format!(
                "unknown scheme in {s:?} (expected tcp:// or ipc://)"
            )))
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Local(path) => write!(f, "ipc://{}", path.display()),
            Address::Remote(addr) => write!(f, "tcp://{}", addr),
        }
    }
}
