//! Endpoint factory and lifecycle.
//!
//! An [`Endpoint`] owns one socket descriptor. It is created either
//! listening ([`Endpoint::create_listener`]) or connected
//! ([`Endpoint::connect`], [`Endpoint::accept`]) and that role never changes.
//! [`Endpoint::close`] releases the descriptor exactly once; every later
//! operation fails with [`SocketError::InvalidHandle`] without touching the OS.
//!
//! ```text
//! Created -> { Listening | Connected } -> Closed
//! ```
//!
//! Endpoints perform no internal locking. Sharing one across threads
//! (for example several workers calling `accept` on the same listener)
//! requires external serialization.

use std::fmt;
use std::fs;
use std::io;
use std::net::{Shutdown, SocketAddr};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;
use std::time::Duration;

use socket2::{Socket, Type};
use tracing::{debug, error, info, warn};

use crate::address::Address;
use crate::error::{Result, SocketError, Step};
use crate::options::EndpointOptions;

/// Role fixed at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Accepts new connections, never transfers data
    Listening,
    /// Transfers data, never accepts
    Connected,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Listening => f.write_str("listening"),
            Role::Connected => f.write_str("connected"),
        }
    }
}

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Listening,
    Connected,
    Closed,
}

/// An open communication channel, exclusively owned by its creator.
pub struct Endpoint {
    socket: Option<Socket>,
    role: Role,
    address: Address,
    pub(crate) nonblocking: bool,
    pub(crate) timeout: Option<Duration>,
}

impl Endpoint {
    /// Create a listening endpoint.
    ///
    /// Local: any file already at the path is removed first, so a socket
    /// file left behind by a crashed process does not make the bind fail.
    ///
    /// Remote: `SO_REUSEADDR` is set when `options.reuse_address` is true,
    /// then the socket binds the wildcard interface on the address's port.
    ///
    /// Both listen with [`EndpointOptions::effective_backlog`] and then apply
    /// the timeout and non-blocking settings from `options`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gamelink_core::prelude::*;
    ///
    /// # fn main() -> gamelink_core::error::Result<()> {
    /// let addr = Address::local("/tmp/gamelink.sock")?;
    /// let listener = Endpoint::create_listener(&addr, &EndpointOptions::default())?;
    /// let conn = listener.accept()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn create_listener(address: &Address, options: &EndpointOptions) -> Result<Self> {
        if let Address::Local(path) = address {
            remove_stale_socket(path);
        }

        let socket = open_socket(address)?;

        if !address.is_local() && options.reuse_address {
            socket.set_reuse_address(true).map_err(|e| {
                error!("[LISTENER] SO_REUSEADDR on {} failed: {}", address, e);
                SocketError::option_failed("SO_REUSEADDR", e)
            })?;
        }

        let bind_addr = address.to_bind_addr()?;
        socket.bind(&bind_addr).map_err(|e| {
            error!("[LISTENER] bind {} failed: {}", address, e);
            SocketError::connection_failed(Step::Bind, e)
        })?;
        let rendezvous = RendezvousGuard::new(address);

        let backlog = options.effective_backlog();
        socket.listen(backlog).map_err(|e| {
            error!("[LISTENER] listen {} (backlog {}) failed: {}", address, backlog, e);
            SocketError::connection_failed(Step::Listen, e)
        })?;

        let mut endpoint = Endpoint::new(socket, Role::Listening, address.clone());
        endpoint.apply(options)?;
        rendezvous.disarm();

        info!("[LISTENER] Listening on {} (backlog {})", address, backlog);
        Ok(endpoint)
    }

    /// Connect to `address` with a blocking `connect(2)`.
    ///
    /// The returned endpoint is blocking with the platform default timeout.
    pub fn connect(address: &Address) -> Result<Self> {
        let socket = open_socket(address)?;
        let sock_addr = address.to_sock_addr()?;

        debug!("[ENDPOINT] Connecting to {}", address);
        socket.connect(&sock_addr).map_err(|e| {
            warn!("[ENDPOINT] connect {} failed: {}", address, e);
            SocketError::connection_failed(Step::Connect, e)
        })?;

        Ok(Endpoint::new(socket, Role::Connected, address.clone()))
    }

    /// Connect, then apply the timeout and non-blocking settings from `options`.
    pub fn connect_with(address: &Address, options: &EndpointOptions) -> Result<Self> {
        let mut endpoint = Endpoint::connect(address)?;
        endpoint.apply(options)?;
        Ok(endpoint)
    }

    /// Accept one pending connection on a listening endpoint.
    ///
    /// Blocks unless the listener is non-blocking, in which case an empty
    /// queue yields [`SocketError::WouldBlock`].
    pub fn accept(&self) -> Result<Endpoint> {
        self.require(Role::Listening)?;
        let listener = self.socket()?;

        let (socket, peer) = listener.accept().map_err(|e| match e.kind() {
            io::ErrorKind::WouldBlock => SocketError::WouldBlock,
            _ => {
                warn!("[LISTENER] accept on {} failed: {}", self.address, e);
                SocketError::connection_failed(Step::Accept, e)
            }
        })?;

        let address = match peer.as_socket() {
            Some(SocketAddr::V4(v4)) => Address::Remote(v4),
            _ => self.address.clone(),
        };
        debug!("[LISTENER] Accepted {} on {}", address, self.address);

        let mut endpoint = Endpoint::new(socket, Role::Connected, address);
        if let Some(socket) = endpoint.socket.as_ref() {
            endpoint.timeout = socket.read_timeout().ok().flatten();
        }
        Ok(endpoint)
    }

    /// Half- or fully shut down a connected endpoint.
    ///
    /// The handle stays valid; the peer observes a clean zero-length read
    /// once the write side is shut down.
    pub fn shutdown(&self, how: Shutdown) -> Result<()> {
        self.require(Role::Connected)?;
        self.socket()?.shutdown(how).map_err(|e| {
            debug!("[ENDPOINT] shutdown {:?} on {} failed: {}", how, self.address, e);
            SocketError::TransferFailed(e)
        })
    }

    /// Release the descriptor. Calling this again is a no-op.
    pub fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            debug!("[ENDPOINT] Closing {} endpoint {}", self.role, self.address);
            drop(socket);
        }
    }

    /// Role fixed at creation.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        match (&self.socket, self.role) {
            (None, _) => State::Closed,
            (Some(_), Role::Listening) => State::Listening,
            (Some(_), Role::Connected) => State::Connected,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.socket.is_none()
    }

    /// Address this endpoint was created for (the peer, for accepted TCP endpoints).
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Whether non-blocking mode is active.
    pub fn is_nonblocking(&self) -> bool {
        self.nonblocking
    }

    /// Blocking timeout currently applied, `None` meaning indefinite.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Raw descriptor, or `None` once closed.
    pub fn raw_fd(&self) -> Option<RawFd> {
        self.socket.as_ref().map(AsRawFd::as_raw_fd)
    }

    fn new(socket: Socket, role: Role, address: Address) -> Self {
        Self {
            socket: Some(socket),
            role,
            address,
            nonblocking: false,
            timeout: None,
        }
    }

    /// The open socket, or `InvalidHandle` once closed.
    pub(crate) fn socket(&self) -> Result<&Socket> {
        self.socket.as_ref().ok_or(SocketError::InvalidHandle)
    }

    pub(crate) fn require(&self, expected: Role) -> Result<()> {
        if self.socket.is_none() {
            return Err(SocketError::InvalidHandle);
        }
        if self.role != expected {
            return Err(SocketError::RoleMismatch {
                expected,
                actual: self.role,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("fd", &self.raw_fd())
            .field("role", &self.role)
            .field("address", &self.address)
            .field("nonblocking", &self.nonblocking)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn open_socket(address: &Address) -> Result<Socket> {
    Socket::new(address.domain(), Type::STREAM, None).map_err(|e| {
        error!("[ENDPOINT] socket() for {} failed: {}", address, e);
        SocketError::connection_failed(Step::Create, e)
    })
}

fn remove_stale_socket(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("[LISTENER] Removed stale socket file {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        // bind reports the real failure
        Err(e) => warn!("[LISTENER] Could not remove {}: {}", path.display(), e),
    }
}

/// Unlinks the file a local bind created unless the listener setup completes.
struct RendezvousGuard<'a> {
    path: Option<&'a Path>,
}

impl<'a> RendezvousGuard<'a> {
    fn new(address: &'a Address) -> Self {
        let path = match address {
            Address::Local(path) => Some(path.as_path()),
            Address::Remote(_) => None,
        };
        Self { path }
    }

    fn disarm(mut self) {
        self.path = None;
    }
}

impl Drop for RendezvousGuard<'_> {
    fn drop(&mut self) {
        if let Some(path) = self.path {
            match fs::remove_file(path) {
                Ok(()) => debug!("[LISTENER] Removed {} after failed setup", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("[LISTENER] Could not remove {}: {}", path.display(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn socket_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gamelink-ep-{}-{}.sock", std::process::id(), name))
    }

    #[test]
    fn test_local_listener_replaces_stale_file() {
        let path = socket_path("stale");
        fs::write(&path, b"left over from a crash").unwrap();

        let addr = Address::local(&path).unwrap();
        let listener = Endpoint::create_listener(&addr, &EndpointOptions::default()).unwrap();
        assert_eq!(listener.state(), State::Listening);
        assert_eq!(listener.role(), Role::Listening);

        drop(listener);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_failed_setup_unlinks_rendezvous_file() {
        let path = socket_path("guard");
        let addr = Address::local(&path).unwrap();

        fs::write(&path, b"").unwrap();
        drop(RendezvousGuard::new(&addr));
        assert!(!path.exists());

        fs::write(&path, b"").unwrap();
        RendezvousGuard::new(&addr).disarm();
        assert!(path.exists());
        let _ = fs::remove_file(&path);

        let remote = Address::remote("127.0.0.1", 7000).unwrap();
        drop(RendezvousGuard::new(&remote));
    }

    #[test]
    fn test_local_listener_twice_on_same_path() {
        let path = socket_path("twice");
        let addr = Address::local(&path).unwrap();

        let mut first = Endpoint::create_listener(&addr, &EndpointOptions::default()).unwrap();
        first.close();
        let second = Endpoint::create_listener(&addr, &EndpointOptions::default());
        assert!(second.is_ok());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_connect_missing_local_path_fails_with_step() {
        let addr = Address::local(socket_path("nobody-home")).unwrap();
        let err = Endpoint::connect(&addr).unwrap_err();
        assert_eq!(err.step(), Some(Step::Connect));
    }

    #[test]
    fn test_connect_refused_tcp() {
        let port = portpicker::pick_unused_port().expect("no free port");
        let addr = Address::remote("127.0.0.1", u32::from(port)).unwrap();
        let err = Endpoint::connect(&addr).unwrap_err();
        assert!(matches!(
            err,
            SocketError::ConnectionFailed {
                step: Step::Connect,
                ..
            }
        ));
    }

    #[test]
    fn test_tcp_bind_conflict_without_reuse() {
        let port = portpicker::pick_unused_port().expect("no free port");
        let addr = Address::remote("127.0.0.1", u32::from(port)).unwrap();
        let opts = EndpointOptions::default().with_reuse_address(false);

        let _first = Endpoint::create_listener(&addr, &opts).unwrap();
        let err = Endpoint::create_listener(&addr, &opts).unwrap_err();
        assert_eq!(err.step(), Some(Step::Bind));
    }

    #[test]
    fn test_close_is_idempotent() {
        let path = socket_path("close");
        let addr = Address::local(&path).unwrap();
        let mut listener = Endpoint::create_listener(&addr, &EndpointOptions::default()).unwrap();

        assert!(listener.raw_fd().is_some());
        listener.close();
        listener.close();
        assert_eq!(listener.state(), State::Closed);
        assert!(listener.raw_fd().is_none());
        assert!(matches!(listener.accept(), Err(SocketError::InvalidHandle)));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_accept_on_connected_is_role_mismatch() {
        let path = socket_path("role");
        let addr = Address::local(&path).unwrap();
        let listener = Endpoint::create_listener(&addr, &EndpointOptions::default()).unwrap();
        let client = Endpoint::connect(&addr).unwrap();

        assert!(matches!(
            client.accept(),
            Err(SocketError::RoleMismatch {
                expected: Role::Listening,
                actual: Role::Connected
            })
        ));
        assert!(matches!(
            listener.shutdown(Shutdown::Both),
            Err(SocketError::RoleMismatch { .. })
        ));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_nonblocking_listener_accept_would_block() {
        let path = socket_path("nb-accept");
        let addr = Address::local(&path).unwrap();
        let opts = EndpointOptions::default().with_nonblocking(true);
        let listener = Endpoint::create_listener(&addr, &opts).unwrap();

        assert!(listener.is_nonblocking());
        assert!(matches!(listener.accept(), Err(SocketError::WouldBlock)));

        let _ = fs::remove_file(&path);
    }
}
