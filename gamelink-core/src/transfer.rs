//! Byte transfer on connected endpoints.
//!
//! [`Endpoint::send`] and [`Endpoint::receive`] map to a single `send(2)` /
//! `recv(2)` call: partial writes are returned to the caller, and a zero-length
//! read means the peer closed its side cleanly. [`Endpoint::send_all`] and
//! [`Endpoint::receive_exact`] are the looping conveniences on top.

use std::io::{self, Read};

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::endpoint::{Endpoint, Role};
use crate::error::{Result, SocketError};
use crate::options::MAX_RECEIVE_LEN;

impl Endpoint {
    /// Write as much of `data` as one `send(2)` call accepts.
    ///
    /// Returns the number of bytes written, which may be less than
    /// `data.len()`.
    pub fn send(&self, data: &[u8]) -> Result<usize> {
        self.require(Role::Connected)?;
        if data.is_empty() {
            return Err(empty_request("send"));
        }
        let n = self
            .socket()?
            .send(data)
            .map_err(|e| self.transfer_error(e))?;
        trace!("[ENDPOINT] Sent {}/{} bytes to {}", n, data.len(), self.address());
        Ok(n)
    }

    /// Read up to `max_len` bytes with one `recv(2)` call.
    ///
    /// At most [`MAX_RECEIVE_LEN`] bytes are read per call whatever `max_len`
    /// asks for. An empty result means the peer closed the connection.
    pub fn receive(&self, max_len: usize) -> Result<Bytes> {
        if max_len == 0 {
            self.require(Role::Connected)?;
            return Err(empty_request("receive"));
        }
        let mut buf = BytesMut::zeroed(max_len.min(MAX_RECEIVE_LEN));
        let n = self.receive_into(&mut buf)?;
        buf.truncate(n);
        Ok(buf.freeze())
    }

    /// Read into `buf` with one `recv(2)` call. `Ok(0)` means the peer closed.
    pub fn receive_into(&self, buf: &mut [u8]) -> Result<usize> {
        self.require(Role::Connected)?;
        if buf.is_empty() {
            return Err(empty_request("receive"));
        }
        let mut socket = self.socket()?;
        let n = socket.read(buf).map_err(|e| self.transfer_error(e))?;
        if n == 0 {
            debug!("[ENDPOINT] Peer {} closed the connection", self.address());
        } else {
            trace!("[ENDPOINT] Received {} bytes from {}", n, self.address());
        }
        Ok(n)
    }

    /// Send every byte of `data`, looping over partial writes.
    ///
    /// On a non-blocking endpoint this fails with
    /// [`SocketError::WouldBlock`] as soon as the kernel buffer is full; the
    /// number of bytes already written is lost to the caller, so prefer
    /// [`Endpoint::send`] with [`Endpoint::is_writable`] there.
    pub fn send_all(&self, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            match self.send(data) {
                Ok(n) => data = &data[n..],
                Err(SocketError::TransferFailed(e)) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Fill `buf`, looping over short reads.
    ///
    /// Returns the number of bytes read, which is less than `buf.len()` only
    /// when the peer closed the connection first.
    pub fn receive_exact(&self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.receive_into(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(SocketError::TransferFailed(e)) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn transfer_error(&self, e: io::Error) -> SocketError {
        match e.kind() {
            io::ErrorKind::WouldBlock if self.nonblocking => SocketError::WouldBlock,
            // EAGAIN on a blocking socket means SO_RCVTIMEO/SO_SNDTIMEO fired
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                SocketError::Timeout(self.timeout.unwrap_or_default())
            }
            _ => {
                debug!("[ENDPOINT] Transfer on {} failed: {}", self.address(), e);
                SocketError::TransferFailed(e)
            }
        }
    }
}

fn empty_request(op: &str) -> SocketError {
    SocketError::TransferFailed(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{op} called with an empty buffer"),
    ))
}
