//! Blocking UDP socket wrapper.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::instrument;

use super::Datagram;

/// Error type for socket operations.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    /// Underlying I/O error
    #[error("socket I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SocketError {
    /// Whether the error is a read/write timeout rather than a failure.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
        }
    }
}

/// Binding for a UDP socket.
#[derive(Debug)]
pub struct SocketBinding {
    socket: UdpSocket,
}

impl SocketBinding {
    /// Bind to the provided address.
    #[instrument(level = "info")]
    pub fn bind(addr: SocketAddr) -> Result<Self, SocketError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(false)?;
        Ok(Self { socket })
    }

    /// Set socket read timeout. `None` waits forever.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), SocketError> {
        self.socket.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Set socket write timeout.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<(), SocketError> {
        self.socket.set_write_timeout(timeout)?;
        Ok(())
    }

    /// Access the local address for this binding.
    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        Ok(self.socket.local_addr()?)
    }
}

impl Datagram for SocketBinding {
    #[instrument(level = "trace", skip(self, buf))]
    fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr), SocketError> {
        Ok(self.socket.recv_from(buf)?)
    }

    #[instrument(level = "trace", skip(self, buf), fields(len = buf.len()))]
    fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> Result<usize, SocketError> {
        Ok(self.socket.send_to(buf, addr)?)
    }
}
