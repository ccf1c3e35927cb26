//! Datagram transport primitives consumed by the protocol.

mod buffer;
mod socket;

use std::net::SocketAddr;

pub use buffer::WorkBuffer;
pub use socket::{SocketBinding, SocketError};

/// Connectionless, unreliable datagram channel.
///
/// Both calls block; a receive returns one whole datagram and its source.
pub trait Datagram {
    /// Receive one datagram into `buf`.
    fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr), SocketError>;

    /// Send `buf` as one datagram, returning the bytes the transport accepted.
    fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> Result<usize, SocketError>;
}

impl<T: Datagram + ?Sized> Datagram for &mut T {
    fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr), SocketError> {
        (**self).recv_from(buf)
    }

    fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> Result<usize, SocketError> {
        (**self).send_to(buf, addr)
    }
}
