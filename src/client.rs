//! Blocking client for issuing one command at a time.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::protocol::{self, HEADER_SIZE, ResponseAssembler, encode_request};
use crate::transport::{Datagram, SocketBinding, SocketError};

/// Default time to wait for each response datagram.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// Socket failure
    #[error("socket error: {0}")]
    Socket(#[from] SocketError),

    /// Request could not be framed or response could not be re-assembled
    #[error("protocol error: {0}")]
    Protocol(#[from] protocol::Error),

    /// Request frame was not sent in one write
    #[error("short request write: sent {actual} of {expected} bytes")]
    ShortWrite {
        /// Bytes requested
        expected: usize,
        /// Bytes accepted
        actual: usize,
    },

    /// No datagram arrived in time; the response is incomplete
    #[error("timed out waiting for response after {received} bytes")]
    Timeout {
        /// Payload bytes received before the timeout
        received: usize,
    },
}

/// Sends commands to a node and collects framed responses.
#[derive(Debug)]
pub struct Client {
    socket: SocketBinding,
    remote: SocketAddr,
    assembler: ResponseAssembler,
    recv_buf: Vec<u8>,
}

impl Client {
    /// Bind `local` and target the node at `remote`.
    #[instrument(level = "debug")]
    pub fn connect(local: SocketAddr, remote: SocketAddr) -> Result<Self, ClientError> {
        let socket = SocketBinding::bind(local)?;
        socket.set_read_timeout(Some(DEFAULT_RESPONSE_TIMEOUT))?;
        Ok(Self {
            socket,
            remote,
            assembler: ResponseAssembler::default(),
            recv_buf: vec![0u8; HEADER_SIZE + usize::from(u16::MAX)],
        })
    }

    /// Change how long to wait for each response datagram.
    pub fn set_response_timeout(&mut self, timeout: Duration) -> Result<(), ClientError> {
        self.socket.set_read_timeout(Some(timeout))?;
        Ok(())
    }

    /// Local address of the client socket.
    pub fn local_addr(&self) -> Result<SocketAddr, ClientError> {
        Ok(self.socket.local_addr()?)
    }

    /// Send `command` and wait for the complete response.
    ///
    /// Datagrams from other peers are ignored.
    #[instrument(level = "debug", skip(self))]
    pub fn request(&mut self, command: &str) -> Result<Bytes, ClientError> {
        let frame = encode_request(command)?;
        let actual = self.socket.send_to(&frame, self.remote)?;
        if actual != frame.len() {
            return Err(ClientError::ShortWrite {
                expected: frame.len(),
                actual,
            });
        }

        self.assembler.reset();
        loop {
            let (len, from) = match self.socket.recv_from(&mut self.recv_buf) {
                Ok(received) => received,
                Err(err) if err.is_timeout() => {
                    return Err(ClientError::Timeout {
                        received: self.assembler.buffered(),
                    });
                }
                Err(err) => return Err(err.into()),
            };
            if from != self.remote {
                trace!(%from, "ignoring datagram from unexpected peer");
                continue;
            }
            if let Some(response) = self.assembler.push(&self.recv_buf[..len])? {
                debug!(len = response.len(), "response complete");
                return Ok(response);
            }
        }
    }
}
