//! Strictly sequential exchange loop.

use std::net::SocketAddr;

use tracing::{debug, error, info, instrument, warn};

use super::{ServerConfig, ServerError};
use crate::dispatch::{DispatchError, Dispatcher};
use crate::protocol::metrics::{Metrics, RequestOutcome};
use crate::protocol::{
    self, Error, HEADER_SIZE, MAX_UDP_PAYLOAD, SendError, SendSummary, command_str, inspect,
    send_response,
};
use crate::transport::{Datagram, WorkBuffer};

/// How one pass through the loop ended.
#[derive(Debug)]
pub enum Exchange {
    /// Receive timed out with nothing to do.
    Idle,
    /// Datagram was not a valid request; nothing was sent.
    Rejected {
        /// Sender of the datagram
        from: SocketAddr,
        /// Reason for rejection
        error: Error,
    },
    /// Dispatcher could not produce a reply; nothing was sent.
    DispatchFailed {
        /// Requesting peer
        from: SocketAddr,
        /// Dispatcher error
        error: DispatchError,
    },
    /// Full response, terminator included, was sent.
    Responded {
        /// Requesting peer
        from: SocketAddr,
        /// Frames and bytes sent
        summary: SendSummary,
        /// Whether the reply was the dispatcher's binary buffer
        binary: bool,
    },
    /// Response was aborted part-way; the peer got no terminator.
    SendFailed {
        /// Requesting peer
        from: SocketAddr,
        /// Write failure
        error: SendError,
    },
}

/// Receives requests, dispatches them and sends framed responses, one at a
/// time.
///
/// The server owns its working buffers; a request is fully answered (or
/// abandoned) before the next receive is issued.
#[derive(Debug)]
pub struct Server<T, D> {
    transport: T,
    dispatcher: D,
    config: ServerConfig,
    inbound: WorkBuffer,
    outbound: WorkBuffer,
}

impl<T: Datagram, D: Dispatcher> Server<T, D> {
    /// Create a server over an already-bound transport.
    pub fn new(transport: T, dispatcher: D, config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        Ok(Self {
            transport,
            dispatcher,
            // One spare byte so an over-length datagram is never clipped into
            // a frame that looks complete.
            inbound: WorkBuffer::new(HEADER_SIZE + MAX_UDP_PAYLOAD + 1),
            outbound: WorkBuffer::new(config.max_output_len),
            config,
        })
    }

    /// Borrow the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Borrow the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve requests until receiving fails.
    pub fn run(&mut self) -> Result<(), ServerError> {
        loop {
            self.serve_one()?;
        }
    }

    /// Wait for one datagram and answer it.
    #[instrument(level = "debug", skip(self))]
    pub fn serve_one(&mut self) -> Result<Exchange, ServerError> {
        let Self {
            transport,
            dispatcher,
            config,
            inbound,
            outbound,
        } = self;

        let (len, from) = match transport.recv_from(inbound.as_mut_slice()) {
            Ok(received) => received,
            Err(err) if err.is_timeout() => return Ok(Exchange::Idle),
            Err(err) => return Err(ServerError::Receive(err)),
        };
        inbound.set_len(len);
        let raw = inbound.as_slice();
        debug!(%from, len, "received datagram");

        let command = match parse_request(raw, config.max_command_len) {
            Ok(command) => command,
            Err(error) => {
                warn!(
                    %from,
                    %error,
                    content = %String::from_utf8_lossy(raw),
                    "discarding malformed request"
                );
                Metrics::record_request(RequestOutcome::Rejected);
                return Ok(Exchange::Rejected { from, error });
            }
        };
        info!(%from, command, "received command");

        outbound.reset();
        let reply = match dispatcher.dispatch(command, outbound.as_mut_slice()) {
            Ok(reply) => reply,
            Err(error) => {
                error!(%from, command, %error, "dispatcher failed; no response sent");
                Metrics::record_request(RequestOutcome::DispatchFailed);
                return Ok(Exchange::DispatchFailed { from, error });
            }
        };
        let binary = reply.is_binary();

        match send_response(transport, from, reply.bytes(), &config.fragment_config()) {
            Ok(summary) => {
                if binary {
                    dispatcher.binary_sent();
                }
                debug!(%from, frames = summary.frames, bytes = summary.bytes, binary, "exchange complete");
                Metrics::record_request(RequestOutcome::Responded);
                Ok(Exchange::Responded {
                    from,
                    summary,
                    binary,
                })
            }
            Err(error) => {
                error!(%from, %error, "response aborted");
                Metrics::record_request(RequestOutcome::Aborted);
                Ok(Exchange::SendFailed { from, error })
            }
        }
    }
}

fn parse_request(raw: &[u8], max_command_len: usize) -> protocol::Result<&str> {
    let payload = inspect(raw)?;
    if payload.len() > max_command_len {
        return Err(Error::CommandTooLong {
            len: payload.len(),
            max: max_command_len,
        });
    }
    command_str(payload)
}
