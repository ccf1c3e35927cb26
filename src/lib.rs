//! cmdgram - framed command protocol over UDP
//!
//! A client sends a short text command in a single framed datagram; the node
//! validates it, runs it through a command dispatcher and streams the reply
//! back as a sequence of frames ended by an empty terminator frame. Replies
//! may be text or arbitrary binary data and may exceed one datagram.
//!
//! # Quick Start
//!
//! ```rust
//! use cmdgram::protocol::{Fragments, encode_request, validate};
//!
//! // Frame a request and validate it as the node would
//! let request = encode_request("ping")?;
//! assert_eq!(validate(&request), Some(&b"ping"[..]));
//!
//! // Slice a reply into frames: one data frame plus the terminator
//! let frames: Vec<_> = Fragments::new(b"OK", 1400)?.collect();
//! assert_eq!(frames.len(), 2);
//! assert!(frames[1].0.is_terminator());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Wire Format
//!
//! ```text
//! [START 0x55 (1)] [SEQUENCE (1)] [PAYLOAD LENGTH, big-endian (2)] [PAYLOAD]
//! ```
//!
//! Requests always carry sequence 1 and fit in one datagram. Response frames
//! count up from 1; the terminator has payload length 0.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod dispatch;
pub mod protocol;
pub mod server;
pub mod transport;

pub use client::{Client, ClientError};
pub use dispatch::{CommandRegistry, Dispatcher, Reply};
pub use protocol::{
    Error, FrameHeader, HEADER_SIZE, MAX_UDP_PAYLOAD, Result, START_MARKER, send_response, validate,
};
pub use server::{Node, Server, ServerConfig};

/// Snapshot of the process-wide exchange counters.
#[must_use]
pub fn metrics_snapshot() -> protocol::MetricsSnapshot {
    protocol::metrics::Metrics::totals()
}
