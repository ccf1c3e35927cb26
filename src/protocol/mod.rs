//! Command protocol core
//!
//! This module provides the frame header, the ingress validator, the egress
//! fragmenter and the client-side re-assembler.

mod assembler;
mod error;
mod fragmenter;
mod header;
pub(crate) mod metrics;
mod validator;

pub use assembler::{DEFAULT_MAX_RESPONSE, ResponseAssembler};
pub use error::{Error, Result};
pub use fragmenter::{
    FragmentConfig, FramePart, Fragments, SendError, SendSummary, frame_count, send_response,
};
pub use header::FrameHeader;
pub use metrics::MetricsSnapshot;
pub use validator::{command_str, encode_request, inspect, validate};

/// Sentinel byte opening every frame.
pub const START_MARKER: u8 = 0x55;

/// Header size in bytes (marker, sequence, big-endian length).
pub const HEADER_SIZE: usize = 4;

/// Sequence number carried by every request frame.
pub const REQUEST_SEQUENCE: u8 = 1;

/// Default transport payload capacity used when slicing responses.
pub const MAX_UDP_PAYLOAD: usize = 1400;

/// Largest command the node accepts in a single request.
///
/// Requests never span more than one datagram, so a command is also bounded
/// by [`MAX_UDP_PAYLOAD`]; the node applies this tighter limit.
pub const MAX_COMMAND_LEN: usize = 60;

/// Default capacity of the dispatcher's text output buffer.
pub const MAX_OUTPUT_LEN: usize = 1024;
