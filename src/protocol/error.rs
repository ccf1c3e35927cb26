//! Protocol error types

use thiserror::Error;

/// Errors raised while validating or re-assembling frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Datagram not longer than the header
    #[error("frame too short: {len} bytes (header is {header})")]
    FrameTooShort {
        /// Received length
        len: usize,
        /// Header size
        header: usize,
    },

    /// Start marker mismatch
    #[error("invalid start marker: expected 0x55, got {found:#04x}")]
    InvalidStartMarker {
        /// Found marker byte
        found: u8,
    },

    /// Sequence number out of order
    #[error("unexpected sequence number: expected {expected}, got {found}")]
    UnexpectedSequence {
        /// Expected sequence number
        expected: u8,
        /// Found sequence number
        found: u8,
    },

    /// Declared payload length does not match what arrived
    #[error("length mismatch: header declares {declared} payload bytes, received {received}")]
    LengthMismatch {
        /// Payload length from the header
        declared: usize,
        /// Payload bytes actually received
        received: usize,
    },

    /// Command longer than the node accepts
    #[error("command too long: {len} bytes (max {max})")]
    CommandTooLong {
        /// Command length
        len: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Command is not valid UTF-8
    #[error("command is not valid UTF-8")]
    InvalidCommand,

    /// Re-assembled response grew past the configured bound
    #[error("response too large: {size} bytes (max {max})")]
    ResponseTooLarge {
        /// Accumulated size
        size: usize,
        /// Maximum allowed
        max: usize,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
