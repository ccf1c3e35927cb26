//! Request frame validation
//!
//! A request is exactly one frame in exactly one datagram. Anything else is
//! rejected, never repaired.

use bytes::{BufMut, Bytes, BytesMut};

use super::{Error, FrameHeader, HEADER_SIZE, MAX_UDP_PAYLOAD, REQUEST_SEQUENCE, Result};

/// Validate a received datagram and return the command payload.
///
/// The payload is a view into `raw`. Returns `None` for any malformed frame;
/// use [`inspect`] when the reason matters.
#[must_use]
pub fn validate(raw: &[u8]) -> Option<&[u8]> {
    inspect(raw).ok()
}

/// Validate a received datagram, reporting why it was rejected.
///
/// # Errors
///
/// Returns an error if:
/// - The datagram is not longer than the header
/// - The start marker is wrong
/// - The sequence number is not 1
/// - The declared payload length differs from the bytes received
pub fn inspect(raw: &[u8]) -> Result<&[u8]> {
    if raw.len() <= HEADER_SIZE {
        return Err(Error::FrameTooShort {
            len: raw.len(),
            header: HEADER_SIZE,
        });
    }

    let header = FrameHeader::from_bytes(raw)?;

    if header.sequence() != REQUEST_SEQUENCE {
        return Err(Error::UnexpectedSequence {
            expected: REQUEST_SEQUENCE,
            found: header.sequence(),
        });
    }

    let declared = usize::from(header.payload_len());
    let received = raw.len() - HEADER_SIZE;
    if declared != received {
        return Err(Error::LengthMismatch { declared, received });
    }

    Ok(&raw[HEADER_SIZE..])
}

/// Interpret a validated payload as a command string.
///
/// Trailing NUL bytes are tolerated so that C peers sending terminated
/// strings are understood.
pub fn command_str(payload: &[u8]) -> Result<&str> {
    let end = payload
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    std::str::from_utf8(&payload[..end]).map_err(|_| Error::InvalidCommand)
}

/// Build a request frame carrying `command`.
///
/// # Errors
///
/// Returns [`Error::CommandTooLong`] if the command does not fit in one
/// datagram.
pub fn encode_request(command: &str) -> Result<Bytes> {
    let len = command.len();
    if len > MAX_UDP_PAYLOAD {
        return Err(Error::CommandTooLong {
            len,
            max: MAX_UDP_PAYLOAD,
        });
    }

    #[allow(clippy::cast_possible_truncation)]
    let header = FrameHeader::new(REQUEST_SEQUENCE, len as u16);

    let mut frame = BytesMut::with_capacity(HEADER_SIZE + len);
    frame.put_slice(&header.to_bytes());
    frame.put_slice(command.as_bytes());
    Ok(frame.freeze())
}
