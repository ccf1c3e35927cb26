//! Frame header
//!
//! Every frame starts with the same four bytes, in network byte order.

use super::{Error, HEADER_SIZE, START_MARKER};

/// Frame header (4 bytes)
///
/// # Wire Format
///
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// | Start (0x55)  |   Sequence    |    Payload Length (big-end)   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// A payload length of zero in a response marks the end of the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    start_marker: u8,
    sequence: u8,
    payload_len: u16,
}

impl FrameHeader {
    /// Create a header carrying `payload_len` bytes at position `sequence`.
    #[must_use]
    pub const fn new(sequence: u8, payload_len: u16) -> Self {
        Self {
            start_marker: START_MARKER,
            sequence,
            payload_len,
        }
    }

    /// Create the empty frame that ends a response.
    #[must_use]
    pub const fn terminator(sequence: u8) -> Self {
        Self::new(sequence, 0)
    }

    /// Get start marker
    #[must_use]
    pub const fn start_marker(&self) -> u8 {
        self.start_marker
    }

    /// Get sequence number
    #[must_use]
    pub const fn sequence(&self) -> u8 {
        self.sequence
    }

    /// Get payload length
    #[must_use]
    pub const fn payload_len(&self) -> u16 {
        self.payload_len
    }

    /// Whether this header ends a response.
    #[must_use]
    pub const fn is_terminator(&self) -> bool {
        self.payload_len == 0
    }

    /// Convert to bytes (big-endian length)
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let len = self.payload_len.to_be_bytes();
        [self.start_marker, self.sequence, len[0], len[1]]
    }

    /// Parse from bytes.
    ///
    /// Only the size and the start marker are checked here; sequence and
    /// length rules depend on direction and are left to the caller.
    pub fn from_bytes(bytes: &[u8]) -> super::Result<Self> {
        let Some(raw) = bytes.first_chunk::<HEADER_SIZE>() else {
            return Err(Error::FrameTooShort {
                len: bytes.len(),
                header: HEADER_SIZE,
            });
        };

        if raw[0] != START_MARKER {
            return Err(Error::InvalidStartMarker { found: raw[0] });
        }

        Ok(Self {
            start_marker: raw[0],
            sequence: raw[1],
            payload_len: u16::from_be_bytes([raw[2], raw[3]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_wire_layout() {
        let header = FrameHeader::new(3, 0x0102);
        assert_eq!(header.to_bytes(), [0x55, 0x03, 0x01, 0x02]);
    }

    #[test]
    fn test_header_parse() {
        let header = FrameHeader::from_bytes(&[0x55, 0x07, 0x05, 0x78, 0xAA]).unwrap();

        assert_eq!(header.start_marker(), START_MARKER);
        assert_eq!(header.sequence(), 7);
        assert_eq!(header.payload_len(), 1400);
        assert!(!header.is_terminator());
    }

    #[test]
    fn test_terminator() {
        let header = FrameHeader::terminator(9);
        assert!(header.is_terminator());
        assert_eq!(header.to_bytes(), [0x55, 0x09, 0x00, 0x00]);
    }

    #[test]
    fn test_invalid_marker() {
        let result = FrameHeader::from_bytes(&[0x54, 0x01, 0x00, 0x00]);
        assert_eq!(result, Err(Error::InvalidStartMarker { found: 0x54 }));
    }

    #[test]
    fn test_short_header() {
        let result = FrameHeader::from_bytes(&[0x55, 0x01]);
        assert!(matches!(result, Err(Error::FrameTooShort { len: 2, .. })));
    }
}
