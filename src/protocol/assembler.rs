//! Client-side response re-assembly.

use bytes::{Bytes, BytesMut};

use super::{Error, FrameHeader, HEADER_SIZE, Result};

/// Default bound on a re-assembled response (16 MB).
pub const DEFAULT_MAX_RESPONSE: usize = 16 * 1024 * 1024;

/// Rebuilds a response from the datagrams of one framed sequence.
///
/// Datagrams must be pushed in arrival order. A header datagram announcing a
/// non-empty payload is followed by that payload as its own datagram; a
/// datagram holding header and payload together is accepted as well. Any
/// error discards the partial response.
#[derive(Debug)]
pub struct ResponseAssembler {
    expected: u8,
    pending: Option<FrameHeader>,
    data: BytesMut,
    max_response: usize,
}

impl ResponseAssembler {
    /// Create an assembler refusing responses above `max_response` bytes.
    #[must_use]
    pub fn new(max_response: usize) -> Self {
        Self {
            expected: 1,
            pending: None,
            data: BytesMut::new(),
            max_response,
        }
    }

    /// Feed one datagram. Returns the full response once the terminator
    /// arrives.
    pub fn push(&mut self, datagram: &[u8]) -> Result<Option<Bytes>> {
        let result = self.push_inner(datagram);
        if result.is_err() {
            self.reset();
        }
        result
    }

    /// Bytes collected so far.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.data.len()
    }

    /// Whether a header was seen and its payload is still outstanding.
    #[must_use]
    pub fn awaiting_payload(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any partial response and expect sequence 1 again.
    pub fn reset(&mut self) {
        self.expected = 1;
        self.pending = None;
        self.data.clear();
    }

    fn push_inner(&mut self, datagram: &[u8]) -> Result<Option<Bytes>> {
        if let Some(header) = self.pending.take() {
            self.append(header, datagram)?;
            return Ok(None);
        }

        let header = FrameHeader::from_bytes(datagram)?;
        if header.sequence() != self.expected {
            return Err(Error::UnexpectedSequence {
                expected: self.expected,
                found: header.sequence(),
            });
        }

        let inline = &datagram[HEADER_SIZE..];
        if header.is_terminator() {
            if !inline.is_empty() {
                return Err(Error::LengthMismatch {
                    declared: 0,
                    received: inline.len(),
                });
            }
            let response = self.data.split().freeze();
            self.reset();
            return Ok(Some(response));
        }

        if inline.is_empty() {
            self.pending = Some(header);
        } else {
            self.append(header, inline)?;
        }
        Ok(None)
    }

    fn append(&mut self, header: FrameHeader, payload: &[u8]) -> Result<()> {
        let declared = usize::from(header.payload_len());
        if payload.len() != declared {
            return Err(Error::LengthMismatch {
                declared,
                received: payload.len(),
            });
        }

        let size = self.data.len() + declared;
        if size > self.max_response {
            return Err(Error::ResponseTooLarge {
                size,
                max: self.max_response,
            });
        }

        self.data.extend_from_slice(payload);
        self.expected = self.expected.wrapping_add(1);
        Ok(())
    }
}

impl Default for ResponseAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESPONSE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_header_and_payload() {
        let mut assembler = ResponseAssembler::default();

        assert_eq!(assembler.push(&[0x55, 0x01, 0x00, 0x02]), Ok(None));
        assert!(assembler.awaiting_payload());
        assert_eq!(assembler.push(b"OK"), Ok(None));
        assert_eq!(assembler.buffered(), 2);

        let response = assembler.push(&[0x55, 0x02, 0x00, 0x00]).unwrap();
        assert_eq!(response.as_deref(), Some(&b"OK"[..]));
        assert_eq!(assembler.buffered(), 0);
    }

    #[test]
    fn coalesced_frame() {
        let mut assembler = ResponseAssembler::default();
        assert_eq!(assembler.push(&[0x55, 0x01, 0x00, 0x01, b'!']), Ok(None));
        let response = assembler.push(&[0x55, 0x02, 0x00, 0x00]).unwrap();
        assert_eq!(response.as_deref(), Some(&b"!"[..]));
    }

    #[test]
    fn missing_frame_is_detected() {
        let mut assembler = ResponseAssembler::default();
        assembler.push(&[0x55, 0x01, 0x00, 0x01]).unwrap();
        assembler.push(b"a").unwrap();

        let err = assembler.push(&[0x55, 0x03, 0x00, 0x00]).unwrap_err();
        assert_eq!(
            err,
            Error::UnexpectedSequence {
                expected: 2,
                found: 3
            }
        );
        // State was discarded; a fresh response starts at 1.
        assert_eq!(assembler.buffered(), 0);
        let response = assembler.push(&[0x55, 0x01, 0x00, 0x00]).unwrap();
        assert_eq!(response.as_deref(), Some(&b""[..]));
    }

    #[test]
    fn payload_length_must_match() {
        let mut assembler = ResponseAssembler::default();
        assembler.push(&[0x55, 0x01, 0x00, 0x03]).unwrap();
        assert_eq!(
            assembler.push(b"ab"),
            Err(Error::LengthMismatch {
                declared: 3,
                received: 2
            })
        );
    }

    #[test]
    fn response_bound_enforced() {
        let mut assembler = ResponseAssembler::new(3);
        assembler.push(&[0x55, 0x01, 0x00, 0x02]).unwrap();
        assembler.push(b"ab").unwrap();
        assembler.push(&[0x55, 0x02, 0x00, 0x02]).unwrap();
        assert_eq!(
            assembler.push(b"cd"),
            Err(Error::ResponseTooLarge { size: 4, max: 3 })
        );
    }
}
