//! Response fragmentation
//!
//! A response of any length goes out as a run of frames, each holding at most
//! `max_payload` bytes, followed by one empty terminator frame. Each frame is
//! two transport writes: the header, then the payload.

use std::fmt;
use std::net::SocketAddr;
use std::slice::Chunks;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::metrics::Metrics;
use super::{FrameHeader, MAX_UDP_PAYLOAD};
use crate::transport::{Datagram, SocketError};

/// Fragmentation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FragmentConfig {
    /// Largest payload carried by one frame.
    pub max_payload: usize,
    /// Pause between consecutive frames.
    pub frame_interval: Duration,
}

impl Default for FragmentConfig {
    fn default() -> Self {
        Self {
            max_payload: MAX_UDP_PAYLOAD,
            frame_interval: Duration::ZERO,
        }
    }
}

/// Which of the two writes of a frame failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePart {
    /// The 4-byte header write.
    Header,
    /// The payload write.
    Payload,
}

impl fmt::Display for FramePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => f.write_str("header"),
            Self::Payload => f.write_str("payload"),
        }
    }
}

/// Errors that abort a response.
#[derive(Debug, Error)]
pub enum SendError {
    /// Transport accepted fewer bytes than requested
    #[error("short {part} write on frame {sequence}: sent {actual} of {expected} bytes")]
    ShortWrite {
        /// Failed part
        part: FramePart,
        /// Sequence number of the frame
        sequence: u8,
        /// Bytes requested
        expected: usize,
        /// Bytes accepted
        actual: usize,
    },

    /// Transport reported an error
    #[error("{part} write on frame {sequence} failed: {source}")]
    Io {
        /// Failed part
        part: FramePart,
        /// Sequence number of the frame
        sequence: u8,
        /// Underlying socket error
        #[source]
        source: SocketError,
    },

    /// Payload capacity cannot be expressed in the length field
    #[error("invalid max payload {0}: must be between 1 and 65535")]
    InvalidMaxPayload(usize),
}

/// What a completed response put on the wire.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SendSummary {
    /// Frames sent, terminator included.
    pub frames: usize,
    /// Payload bytes sent.
    pub bytes: usize,
    /// Whether the 8-bit sequence number wrapped.
    pub wrapped: bool,
}

/// Iterator over the frames of one response.
///
/// Yields every data frame in order, then exactly one terminator.
#[derive(Debug, Clone)]
pub struct Fragments<'a> {
    chunks: Chunks<'a, u8>,
    sequence: u8,
    finished: bool,
}

impl<'a> Fragments<'a> {
    /// Slice `response` into frames of at most `max_payload` bytes.
    pub fn new(response: &'a [u8], max_payload: usize) -> Result<Self, SendError> {
        if max_payload == 0 || max_payload > usize::from(u16::MAX) {
            return Err(SendError::InvalidMaxPayload(max_payload));
        }
        Ok(Self {
            chunks: response.chunks(max_payload),
            sequence: 1,
            finished: false,
        })
    }
}

impl<'a> Iterator for Fragments<'a> {
    type Item = (FrameHeader, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let sequence = self.sequence;
        self.sequence = sequence.wrapping_add(1);

        match self.chunks.next() {
            Some(chunk) => {
                #[allow(clippy::cast_possible_truncation)]
                let header = FrameHeader::new(sequence, chunk.len() as u16);
                Some((header, chunk))
            }
            None => {
                self.finished = true;
                Some((FrameHeader::terminator(sequence), &[]))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.finished {
            0
        } else {
            self.chunks.len() + 1
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Fragments<'_> {}

/// Number of frames a response of `len` bytes takes, terminator included.
#[must_use]
pub const fn frame_count(len: usize, max_payload: usize) -> usize {
    len.div_ceil(max_payload) + 1
}

/// Send `response` to `destination` as a framed sequence.
///
/// Any failed or short write aborts the whole response; the terminator is
/// then never sent.
#[instrument(level = "debug", skip(channel, response, config), fields(len = response.len()))]
pub fn send_response<T>(
    channel: &mut T,
    destination: SocketAddr,
    response: &[u8],
    config: &FragmentConfig,
) -> Result<SendSummary, SendError>
where
    T: Datagram + ?Sized,
{
    let fragments = Fragments::new(response, config.max_payload)?;
    let mut summary = SendSummary::default();

    for (index, (header, chunk)) in fragments.enumerate() {
        if index > 0 && !config.frame_interval.is_zero() {
            std::thread::sleep(config.frame_interval);
        }

        let sequence = header.sequence();
        if sequence == 0 && !summary.wrapped {
            // Receivers cannot tell frame 256 from frame 0; the wrap is
            // accepted as a protocol limitation.
            warn!(len = response.len(), "response sequence number wrapped past 255");
            summary.wrapped = true;
        }

        write_part(channel, destination, &header.to_bytes(), FramePart::Header, sequence)?;
        if !chunk.is_empty() {
            write_part(channel, destination, chunk, FramePart::Payload, sequence)?;
        }

        Metrics::record_frame(chunk.len());
        summary.frames += 1;
        summary.bytes += chunk.len();
    }

    debug!(frames = summary.frames, bytes = summary.bytes, "response sent");
    Ok(summary)
}

fn write_part<T>(
    channel: &mut T,
    destination: SocketAddr,
    bytes: &[u8],
    part: FramePart,
    sequence: u8,
) -> Result<(), SendError>
where
    T: Datagram + ?Sized,
{
    let actual = channel
        .send_to(bytes, destination)
        .map_err(|source| SendError::Io {
            part,
            sequence,
            source,
        })?;

    if actual != bytes.len() {
        return Err(SendError::ShortWrite {
            part,
            sequence,
            expected: bytes.len(),
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{HEADER_SIZE, ResponseAssembler};
    use std::io;

    /// Records every write; optionally misbehaves on the n-th one.
    #[derive(Default)]
    struct Recorder {
        writes: Vec<Vec<u8>>,
        short_at: Option<usize>,
        fail_at: Option<usize>,
    }

    impl Datagram for Recorder {
        fn recv_from(&mut self, _buf: &mut [u8]) -> Result<(usize, SocketAddr), SocketError> {
            Err(io::Error::from(io::ErrorKind::WouldBlock).into())
        }

        fn send_to(&mut self, buf: &[u8], _addr: SocketAddr) -> Result<usize, SocketError> {
            let index = self.writes.len();
            if self.fail_at == Some(index) {
                return Err(io::Error::from(io::ErrorKind::ConnectionRefused).into());
            }
            self.writes.push(buf.to_vec());
            if self.short_at == Some(index) {
                return Ok(buf.len() - 1);
            }
            Ok(buf.len())
        }
    }

    fn peer() -> SocketAddr {
        "192.0.2.7:40000".parse().unwrap()
    }

    #[test]
    fn test_ok_reply_is_two_frames() {
        let mut channel = Recorder::default();
        let summary =
            send_response(&mut channel, peer(), b"OK", &FragmentConfig::default()).unwrap();

        assert_eq!(summary.frames, 2);
        assert_eq!(
            channel.writes,
            vec![
                vec![0x55, 0x01, 0x00, 0x02],
                b"OK".to_vec(),
                vec![0x55, 0x02, 0x00, 0x00],
            ]
        );
    }

    #[test]
    fn test_empty_response_is_terminator_only() {
        let frames: Vec<_> = Fragments::new(&[], 1400).unwrap().collect();
        assert_eq!(frames, vec![(FrameHeader::terminator(1), &b""[..])]);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_data_frame() {
        let response = vec![7u8; 30];
        let frames: Vec<_> = Fragments::new(&response, 10).unwrap().collect();

        assert_eq!(frames.len(), 4);
        assert!(frames[..3].iter().all(|(h, c)| h.payload_len() == 10 && c.len() == 10));
        assert_eq!(frames[3].0, FrameHeader::terminator(4));
    }

    #[test]
    fn test_invalid_max_payload() {
        assert!(matches!(
            Fragments::new(b"x", 0),
            Err(SendError::InvalidMaxPayload(0))
        ));
        assert!(matches!(
            Fragments::new(b"x", 70_000),
            Err(SendError::InvalidMaxPayload(70_000))
        ));
    }

    #[test]
    fn test_failure_on_second_data_frame_skips_terminator() {
        // Writes: h1, p1, h2, p2, h3... Fail the second payload.
        let mut channel = Recorder {
            fail_at: Some(3),
            ..Recorder::default()
        };
        let config = FragmentConfig {
            max_payload: 4,
            ..FragmentConfig::default()
        };

        let err = send_response(&mut channel, peer(), b"abcdefgh", &config).unwrap_err();

        assert!(matches!(
            err,
            SendError::Io {
                part: FramePart::Payload,
                sequence: 2,
                ..
            }
        ));
        assert_eq!(channel.writes.len(), 3);
        assert!(channel.writes.iter().all(|w| w != &[0x55, 0x03, 0x00, 0x00]));
    }

    #[test]
    fn test_short_header_write_aborts() {
        let mut channel = Recorder {
            short_at: Some(2),
            ..Recorder::default()
        };
        let config = FragmentConfig {
            max_payload: 2,
            ..FragmentConfig::default()
        };

        let err = send_response(&mut channel, peer(), b"abcd", &config).unwrap_err();

        assert!(matches!(
            err,
            SendError::ShortWrite {
                part: FramePart::Header,
                sequence: 2,
                expected: HEADER_SIZE,
                actual: 3,
            }
        ));
        assert_eq!(channel.writes.len(), 3);
    }

    #[test]
    fn test_sequence_wraps_without_error() {
        let response = vec![1u8; 300];
        let mut channel = Recorder::default();
        let config = FragmentConfig {
            max_payload: 1,
            ..FragmentConfig::default()
        };

        let summary = send_response(&mut channel, peer(), &response, &config).unwrap();

        assert_eq!(summary.frames, 301);
        assert!(summary.wrapped);
        // Frame 256 carries sequence 0; the terminator continues the count.
        assert_eq!(channel.writes[255 * 2][1], 0);
        assert_eq!(channel.writes.last().unwrap(), &vec![0x55, 45, 0x00, 0x00]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: frame count and payload concatenation
            #[test]
            fn prop_frames_reconstruct_response(
                response in prop::collection::vec(any::<u8>(), 0..=8192),
                max_payload in 1usize..=2048,
            ) {
                let frames: Vec<_> = Fragments::new(&response, max_payload).unwrap().collect();

                prop_assert_eq!(frames.len(), frame_count(response.len(), max_payload));
                let (last, data) = frames.split_last().unwrap();
                prop_assert!(last.0.is_terminator());
                prop_assert!(data.iter().all(|(h, c)| !h.is_terminator() && c.len() <= max_payload));
                let joined: Vec<u8> = data.iter().flat_map(|(_, c)| c.iter().copied()).collect();
                prop_assert_eq!(joined, response);
            }

            /// Property: fragmenting twice gives byte-identical writes
            #[test]
            fn prop_fragmenting_is_deterministic(
                response in prop::collection::vec(any::<u8>(), 0..=4096),
                max_payload in 1usize..=512,
            ) {
                let config = FragmentConfig { max_payload, ..FragmentConfig::default() };
                let mut first = Recorder::default();
                let mut second = Recorder::default();
                send_response(&mut first, peer(), &response, &config).unwrap();
                send_response(&mut second, peer(), &response, &config).unwrap();

                prop_assert_eq!(first.writes, second.writes);
            }

            /// Property: the emitted writes re-assemble into the response
            #[test]
            fn prop_assembler_roundtrip(
                response in prop::collection::vec(any::<u8>(), 0..=8192),
                max_payload in 1usize..=1400,
            ) {
                let config = FragmentConfig { max_payload, ..FragmentConfig::default() };
                let mut channel = Recorder::default();
                send_response(&mut channel, peer(), &response, &config).unwrap();

                let mut assembler = ResponseAssembler::default();
                let mut complete = None;
                for write in &channel.writes {
                    prop_assert!(complete.is_none());
                    complete = assembler.push(write).unwrap();
                }
                let complete = complete.unwrap();
                prop_assert_eq!(complete.as_ref(), response.as_slice());
            }
        }
    }
}
