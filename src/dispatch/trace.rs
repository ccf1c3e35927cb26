//! `trace start|stop|get`: binary capture served over the command channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::{Command, DispatchError, Outcome, Parameters, ReplyWriter};

const OK: &str = "OK";
const BAD_COMMAND: &str = "Bad Command.";

#[derive(Debug, Default)]
struct Capture {
    recording: bool,
    data: Vec<u8>,
    limit: usize,
    dropped: u64,
}

/// Producer handle feeding the capture buffer.
#[derive(Debug, Clone)]
pub struct TraceSink {
    capture: Arc<Mutex<Capture>>,
}

impl TraceSink {
    fn lock(&self) -> MutexGuard<'_, Capture> {
        self.capture.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append trace bytes while recording. Bytes past the capacity are
    /// dropped and counted.
    pub fn record(&self, bytes: &[u8]) {
        let mut capture = self.lock();
        if !capture.recording {
            return;
        }
        let room = capture.limit.saturating_sub(capture.data.len());
        let kept = bytes.len().min(room);
        capture.data.extend_from_slice(&bytes[..kept]);
        if kept < bytes.len() {
            capture.dropped += (bytes.len() - kept) as u64;
        }
    }

    /// Whether `trace start` is in effect.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.lock().recording
    }

    /// Bytes captured and not yet delivered.
    #[must_use]
    pub fn captured(&self) -> usize {
        self.lock().data.len()
    }

    /// Bytes lost because the capture was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }
}

/// Trace control command.
///
/// `get` serves a snapshot of the capture; the snapshot is only removed
/// from the capture once it was delivered, so a failed send leaves the
/// data in place for the next `get`.
#[derive(Debug)]
pub struct TraceCommand {
    sink: TraceSink,
    snapshot: Vec<u8>,
}

impl TraceCommand {
    /// Create a trace command holding up to `capacity` captured bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capture = Capture {
            limit: capacity,
            ..Capture::default()
        };
        Self {
            sink: TraceSink {
                capture: Arc::new(Mutex::new(capture)),
            },
            snapshot: Vec::new(),
        }
    }

    /// Handle for the code producing trace data.
    #[must_use]
    pub fn sink(&self) -> TraceSink {
        self.sink.clone()
    }
}

impl Command for TraceCommand {
    fn name(&self) -> &str {
        "trace"
    }

    fn help(&self) -> &str {
        "trace: Starts, stops and gets the trace according to the parameter - start/stop/get.\r\n"
    }

    fn parameters(&self) -> Parameters {
        Parameters::Exactly(1)
    }

    fn execute(
        &mut self,
        args: &[&str],
        out: &mut ReplyWriter<'_>,
    ) -> Result<Outcome, DispatchError> {
        match args.first().copied() {
            Some("start") => {
                self.sink.lock().recording = true;
                debug!("trace started");
                out.push_str(OK)?;
                Ok(Outcome::Text)
            }
            Some("stop") => {
                self.sink.lock().recording = false;
                debug!("trace stopped");
                out.push_str(OK)?;
                Ok(Outcome::Text)
            }
            Some("get") => {
                let capture = self.sink.lock();
                self.snapshot.clear();
                self.snapshot.extend_from_slice(&capture.data);
                if capture.dropped > 0 {
                    warn!(dropped = capture.dropped, "trace capture overflowed");
                }
                Ok(Outcome::Binary)
            }
            _ => {
                out.push_str(BAD_COMMAND)?;
                Ok(Outcome::Text)
            }
        }
    }

    fn binary(&self) -> &[u8] {
        &self.snapshot
    }

    fn binary_sent(&mut self) {
        let delivered = self.snapshot.len();
        {
            let mut capture = self.sink.lock();
            let delivered = delivered.min(capture.data.len());
            capture.data.drain(..delivered);
            capture.dropped = 0;
        }
        self.snapshot.clear();
        debug!(delivered, "trace capture advanced");
    }
}
