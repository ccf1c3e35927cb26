use std::sync::atomic::{AtomicU64, Ordering};

/// Track exchange counters without external dependencies.
pub(crate) struct Metrics;

static REQUESTS_RECEIVED: AtomicU64 = AtomicU64::new(0);
static REQUESTS_REJECTED: AtomicU64 = AtomicU64::new(0);
static DISPATCH_FAILURES: AtomicU64 = AtomicU64::new(0);
static RESPONSES_SENT: AtomicU64 = AtomicU64::new(0);
static RESPONSES_ABORTED: AtomicU64 = AtomicU64::new(0);
static FRAMES_SENT: AtomicU64 = AtomicU64::new(0);
static PAYLOAD_BYTES_SENT: AtomicU64 = AtomicU64::new(0);

/// Final state of one request.
#[derive(Clone, Copy)]
pub(crate) enum RequestOutcome {
    Rejected,
    DispatchFailed,
    Responded,
    Aborted,
}

impl Metrics {
    #[inline]
    pub(crate) fn record_request(outcome: RequestOutcome) {
        REQUESTS_RECEIVED.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            RequestOutcome::Rejected => &REQUESTS_REJECTED,
            RequestOutcome::DispatchFailed => &DISPATCH_FAILURES,
            RequestOutcome::Responded => &RESPONSES_SENT,
            RequestOutcome::Aborted => &RESPONSES_ABORTED,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_frame(payload_len: usize) {
        FRAMES_SENT.fetch_add(1, Ordering::Relaxed);
        PAYLOAD_BYTES_SENT.fetch_add(payload_len as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn totals() -> MetricsSnapshot {
        MetricsSnapshot {
            requests_received: REQUESTS_RECEIVED.load(Ordering::Relaxed),
            requests_rejected: REQUESTS_REJECTED.load(Ordering::Relaxed),
            dispatch_failures: DISPATCH_FAILURES.load(Ordering::Relaxed),
            responses_sent: RESPONSES_SENT.load(Ordering::Relaxed),
            responses_aborted: RESPONSES_ABORTED.load(Ordering::Relaxed),
            frames_sent: FRAMES_SENT.load(Ordering::Relaxed),
            payload_bytes_sent: PAYLOAD_BYTES_SENT.load(Ordering::Relaxed),
        }
    }
}

/// Lightweight snapshot of process-wide counters.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_received: u64,
    pub requests_rejected: u64,
    pub dispatch_failures: u64,
    pub responses_sent: u64,
    pub responses_aborted: u64,
    pub frames_sent: u64,
    pub payload_bytes_sent: u64,
}

impl MetricsSnapshot {
    /// Share of received requests that produced a complete response.
    #[must_use]
    pub fn success_ratio(&self) -> Option<f64> {
        if self.requests_received == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.responses_sent as f64 / self.requests_received as f64)
    }
}
