//! `stats`: exchange counters as text.

use super::{Command, DispatchError, Outcome, Parameters, ReplyWriter};
use crate::protocol::metrics::Metrics;

/// Reports process-wide exchange counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatsCommand;

impl Command for StatsCommand {
    fn name(&self) -> &str {
        "stats"
    }

    fn help(&self) -> &str {
        "stats: Displays request and frame counters.\r\n"
    }

    fn parameters(&self) -> Parameters {
        Parameters::Exactly(0)
    }

    fn execute(
        &mut self,
        _args: &[&str],
        out: &mut ReplyWriter<'_>,
    ) -> Result<Outcome, DispatchError> {
        let totals = Metrics::totals();
        write!(
            out,
            "requests: {}\r\nrejected: {}\r\ndispatch failures: {}\r\nresponses: {}\r\naborted: {}\r\nframes: {}\r\nbytes: {}\r\n",
            totals.requests_received,
            totals.requests_rejected,
            totals.dispatch_failures,
            totals.responses_sent,
            totals.responses_aborted,
            totals.frames_sent,
            totals.payload_bytes_sent,
        )?;
        Ok(Outcome::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{CommandRegistry, Dispatcher};

    #[test]
    fn lists_counters() {
        let mut registry = CommandRegistry::new().with(StatsCommand).unwrap();
        let mut out = [0u8; 256];
        let reply = registry.dispatch("stats", &mut out).unwrap();
        let text = std::str::from_utf8(reply.bytes()).unwrap();
        assert!(text.starts_with("requests: "));
        assert!(text.contains("\r\nframes: "));
    }
}
