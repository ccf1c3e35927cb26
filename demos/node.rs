//! Command node serving `help`, `trace` and `stats` over UDP.
//!
//! While tracing is started, a background thread records counter snapshots
//! into the trace capture so `trace get` has something to return.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use cmdgram::dispatch::{CommandRegistry, StatsCommand, TraceCommand};
use cmdgram::server::{DEFAULT_PORT, Node, ServerConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Serve framed UDP commands")]
struct Args {
    /// Address to bind
    #[arg(long, default_value_t = SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))]
    bind: SocketAddr,

    /// Largest payload per response frame
    #[arg(long, default_value_t = cmdgram::MAX_UDP_PAYLOAD)]
    max_payload: usize,

    /// Pause between response frames, in milliseconds
    #[arg(long, default_value_t = 0)]
    frame_interval_ms: u64,

    /// Trace capture capacity in bytes
    #[arg(long, default_value_t = 64 * 1024)]
    trace_capacity: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let trace = TraceCommand::new(args.trace_capacity);
    let sink = trace.sink();
    let registry = CommandRegistry::new().with(trace)?.with(StatsCommand)?;

    let config = ServerConfig {
        bind: args.bind,
        max_payload: args.max_payload,
        frame_interval: Duration::from_millis(args.frame_interval_ms),
        ..ServerConfig::default()
    };

    let mut node = Node::new(config, registry)?;
    let addr = node.network_up()?;
    tracing::info!(%addr, "node up");

    // Synthetic trace source: a counter snapshot every 100 ms while recording.
    std::thread::spawn(move || {
        loop {
            if sink.is_recording() {
                let snapshot = cmdgram::metrics_snapshot();
                sink.record(&snapshot.requests_received.to_be_bytes());
                sink.record(&snapshot.frames_sent.to_be_bytes());
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    });

    node.join()?;
    Ok(())
}
