//! Send one command to a node and print the response.

use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use cmdgram::Client;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Query a framed UDP command node")]
struct Args {
    /// Node address
    #[arg(long, default_value = "127.0.0.1:1234")]
    node: SocketAddr,

    /// Per-datagram response timeout, in milliseconds
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    /// Write the raw response to stdout (for binary replies)
    #[arg(long)]
    raw: bool,

    /// Command and parameters
    #[arg(required = true, trailing_var_arg = true)]
    command: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let local = if args.node.is_ipv4() {
        SocketAddr::from(([0, 0, 0, 0], 0))
    } else {
        SocketAddr::from(([0u16; 8], 0))
    };

    let mut client = Client::connect(local, args.node)?;
    client.set_response_timeout(Duration::from_millis(args.timeout_ms))?;

    let response = client.request(&args.command.join(" "))?;
    if args.raw {
        std::io::stdout().write_all(&response)?;
    } else {
        println!("{}", String::from_utf8_lossy(&response));
    }
    Ok(())
}
