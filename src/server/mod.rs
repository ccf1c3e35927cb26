//! Node side: the request/response exchange loop and its lifecycle.

mod config;
mod exchange;
mod lifecycle;

use thiserror::Error;

use crate::transport::SocketError;

pub use config::{DEFAULT_PORT, ServerConfig};
pub use exchange::{Exchange, Server};
pub use lifecycle::{LifecycleState, Node};

/// Errors that stop the exchange loop.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Socket could not be bound or configured
    #[error("failed to bind server socket: {0}")]
    Bind(#[source] SocketError),

    /// Receive failed for a reason other than a timeout
    #[error("receive failed: {0}")]
    Receive(#[source] SocketError),

    /// Configuration outside protocol limits
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Server thread could not be started
    #[error("failed to spawn server thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// Server thread panicked
    #[error("server thread panicked")]
    Panicked,

    /// Node has no server left to start
    #[error("node already stopped")]
    Stopped,
}
