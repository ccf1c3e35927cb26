//! Node lifecycle: start the server once, the first time the network is up.

use std::mem;
use std::net::SocketAddr;
use std::thread::{self, JoinHandle};

use tracing::{error, info, warn};

use super::{Server, ServerConfig, ServerError};
use crate::dispatch::Dispatcher;
use crate::transport::SocketBinding;

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Network not up yet; nothing bound.
    Waiting,
    /// Server thread running.
    Serving,
    /// Server thread finished or could not be started.
    Stopped,
}

enum Lifecycle<D> {
    Waiting(D),
    Serving {
        addr: SocketAddr,
        handle: JoinHandle<Result<(), ServerError>>,
    },
    Stopped,
}

/// Owns the dispatcher until the network comes up, then the server thread.
///
/// Network-up events may repeat (link flaps, DHCP renewals); only the first
/// one starts the server.
pub struct Node<D> {
    config: ServerConfig,
    lifecycle: Lifecycle<D>,
}

impl<D> Node<D> {
    /// Current state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        match self.lifecycle {
            Lifecycle::Waiting(_) => LifecycleState::Waiting,
            Lifecycle::Serving { .. } => LifecycleState::Serving,
            Lifecycle::Stopped => LifecycleState::Stopped,
        }
    }

    /// Address the server is bound to, once serving.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match self.lifecycle {
            Lifecycle::Serving { addr, .. } => Some(addr),
            _ => None,
        }
    }
}

impl<D> Node<D>
where
    D: Dispatcher + Send + 'static,
{
    /// Create a node that will serve `dispatcher` with `config`.
    pub fn new(config: ServerConfig, dispatcher: D) -> Result<Self, ServerError> {
        config.validate()?;
        Ok(Self {
            config,
            lifecycle: Lifecycle::Waiting(dispatcher),
        })
    }

    /// Handle a network-up event.
    ///
    /// Binds the socket and starts the server thread the first time; later
    /// calls only report the address. A bind failure leaves the node
    /// waiting so a later event can retry. Failing to spawn the server
    /// thread is terminal: the dispatcher is dropped and the node stops.
    pub fn network_up(&mut self) -> Result<SocketAddr, ServerError> {
        match &self.lifecycle {
            Lifecycle::Serving { addr, .. } => {
                info!(%addr, "network up; server already running");
                return Ok(*addr);
            }
            Lifecycle::Stopped => return Err(ServerError::Stopped),
            Lifecycle::Waiting(_) => {}
        }

        let socket = SocketBinding::bind(self.config.bind).map_err(ServerError::Bind)?;
        socket
            .set_read_timeout(self.config.read_timeout)
            .map_err(ServerError::Bind)?;
        let addr = socket.local_addr().map_err(ServerError::Bind)?;

        let Lifecycle::Waiting(dispatcher) = mem::replace(&mut self.lifecycle, Lifecycle::Stopped)
        else {
            return Err(ServerError::Stopped);
        };
        let mut server = Server::new(socket, dispatcher, self.config.clone())?;

        let handle = thread::Builder::new()
            .name("cmdgram-server".to_owned())
            .spawn(move || {
                info!(%addr, "waiting for requests");
                let result = server.run();
                if let Err(err) = &result {
                    warn!(error = %err, "server loop stopped");
                }
                result
            })
            .map_err(|err| {
                error!(%addr, error = %err, "could not spawn server thread; node stopped");
                ServerError::Spawn(err)
            })?;

        self.lifecycle = Lifecycle::Serving { addr, handle };
        Ok(addr)
    }

    /// Wait for the server thread to finish.
    pub fn join(&mut self) -> Result<(), ServerError> {
        match mem::replace(&mut self.lifecycle, Lifecycle::Stopped) {
            Lifecycle::Serving { handle, .. } => handle.join().map_err(|_| ServerError::Panicked)?,
            Lifecycle::Waiting(dispatcher) => {
                self.lifecycle = Lifecycle::Waiting(dispatcher);
                Ok(())
            }
            Lifecycle::Stopped => Ok(()),
        }
    }
}

impl<D> std::fmt::Debug for Node<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}
