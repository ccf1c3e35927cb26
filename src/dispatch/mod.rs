//! Command dispatch boundary
//!
//! The exchange loop hands a validated command string to a [`Dispatcher`]
//! and gets back either text written into the caller's output buffer or a
//! borrowed binary buffer held by the dispatcher.

mod registry;
mod stats;
mod trace;
mod writer;

use thiserror::Error;

pub use registry::{
    Command, CommandRegistry, INCORRECT_PARAMETERS, NOT_RECOGNISED, Outcome, Parameters,
};
pub use stats::StatsCommand;
pub use trace::{TraceCommand, TraceSink};
pub use writer::ReplyWriter;

/// Result of dispatching one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply<'a> {
    /// Text written into the output buffer.
    Text(&'a [u8]),
    /// Binary data owned by the dispatcher.
    ///
    /// The dispatcher must keep it intact until
    /// [`Dispatcher::binary_sent`] is called.
    Binary(&'a [u8]),
}

impl<'a> Reply<'a> {
    /// Bytes to send back.
    #[must_use]
    pub const fn bytes(&self) -> &'a [u8] {
        match *self {
            Self::Text(bytes) | Self::Binary(bytes) => bytes,
        }
    }

    /// Whether the reply borrows the dispatcher's binary buffer.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }
}

/// Dispatch errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Reply does not fit in the output buffer
    #[error("reply truncated: output capacity is {capacity} bytes")]
    Truncated {
        /// Output buffer capacity
        capacity: usize,
    },

    /// A command with this name is already registered
    #[error("command already registered: {name}")]
    Duplicate {
        /// Command name
        name: String,
    },
}

/// Maps a command string to a reply.
pub trait Dispatcher {
    /// Run `command`, writing text replies into `output`.
    fn dispatch<'a>(
        &'a mut self,
        command: &str,
        output: &'a mut [u8],
    ) -> Result<Reply<'a>, DispatchError>;

    /// Called once the last binary reply was sent in full, terminator
    /// included. Never called after a failed send.
    fn binary_sent(&mut self) {}
}

impl<D: Dispatcher + ?Sized> Dispatcher for Box<D> {
    fn dispatch<'a>(
        &'a mut self,
        command: &str,
        output: &'a mut [u8],
    ) -> Result<Reply<'a>, DispatchError> {
        (**self).dispatch(command, output)
    }

    fn binary_sent(&mut self) {
        (**self).binary_sent();
    }
}
