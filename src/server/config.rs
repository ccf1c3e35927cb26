//! Node configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use super::ServerError;
use crate::protocol::{FragmentConfig, MAX_COMMAND_LEN, MAX_OUTPUT_LEN, MAX_UDP_PAYLOAD};

/// Default UDP port the node listens on.
pub const DEFAULT_PORT: u16 = 1234;

/// Server configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ServerConfig {
    /// Local address to bind.
    pub bind: SocketAddr,
    /// Largest payload per response frame.
    pub max_payload: usize,
    /// Largest command accepted in a request.
    pub max_command_len: usize,
    /// Capacity of the text reply buffer.
    pub max_output_len: usize,
    /// Pause between response frames.
    pub frame_interval: Duration,
    /// Receive timeout; `None` blocks until a datagram arrives.
    pub read_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            max_payload: MAX_UDP_PAYLOAD,
            max_command_len: MAX_COMMAND_LEN,
            max_output_len: MAX_OUTPUT_LEN,
            frame_interval: Duration::ZERO,
            read_timeout: None,
        }
    }
}

impl ServerConfig {
    /// Check limits against what the wire format can express.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.max_payload == 0 || self.max_payload > usize::from(u16::MAX) {
            return Err(ServerError::InvalidConfig(format!(
                "max_payload must be between 1 and 65535, got {}",
                self.max_payload
            )));
        }
        if self.max_command_len == 0 || self.max_command_len > MAX_UDP_PAYLOAD {
            return Err(ServerError::InvalidConfig(format!(
                "max_command_len must be between 1 and {MAX_UDP_PAYLOAD}, got {}",
                self.max_command_len
            )));
        }
        if self.max_output_len == 0 {
            return Err(ServerError::InvalidConfig(
                "max_output_len must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    /// Settings handed to the fragmenter.
    #[must_use]
    pub fn fragment_config(&self) -> FragmentConfig {
        FragmentConfig {
            max_payload: self.max_payload,
            frame_interval: self.frame_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind.port(), DEFAULT_PORT);
        assert_eq!(config.fragment_config(), FragmentConfig::default());
    }

    #[test]
    fn rejects_unencodable_limits() {
        let config = ServerConfig {
            max_payload: 70_000,
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ServerError::InvalidConfig(_))));

        let config = ServerConfig {
            max_command_len: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ServerError::InvalidConfig(_))));
    }
}
