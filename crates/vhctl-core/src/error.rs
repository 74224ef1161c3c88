//! Error taxonomy for the control client.
//!
//! Transport faults never carry a daemon message; daemon-reported failures
//! never carry an OS error. Callers can therefore tell "the daemon is
//! unreachable" apart from "the daemon said no" by matching on the variant.

use std::path::PathBuf;
use std::time::Duration;

use vhctl_config::ConfigError;

/// Which stage of a socket or pipe exchange exceeded its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Write,
    Read,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Connect => write!(f, "connect"),
            Stage::Write => write!(f, "write"),
            Stage::Read => write!(f, "read"),
        }
    }
}

/// Failures below the protocol: the command never produced a classifiable reply.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },

    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: Stage, after: Duration },

    #[error("failed to spawn {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("daemon exited with unexpected status {code:?}: {output}")]
    UnexpectedExit { code: Option<i32>, output: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Whether this failure was a client-side deadline rather than an OS error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}

/// Errors surfaced by [`Client`](crate::Client) operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("command failed")]
    CommandFailed,

    #[error("daemon error: {0}")]
    Protocol(String),

    #[error("failed to parse reply: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<ConfigError> for ClientError {
    fn from(e: ConfigError) -> Self {
        ClientError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = TransportError::Timeout {
            stage: Stage::Read,
            after: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "read timed out after 5s");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_transport_wraps_into_client_error() {
        let err: ClientError = TransportError::UnexpectedExit {
            code: Some(7),
            output: "boom".to_string(),
        }
        .into();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(
            err.to_string(),
            "transport error: daemon exited with unexpected status Some(7): boom"
        );
    }

    #[test]
    fn test_command_failed_display() {
        assert_eq!(ClientError::CommandFailed.to_string(), "command failed");
    }

    #[test]
    fn test_config_error_conversion() {
        let err: ClientError = ConfigError::Validation("pipe.name must not be empty".into()).into();
        assert!(matches!(err, ClientError::Config(ref m) if m.contains("pipe.name")));
    }
}
