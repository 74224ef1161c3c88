//! Command transports.
//!
//! The daemon can be reached three ways, and a client uses exactly one of
//! them for its whole lifetime:
//!
//! | Transport | Framing | Outcome signal | Deadlines |
//! |-----------|---------|----------------|-----------|
//! | [`SubprocessTransport`] | `<binary> -t <command>` | exit code 0/1/2 | none |
//! | [`UnixSocketTransport`] | `command\n`, reply read to EOF | reply text | connect 2s, write 2s, read 5s |
//! | [`NamedPipeTransport`] | `command\n`, one message reply | reply text | connect 5s, exchange 5s |
//!
//! The protocol has no length prefixes or heartbeats; the deadlines exist
//! only to bound an unresponsive daemon.

use std::sync::Arc;

use tracing::debug;
use vhctl_config::{AppConfig, TransportKind};

use crate::BoxFuture;
use crate::command::Command;
use crate::error::{ClientError, TransportError};

pub mod subprocess;

#[cfg(unix)]
pub mod unix;

#[cfg(windows)]
pub mod pipe;

pub use subprocess::SubprocessTransport;

#[cfg(unix)]
pub use unix::UnixSocketTransport;

#[cfg(windows)]
pub use pipe::NamedPipeTransport;

/// What came back from the daemon, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawReply {
    /// Reply text from a socket or pipe.
    Text(String),
    /// Exit status and combined stdout/stderr of a `-t` invocation.
    /// `code` is `None` when the process died from a signal.
    Exit { code: Option<i32>, output: String },
}

/// Delivers one command and returns the daemon's raw reply.
pub trait Transport: Send + Sync {
    /// Short name for logs (e.g. "subprocess", "unix-socket").
    fn name(&self) -> &str;

    /// Send `command` and wait for the reply.
    fn send<'a>(&'a self, command: &'a Command)
    -> BoxFuture<'a, Result<RawReply, TransportError>>;
}

/// Build the transport named by the configuration.
///
/// `auto` picks the named pipe on Windows and the Unix socket pair
/// elsewhere. Forcing a transport the platform lacks is a configuration
/// error rather than a late runtime failure.
pub fn select_transport(config: &AppConfig) -> Result<Arc<dyn Transport>, ClientError> {
    let transport = match (config.client.transport, cfg!(windows)) {
        (TransportKind::Subprocess, _) => Ok(Arc::new(SubprocessTransport::new(
            config.client.binary_path.clone(),
        )) as Arc<dyn Transport>),
        (TransportKind::UnixSocket, _) | (TransportKind::Auto, false) => unix_socket(config),
        (TransportKind::NamedPipe, _) | (TransportKind::Auto, true) => named_pipe(config),
    }?;
    debug!(
        configured = %config.client.transport,
        transport = transport.name(),
        "Selected transport"
    );
    Ok(transport)
}

#[cfg(unix)]
fn unix_socket(config: &AppConfig) -> Result<Arc<dyn Transport>, ClientError> {
    Ok(Arc::new(UnixSocketTransport::from_config(&config.socket)))
}

#[cfg(not(unix))]
fn unix_socket(_config: &AppConfig) -> Result<Arc<dyn Transport>, ClientError> {
    Err(ClientError::Config(
        "unix-socket transport is not available on this platform".to_string(),
    ))
}

#[cfg(windows)]
fn named_pipe(config: &AppConfig) -> Result<Arc<dyn Transport>, ClientError> {
    Ok(Arc::new(NamedPipeTransport::from_config(&config.pipe)))
}

#[cfg(not(windows))]
fn named_pipe(_config: &AppConfig) -> Result<Arc<dyn Transport>, ClientError> {
    Err(ClientError::Config(
        "named-pipe transport is not available on this platform".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(kind: TransportKind) -> AppConfig {
        let mut config = AppConfig::default();
        config.client.transport = kind;
        config
    }

    #[test]
    fn test_select_subprocess() {
        let transport = select_transport(&config_with(TransportKind::Subprocess)).unwrap();
        assert_eq!(transport.name(), "subprocess");
    }

    #[cfg(unix)]
    #[test]
    fn test_auto_selects_unix_socket() {
        let transport = select_transport(&config_with(TransportKind::Auto)).unwrap();
        assert_eq!(transport.name(), "unix-socket");
    }

    #[cfg(unix)]
    #[test]
    fn test_named_pipe_unavailable_on_unix() {
        let result = select_transport(&config_with(TransportKind::NamedPipe));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_every_kind_resolves_without_panicking() {
        let names: Vec<_> = [
            TransportKind::Auto,
            TransportKind::Subprocess,
            TransportKind::UnixSocket,
            TransportKind::NamedPipe,
        ]
        .into_iter()
        .map(|kind| select_transport(&config_with(kind)).map(|t| t.name().to_string()).ok())
        .collect();
        assert_eq!(
            names,
            vec![
                Some("unix-socket".to_string()),
                Some("subprocess".to_string()),
                Some("unix-socket".to_string()),
                None,
            ]
        );
    }

    #[cfg(windows)]
    #[test]
    fn test_auto_selects_named_pipe() {
        let transport = select_transport(&config_with(TransportKind::Auto)).unwrap();
        assert_eq!(transport.name(), "named-pipe");
    }
}
