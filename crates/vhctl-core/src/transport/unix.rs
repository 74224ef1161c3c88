//! Unix domain socket transport.
//!
//! The daemon listens on two sockets. The response socket must be opened
//! first because the daemon only writes once it sees a consumer; then the
//! command goes to the request socket with a single trailing newline, and
//! the reply is read from the response socket until EOF.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::{Instant, timeout, timeout_at};
use vhctl_config::SocketConfig;

use crate::BoxFuture;
use crate::command::Command;
use crate::error::{Stage, TransportError};

use super::{RawReply, Transport};

/// Talks to a running daemon over its request/response socket pair.
///
/// Every call opens its own pair, so concurrent calls are independent at
/// the OS level. Their relative ordering is up to the daemon.
#[derive(Debug, Clone)]
pub struct UnixSocketTransport {
    request_path: PathBuf,
    response_path: PathBuf,
    connect_timeout: Duration,
    write_timeout: Duration,
    read_timeout: Duration,
}

impl UnixSocketTransport {
    /// Socket pair with the default 2s connect, 2s write and 5s read deadlines.
    pub fn new(request_path: impl Into<PathBuf>, response_path: impl Into<PathBuf>) -> Self {
        Self::from_config(&SocketConfig {
            request_path: request_path.into(),
            response_path: response_path.into(),
            ..SocketConfig::default()
        })
    }

    pub fn from_config(config: &SocketConfig) -> Self {
        Self {
            request_path: config.request_path.clone(),
            response_path: config.response_path.clone(),
            connect_timeout: config.connect_timeout(),
            write_timeout: config.write_timeout(),
            read_timeout: config.read_timeout(),
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    async fn exchange(&self, command: &Command) -> Result<String, TransportError> {
        let mut response = connect(&self.response_path, self.connect_timeout).await?;
        let mut request = connect(&self.request_path, self.connect_timeout).await?;
        let write_deadline = Instant::now() + self.write_timeout;

        timeout_at(write_deadline, async {
            request.write_all(&command.framed()).await?;
            request.flush().await
        })
        .await
        .map_err(|_| TransportError::Timeout {
            stage: Stage::Write,
            after: self.write_timeout,
        })??;

        let mut buf = Vec::new();
        timeout(self.read_timeout, response.read_to_end(&mut buf))
            .await
            .map_err(|_| TransportError::Timeout {
                stage: Stage::Read,
                after: self.read_timeout,
            })??;

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

async fn connect(path: &Path, limit: Duration) -> Result<UnixStream, TransportError> {
    timeout(limit, UnixStream::connect(path))
        .await
        .map_err(|_| TransportError::Timeout {
            stage: Stage::Connect,
            after: limit,
        })?
        .map_err(|e| TransportError::Connect {
            endpoint: path.display().to_string(),
            source: e,
        })
}

impl Transport for UnixSocketTransport {
    fn name(&self) -> &str {
        "unix-socket"
    }

    fn send<'a>(
        &'a self,
        command: &'a Command,
    ) -> BoxFuture<'a, Result<RawReply, TransportError>> {
        Box::pin(async move {
            tracing::trace!(
                request = %self.request_path.display(),
                verb = command.verb(),
                "Writing to request socket"
            );
            self.exchange(command).await.map(RawReply::Text)
        })
    }
}
