//! Windows named pipe transport.
//!
//! The daemon serves a single message-mode pipe. The client opens it in
//! message read mode, writes the command with a trailing newline (no NUL
//! terminator) and reads until the daemon closes its end. Reads are not
//! assumed to return a whole message in one call. While another client
//! holds the pipe, opening fails with `ERROR_PIPE_BUSY` and is retried.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::windows::named_pipe::{ClientOptions, NamedPipeClient, PipeMode};
use tokio::time::{Instant, timeout};
use vhctl_config::PipeConfig;

use crate::BoxFuture;
use crate::command::Command;
use crate::error::{Stage, TransportError};

use super::{RawReply, Transport};

const ERROR_PIPE_BUSY: i32 = 231;

/// Talks to a running daemon over its named pipe.
#[derive(Debug, Clone)]
pub struct NamedPipeTransport {
    name: String,
    connect_timeout: Duration,
    busy_wait: Duration,
    exchange_timeout: Duration,
}

impl NamedPipeTransport {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_config(&PipeConfig {
            name: name.into(),
            ..PipeConfig::default()
        })
    }

    pub fn from_config(config: &PipeConfig) -> Self {
        Self {
            name: config.name.clone(),
            connect_timeout: config.connect_timeout(),
            busy_wait: config.busy_wait(),
            exchange_timeout: config.exchange_timeout(),
        }
    }

    async fn open(&self) -> Result<NamedPipeClient, TransportError> {
        let deadline = Instant::now() + self.connect_timeout;
        loop {
            match ClientOptions::new()
                .pipe_mode(PipeMode::Message)
                .open(&self.name)
            {
                Ok(client) => return Ok(client),
                Err(e) if e.raw_os_error() == Some(ERROR_PIPE_BUSY) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(TransportError::Timeout {
                            stage: Stage::Connect,
                            after: self.connect_timeout,
                        });
                    }
                    let wait = self.busy_wait.min(deadline - now);
                    tracing::debug!(pipe = %self.name, ?wait, "Pipe busy, retrying");
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    return Err(TransportError::Connect {
                        endpoint: self.name.clone(),
                        source: e,
                    });
                }
            }
        }
    }

    async fn exchange(
        &self,
        mut pipe: NamedPipeClient,
        command: &Command,
    ) -> Result<String, TransportError> {
        pipe.write_all(&command.framed()).await?;

        // The daemon closes its end after replying; a broken pipe reads as EOF.
        let mut message = Vec::new();
        pipe.read_to_end(&mut message).await?;

        Ok(String::from_utf8_lossy(&message).into_owned())
    }
}

impl Transport for NamedPipeTransport {
    fn name(&self) -> &str {
        "named-pipe"
    }

    fn send<'a>(
        &'a self,
        command: &'a Command,
    ) -> BoxFuture<'a, Result<RawReply, TransportError>> {
        Box::pin(async move {
            tracing::trace!(
                pipe = %self.name,
                verb = command.verb(),
                "Writing to pipe"
            );

            let pipe = self.open().await?;
            timeout(self.exchange_timeout, self.exchange(pipe, command))
                .await
                .map_err(|_| TransportError::Timeout {
                    stage: Stage::Read,
                    after: self.exchange_timeout,
                })?
                .map(RawReply::Text)
        })
    }
}
