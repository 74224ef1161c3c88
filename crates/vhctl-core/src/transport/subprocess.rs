//! One-shot subprocess transport.
//!
//! Runs `<binary> -t <command>` and waits for it to exit. The exit code is
//! the primary outcome signal; stdout and stderr are captured together as
//! the reply text. There is no timeout: the call lasts as long as the
//! daemon binary takes to answer.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::BoxFuture;
use crate::command::Command;
use crate::error::TransportError;

use super::{RawReply, Transport};

/// Flag that makes the daemon binary forward one command to the running
/// instance and exit.
const TEXT_COMMAND_FLAG: &str = "-t";

/// Invokes the daemon binary once per command.
pub struct SubprocessTransport {
    binary: PathBuf,
}

impl SubprocessTransport {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Transport for SubprocessTransport {
    fn name(&self) -> &str {
        "subprocess"
    }

    fn send<'a>(
        &'a self,
        command: &'a Command,
    ) -> BoxFuture<'a, Result<RawReply, TransportError>> {
        Box::pin(async move {
            tracing::trace!(
                binary = %self.binary.display(),
                verb = command.verb(),
                "Invoking daemon binary"
            );

            let output = tokio::process::Command::new(&self.binary)
                .arg(TEXT_COMMAND_FLAG)
                .arg(command.as_str())
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .await
                .map_err(|e| TransportError::Spawn {
                    path: self.binary.clone(),
                    source: e,
                })?;

            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));

            Ok(RawReply::Exit {
                code: output.status.code(),
                output: text,
            })
        })
    }
}
