//! Reply classification.
//!
//! Socket and pipe replies are free text: `OK`, `FAILED`, `ERROR:<message>`,
//! or a data payload. The subprocess transport reports the same three
//! outcomes through its exit code instead.

use crate::error::{ClientError, TransportError};
use crate::transport::RawReply;

const ERROR_PREFIX: &str = "ERROR:";

/// What the daemon said about a command it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// `FAILED` or exit code 1. The daemon gives no further detail.
    Failed,
    /// `ERROR:<message>` or exit code 2.
    Protocol(String),
}

impl From<CommandError> for ClientError {
    fn from(e: CommandError) -> Self {
        match e {
            CommandError::Failed => ClientError::CommandFailed,
            CommandError::Protocol(message) => ClientError::Protocol(message),
        }
    }
}

/// Classified reply. `success` is true exactly when `error` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    /// Raw reply, trimmed. Kept for diagnostics even on failure.
    pub output: String,
    pub error: Option<CommandError>,
}

impl CommandResult {
    fn ok(output: String) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    fn err(output: String, error: CommandError) -> Self {
        Self {
            success: false,
            output,
            error: Some(error),
        }
    }

    /// The payload on success, the daemon's failure otherwise.
    pub fn into_output(self) -> Result<String, ClientError> {
        match self.error {
            None => Ok(self.output),
            Some(e) => Err(e.into()),
        }
    }
}

/// Classify a raw transport reply.
pub fn classify(reply: RawReply) -> Result<CommandResult, TransportError> {
    match reply {
        RawReply::Text(text) => Ok(classify_text(&text)),
        RawReply::Exit { code, output } => classify_exit(code, &output),
    }
}

/// Classify a free-text reply from a socket or pipe.
///
/// Unrecognised text is payload, not an error: most read commands answer
/// with data rather than a status word.
pub fn classify_text(reply: &str) -> CommandResult {
    let output = reply.trim().to_string();
    if output == "OK" {
        return CommandResult::ok(output);
    }
    if output == "FAILED" {
        return CommandResult::err(output, CommandError::Failed);
    }
    if let Some(rest) = output.strip_prefix(ERROR_PREFIX) {
        let message = rest.trim().to_string();
        return CommandResult::err(output, CommandError::Protocol(message));
    }
    CommandResult::ok(output)
}

/// Classify a subprocess exit. Codes other than 0, 1 and 2 (or death by
/// signal) are transport faults.
pub fn classify_exit(code: Option<i32>, output: &str) -> Result<CommandResult, TransportError> {
    let trimmed = output.trim().to_string();
    match code {
        Some(0) => Ok(CommandResult::ok(trimmed)),
        Some(1) => Ok(CommandResult::err(trimmed, CommandError::Failed)),
        Some(2) => {
            let message = error_message(&trimmed);
            Ok(CommandResult::err(trimmed, CommandError::Protocol(message)))
        }
        _ => Err(TransportError::UnexpectedExit {
            code,
            output: trimmed,
        }),
    }
}

fn error_message(output: &str) -> String {
    let message = match output.find(ERROR_PREFIX) {
        Some(idx) => output[idx + ERROR_PREFIX.len()..].trim(),
        None => output,
    };
    if message.is_empty() {
        "unknown error".to_string()
    } else {
        message.to_string()
    }
}
