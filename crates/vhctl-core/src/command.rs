//! Command lines sent to the daemon.
//!
//! A command is a verb followed by comma-separated positional arguments,
//! e.g. `USE,raspberrypi.114,secret`. The daemon frames commands with a
//! single trailing newline, so a command must never contain one itself.
//!
//! Arguments may carry device passwords or license keys. The line is wiped
//! on drop and [`Debug`](std::fmt::Debug) only ever shows the verb.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::ClientError;

/// A single command line, without its trailing newline.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Command {
    line: String,
    verb_len: usize,
}

impl Command {
    /// A command with no arguments.
    pub fn new(verb: &str) -> Result<Self, ClientError> {
        check_line(verb)?;
        Ok(Self {
            line: verb.to_string(),
            verb_len: verb.len(),
        })
    }

    /// A command with positional arguments, joined by commas.
    pub fn with_args(verb: &str, args: &[&str]) -> Result<Self, ClientError> {
        let mut cmd = Self::new(verb)?;
        for arg in args {
            check_line(arg)?;
            cmd.line.push(',');
            cmd.line.push_str(arg);
        }
        Ok(cmd)
    }

    /// The verb, e.g. `STOP USING`.
    pub fn verb(&self) -> &str {
        &self.line[..self.verb_len]
    }

    /// The full command line.
    pub fn as_str(&self) -> &str {
        &self.line
    }

    /// The bytes written to a socket or pipe: the line plus `\n`.
    pub fn framed(&self) -> Zeroizing<Vec<u8>> {
        let mut buf = Zeroizing::new(Vec::with_capacity(self.line.len() + 1));
        buf.extend_from_slice(self.line.as_bytes());
        buf.push(b'\n');
        buf
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("verb", &self.verb())
            .finish_non_exhaustive()
    }
}

fn check_line(part: &str) -> Result<(), ClientError> {
    if part.contains(['\n', '\r']) {
        return Err(ClientError::Config(
            "command must not contain line breaks".to_string(),
        ));
    }
    Ok(())
}
