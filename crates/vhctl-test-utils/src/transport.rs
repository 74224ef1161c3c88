//! In-memory transport.

use std::collections::VecDeque;
use std::sync::Mutex;

use vhctl_core::{BoxFuture, Command, RawReply, Transport, TransportError};

/// A [`Transport`] that answers from a queue of scripted replies and
/// records every command line it is asked to send.
///
/// Once the queue is empty every command is answered with `OK`.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<RawReply, TransportError>>>,
    sent: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a text reply, as a socket or pipe would return it.
    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(RawReply::Text(text.to_string())));
        self
    }

    /// Queue a subprocess-style exit.
    pub fn exit(self, code: i32, output: &str) -> Self {
        self.push(Ok(RawReply::Exit {
            code: Some(code),
            output: output.to_string(),
        }));
        self
    }

    /// Queue a transport failure.
    pub fn fail(self, error: TransportError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, reply: Result<RawReply, TransportError>) {
        self.replies
            .lock()
            .expect("replies lock poisoned")
            .push_back(reply);
    }

    /// Command lines sent so far, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("sent lock poisoned").clone()
    }
}

impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    fn send<'a>(&'a self, command: &'a Command) -> BoxFuture<'a, Result<RawReply, TransportError>> {
        self.sent
            .lock()
            .expect("sent lock poisoned")
            .push(command.as_str().to_string());
        let reply = self
            .replies
            .lock()
            .expect("replies lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(RawReply::Text("OK".to_string())));
        Box::pin(async move { reply })
    }
}
