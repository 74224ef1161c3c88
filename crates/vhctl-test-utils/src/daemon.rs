//! Daemon stand-ins.
//!
//! [`FakeSocketDaemon`] speaks the request/response socket protocol from
//! inside the test process. [`StubBinary`] is a shell script that takes the
//! place of the daemon executable for the subprocess transport and service
//! supervision. Both are Unix-only and clean up their temp directory on drop.

#![cfg(unix)]

use std::collections::VecDeque;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::task::JoinHandle;
use vhctl_config::SocketConfig;

// ── Socket daemon ───────────────────────────────────────────────────────

/// How the fake daemon answers one command.
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// Write the text to the response socket and close it.
    Text(String),
    /// Accept the command but never answer, to exercise read deadlines.
    Silent,
}

impl From<&str> for FakeReply {
    fn from(text: &str) -> Self {
        FakeReply::Text(text.to_string())
    }
}

/// Listens on a request/response socket pair in a temp directory and
/// answers one scripted reply per command, then `OK` once the script ends.
pub struct FakeSocketDaemon {
    request_path: PathBuf,
    response_path: PathBuf,
    received: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
    _temp_dir: TempDir,
}

impl FakeSocketDaemon {
    /// Bind both sockets and start serving. Must be called inside a Tokio
    /// runtime.
    pub fn start<I, R>(replies: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<FakeReply>,
    {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let request_path = temp_dir.path().join("vhclient");
        let response_path = temp_dir.path().join("vhclient_response");
        let requests = UnixListener::bind(&request_path).expect("failed to bind request socket");
        let responses =
            UnixListener::bind(&response_path).expect("failed to bind response socket");

        let script: VecDeque<FakeReply> = replies.into_iter().map(Into::into).collect();
        let received = Arc::new(Mutex::new(Vec::new()));
        let task = tokio::spawn(serve(requests, responses, script, Arc::clone(&received)));

        Self {
            request_path,
            response_path,
            received,
            task,
            _temp_dir: temp_dir,
        }
    }

    /// Socket settings pointing at this daemon, with default deadlines.
    pub fn socket_config(&self) -> SocketConfig {
        SocketConfig {
            request_path: self.request_path.clone(),
            response_path: self.response_path.clone(),
            ..SocketConfig::default()
        }
    }

    /// Command lines received so far, without their newline.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().expect("received lock poisoned").clone()
    }
}

impl Drop for FakeSocketDaemon {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    requests: UnixListener,
    responses: UnixListener,
    mut script: VecDeque<FakeReply>,
    received: Arc<Mutex<Vec<String>>>,
) {
    loop {
        // Clients open the response socket first.
        let Ok((mut response, _)) = responses.accept().await else {
            return;
        };
        let Ok((request, _)) = requests.accept().await else {
            return;
        };

        let mut line = String::new();
        if BufReader::new(request).read_line(&mut line).await.is_err() {
            continue;
        }
        received
            .lock()
            .expect("received lock poisoned")
            .push(line.trim_end_matches('\n').to_string());

        match script.pop_front().unwrap_or_else(|| "OK".into()) {
            FakeReply::Text(text) => {
                let _ = response.write_all(text.as_bytes()).await;
                let _ = response.shutdown().await;
            }
            FakeReply::Silent => {
                // Hold the connection until the client gives up.
                let mut sink = Vec::new();
                let _ = response.read_to_end(&mut sink).await;
            }
        }
    }
}

// ── Stub binary ─────────────────────────────────────────────────────────

/// An executable `/bin/sh` script standing in for the daemon binary.
pub struct StubBinary {
    path: PathBuf,
    _temp_dir: TempDir,
}

impl StubBinary {
    /// Write `body` after a `#!/bin/sh` line and mark it executable.
    pub fn new(body: &str) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().join("vhclient");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("failed to write stub");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("failed to chmod stub");
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Answers `-t <command>` with `output` and exit `code`.
    pub fn replying(code: i32, output: &str) -> Self {
        Self::new(&format!("printf '%s' '{output}'\nexit {code}"))
    }

    /// Runs until killed, ignoring its arguments.
    pub fn long_running() -> Self {
        Self::new("exec sleep 30")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
