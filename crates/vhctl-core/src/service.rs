//! Managed daemon process.
//!
//! [`ServiceSupervisor`] launches the daemon binary as a long-lived
//! background process, watches it for external termination, and tears it
//! down on request.
//!
//! ```text
//!  Stopped ──start──▶ Running ──stop──▶ Stopping ──▶ Stopped
//!                        │
//!                        └── process exits on its own ──▶ Stopped
//!                            (termination callback fires once)
//! ```
//!
//! A single async mutex serializes `start`, `stop` and the monitor's
//! handle-clearing step, so `stop` can never kill a process the monitor is
//! concurrently reporting as gone.
//!
//! Dropping the supervisor without `stop` kills the managed process
//! outright; no `EXIT` is sent and the termination callback does not fire.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::execute;
use crate::command::Command;
use crate::error::{ClientError, TransportError};
use crate::transport::Transport;

/// Invoked once when the managed process exits without `stop` being called.
pub type TerminationCallback = Arc<dyn Fn() + Send + Sync>;

/// Arguments that keep the daemon running in the background. The Linux
/// console client needs `-n`; the Windows and macOS clients background
/// themselves.
fn service_args() -> &'static [&'static str] {
    if cfg!(target_os = "linux") { &["-n"] } else { &[] }
}

struct ServiceHandle {
    pid: Option<u32>,
    cancel: CancellationToken,
    monitor: JoinHandle<MonitorExit>,
}

enum MonitorExit {
    /// `stop` or drop cancelled the watch; the process is handed back still
    /// running. A dropped supervisor never collects it, so `kill_on_drop`
    /// ends it.
    Cancelled(Child),
    /// The process exited on its own.
    Exited,
}

type Slot = Arc<Mutex<Option<ServiceHandle>>>;
type WeakSlot = Weak<Mutex<Option<ServiceHandle>>>;

/// Owns at most one daemon process at a time.
pub struct ServiceSupervisor {
    binary: PathBuf,
    transport: Arc<dyn Transport>,
    exit_grace: Duration,
    on_terminated: Option<TerminationCallback>,
    slot: Slot,
    /// Parent of every monitor's token; cancelled on drop.
    shutdown: CancellationToken,
}

impl ServiceSupervisor {
    /// `transport` carries the graceful `EXIT` during [`stop`](Self::stop).
    pub fn new(
        binary: impl Into<PathBuf>,
        transport: Arc<dyn Transport>,
        exit_grace: Duration,
    ) -> Self {
        Self {
            binary: binary.into(),
            transport,
            exit_grace,
            on_terminated: None,
            slot: Arc::new(Mutex::new(None)),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_termination_callback(mut self, callback: TerminationCallback) -> Self {
        self.on_terminated = Some(callback);
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Whether a managed process is currently held.
    pub async fn is_running(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// OS process id of the managed daemon, if running.
    pub async fn pid(&self) -> Option<u32> {
        self.slot.lock().await.as_ref().and_then(|h| h.pid)
    }

    /// Launch the daemon and start watching it.
    ///
    /// Fails with a configuration error if a process is already managed.
    pub async fn start(&self) -> Result<(), ClientError> {
        let mut slot = self.slot.lock().await;
        if slot.is_some() {
            return Err(ClientError::Config(
                "service is already running".to_string(),
            ));
        }

        let child = tokio::process::Command::new(&self.binary)
            .args(service_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TransportError::Spawn {
                path: self.binary.clone(),
                source: e,
            })?;

        let pid = child.id();
        let cancel = self.shutdown.child_token();
        let monitor = tokio::spawn(monitor(
            child,
            cancel.clone(),
            Arc::downgrade(&self.slot),
            self.on_terminated.clone(),
        ));

        *slot = Some(ServiceHandle {
            pid,
            cancel,
            monitor,
        });
        info!(binary = %self.binary.display(), pid, "Service started");
        Ok(())
    }

    /// Shut the managed daemon down. A no-op when nothing is running.
    ///
    /// Asks the daemon to `EXIT` through the configured transport and kills
    /// it if that fails or it is still alive after the grace period. When
    /// this returns the process has exited and the monitor has finished.
    pub async fn stop(&self) -> Result<(), ClientError> {
        let mut slot = self.slot.lock().await;
        let Some(handle) = slot.take() else {
            return Ok(());
        };

        handle.cancel.cancel();
        let mut child = match handle.monitor.await {
            Ok(MonitorExit::Cancelled(child)) => child,
            Ok(MonitorExit::Exited) => {
                info!(pid = handle.pid, "Service had already exited");
                return Ok(());
            }
            Err(e) => {
                // The child was owned by the task and is killed on drop.
                warn!(error = %e, "Service monitor task failed");
                return Ok(());
            }
        };

        match self.request_exit().await {
            Ok(()) => match tokio::time::timeout(self.exit_grace, child.wait()).await {
                Ok(status) => {
                    let status = status.map_err(TransportError::Io)?;
                    info!(pid = handle.pid, %status, "Service stopped");
                    return Ok(());
                }
                Err(_) => warn!(
                    pid = handle.pid,
                    grace = ?self.exit_grace,
                    "Service ignored EXIT, killing"
                ),
            },
            Err(e) => warn!(pid = handle.pid, error = %e, "EXIT failed, killing service"),
        }

        child.kill().await.map_err(TransportError::Io)?;
        info!(pid = handle.pid, "Service killed");
        Ok(())
    }

    async fn request_exit(&self) -> Result<(), ClientError> {
        let cmd = Command::new("EXIT")?;
        execute(self.transport.as_ref(), &cmd).await?.into_output()?;
        Ok(())
    }
}

impl Drop for ServiceSupervisor {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Race the process exit against cancellation from `stop` or drop.
async fn monitor(
    mut child: Child,
    cancel: CancellationToken,
    slot: WeakSlot,
    on_terminated: Option<TerminationCallback>,
) -> MonitorExit {
    let status = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        status = child.wait() => Some(status),
    };
    let Some(status) = status else {
        return MonitorExit::Cancelled(child);
    };

    // The supervisor is gone, so nobody is left to notify.
    let Some(slot) = slot.upgrade() else {
        return MonitorExit::Exited;
    };

    // If `stop` already holds the lock it owns teardown; it cancels before
    // joining us, so yield to it instead of waiting on the lock forever.
    tokio::select! {
        biased;
        _ = cancel.cancelled() => return MonitorExit::Exited,
        mut guard = slot.lock() => {
            guard.take();
        }
    }

    match status {
        Ok(status) => warn!(%status, "Service process terminated externally"),
        Err(e) => warn!(error = %e, "Lost track of service process"),
    }
    if let Some(callback) = on_terminated {
        callback();
    }
    MonitorExit::Exited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoxFuture;
    use crate::transport::RawReply;

    struct Unreachable;

    impl Transport for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }

        fn send<'a>(
            &'a self,
            _command: &'a Command,
        ) -> BoxFuture<'a, Result<RawReply, TransportError>> {
            Box::pin(async { Err(TransportError::Io(std::io::Error::other("unreachable"))) })
        }
    }

    fn supervisor(binary: &str) -> ServiceSupervisor {
        ServiceSupervisor::new(binary, Arc::new(Unreachable), Duration::from_millis(100))
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let service = supervisor("/nonexistent/vhclient");
        service.stop().await.unwrap();
        service.stop().await.unwrap();
        assert!(!service.is_running().await);
        assert_eq!(service.pid().await, None);
    }

    #[tokio::test]
    async fn test_start_missing_binary_leaves_no_handle() {
        let service = supervisor("/nonexistent/vhclient");
        let result = service.start().await;
        assert!(matches!(
            result,
            Err(ClientError::Transport(TransportError::Spawn { .. }))
        ));
        assert!(!service.is_running().await);
    }

    #[test]
    fn test_service_args_per_platform() {
        if cfg!(target_os = "linux") {
            assert_eq!(service_args(), &["-n"]);
        } else {
            assert!(service_args().is_empty());
        }
    }
}
