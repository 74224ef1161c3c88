#![deny(unsafe_code)]

//! Configuration loading and validation for vhctl.
//!
//! Loads TOML configuration files describing how to reach the VirtualHere
//! client daemon: which binary to drive, which transport to use, where its
//! sockets or pipe live, and how long to wait on each stage of an exchange.
//! [`AppConfig`] is the central configuration structure.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Daemon binary and transport selection.
    #[serde(default)]
    pub client: ClientConfig,

    /// Unix domain socket transport settings.
    #[serde(default)]
    pub socket: SocketConfig,

    /// Windows named pipe transport settings.
    #[serde(default)]
    pub pipe: PipeConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ── Client ──────────────────────────────────────────────────────────────

/// Which mechanism carries commands to the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    /// Named pipe on Windows, Unix socket pair everywhere else.
    #[default]
    Auto,
    /// One-shot `<binary> -t <command>` invocation.
    Subprocess,
    /// Request/response Unix domain socket pair.
    UnixSocket,
    /// Message-mode Windows named pipe.
    NamedPipe,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Auto => write!(f, "auto"),
            TransportKind::Subprocess => write!(f, "subprocess"),
            TransportKind::UnixSocket => write!(f, "unix-socket"),
            TransportKind::NamedPipe => write!(f, "named-pipe"),
        }
    }
}

/// Configuration for the daemon binary and how the client drives it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Path to the VirtualHere client binary (`vhclientx86_64`, `vhui64.exe`, ...).
    #[serde(default = "default_binary_path")]
    pub binary_path: PathBuf,

    /// Transport used to deliver commands.
    #[serde(default)]
    pub transport: TransportKind,

    /// Launch and supervise the daemon as a background process on startup.
    #[serde(default)]
    pub run_as_service: bool,

    /// How long `stop` waits for the daemon to honour `EXIT` before killing it.
    #[serde(default = "default_exit_grace_ms")]
    pub exit_grace_ms: u64,
}

impl ClientConfig {
    pub fn exit_grace(&self) -> Duration {
        Duration::from_millis(self.exit_grace_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            binary_path: default_binary_path(),
            transport: TransportKind::default(),
            run_as_service: false,
            exit_grace_ms: default_exit_grace_ms(),
        }
    }
}

fn default_binary_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("vhui64.exe")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Applications/VirtualHere.app/Contents/MacOS/VirtualHere")
    } else {
        PathBuf::from("/usr/local/bin/vhclientx86_64")
    }
}

fn default_exit_grace_ms() -> u64 {
    5_000
}

// ── Unix socket ─────────────────────────────────────────────────────────

/// Unix domain socket transport settings.
///
/// The daemon listens on two sockets: commands are written to
/// `request_path` and replies are read from `response_path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketConfig {
    #[serde(default = "default_request_path")]
    pub request_path: PathBuf,

    #[serde(default = "default_response_path")]
    pub response_path: PathBuf,

    /// Per-socket connect timeout.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Deadline for writing the command, counted from the request connect.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    /// Deadline for reading the full reply, counted from the start of the read.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl SocketConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            request_path: default_request_path(),
            response_path: default_response_path(),
            connect_timeout_ms: default_connect_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

fn default_request_path() -> PathBuf {
    PathBuf::from("/tmp/vhclient")
}

fn default_response_path() -> PathBuf {
    PathBuf::from("/tmp/vhclient_response")
}

fn default_connect_timeout_ms() -> u64 {
    2_000
}

fn default_write_timeout_ms() -> u64 {
    2_000
}

fn default_read_timeout_ms() -> u64 {
    5_000
}

// ── Named pipe ──────────────────────────────────────────────────────────

/// Windows named pipe transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipeConfig {
    #[serde(default = "default_pipe_name")]
    pub name: String,

    /// Overall deadline for opening the pipe, including busy retries.
    #[serde(default = "default_pipe_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Longest single wait between retries while the pipe reports busy.
    #[serde(default = "default_busy_wait_ms")]
    pub busy_wait_ms: u64,

    /// Deadline for the write + read exchange once connected.
    #[serde(default = "default_exchange_timeout_ms")]
    pub exchange_timeout_ms: u64,
}

impl PipeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn busy_wait(&self) -> Duration {
        Duration::from_millis(self.busy_wait_ms)
    }

    pub fn exchange_timeout(&self) -> Duration {
        Duration::from_millis(self.exchange_timeout_ms)
    }
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            name: default_pipe_name(),
            connect_timeout_ms: default_pipe_connect_timeout_ms(),
            busy_wait_ms: default_busy_wait_ms(),
            exchange_timeout_ms: default_exchange_timeout_ms(),
        }
    }
}

fn default_pipe_name() -> String {
    r"\\.\pipe\vhclient".to_string()
}

fn default_pipe_connect_timeout_ms() -> u64 {
    5_000
}

fn default_busy_wait_ms() -> u64 {
    2_000
}

fn default_exchange_timeout_ms() -> u64 {
    5_000
}

// ── Logging ─────────────────────────────────────────────────────────────

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Loading & validation ────────────────────────────────────────────────

impl AppConfig {
    /// Load and validate a config file.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading configuration");
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse and validate a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client.binary_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "client.binary_path must not be empty".to_string(),
            ));
        }
        if self.client.exit_grace_ms == 0 {
            return Err(ConfigError::Validation(
                "client.exit_grace_ms must be non-zero".to_string(),
            ));
        }

        if self.socket.request_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "socket.request_path must not be empty".to_string(),
            ));
        }
        if self.socket.response_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "socket.response_path must not be empty".to_string(),
            ));
        }
        if self.socket.request_path == self.socket.response_path {
            return Err(ConfigError::Validation(format!(
                "socket.request_path and socket.response_path must differ, both are {:?}",
                self.socket.request_path
            )));
        }
        for (name, value) in [
            ("socket.connect_timeout_ms", self.socket.connect_timeout_ms),
            ("socket.write_timeout_ms", self.socket.write_timeout_ms),
            ("socket.read_timeout_ms", self.socket.read_timeout_ms),
            ("pipe.connect_timeout_ms", self.pipe.connect_timeout_ms),
            ("pipe.busy_wait_ms", self.pipe.busy_wait_ms),
            ("pipe.exchange_timeout_ms", self.pipe.exchange_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{name} must be non-zero")));
            }
        }

        if self.pipe.name.is_empty() {
            return Err(ConfigError::Validation(
                "pipe.name must not be empty".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                valid_levels, self.logging.level
            )));
        }

        Ok(())
    }
}
