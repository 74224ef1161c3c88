//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`AppConfig`] values without
//! repeating boilerplate across crate boundaries.

use std::path::Path;

use vhctl_config::{AppConfig, SocketConfig, TransportKind};

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .binary_path(stub.path())
///     .transport(TransportKind::Subprocess)
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn binary_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.client.binary_path = path.as_ref().to_path_buf();
        self
    }

    pub fn transport(mut self, kind: TransportKind) -> Self {
        self.config.client.transport = kind;
        self
    }

    pub fn run_as_service(mut self, enabled: bool) -> Self {
        self.config.client.run_as_service = enabled;
        self
    }

    pub fn exit_grace_ms(mut self, ms: u64) -> Self {
        self.config.client.exit_grace_ms = ms;
        self
    }

    /// Point the Unix socket transport at a fake daemon's sockets.
    pub fn socket(mut self, socket: SocketConfig) -> Self {
        self.config.socket = socket;
        self
    }

    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.socket.read_timeout_ms = ms;
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
