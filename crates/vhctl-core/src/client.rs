//! The command facade.
//!
//! [`Client`] maps each daemon operation onto a command line, sends it
//! through the configured transport, classifies the reply, and parses the
//! structured ones. Mutating operations return `()`; nothing returns a
//! partial result on failure.
//!
//! ```no_run
//! # async fn demo() -> Result<(), vhctl_core::ClientError> {
//! let config = vhctl_config::AppConfig::default();
//! let client = vhctl_core::Client::new(config).await?;
//! for hub in client.list().await?.hubs {
//!     println!("{} ({})", hub.name, hub.address);
//! }
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use vhctl_config::AppConfig;

use crate::classify::{CommandResult, classify};
use crate::command::Command;
use crate::error::ClientError;
use crate::parser;
use crate::service::{ServiceSupervisor, TerminationCallback};
use crate::transport::{Transport, select_transport};
use crate::types::{ClientState, DeviceInfo, ReverseClient, ServerInfo, XmlClientState};

/// `MANUAL HUB LIST` prefixes its entries with a header line.
const MANUAL_HUB_HEADER: &str = "Manual";

/// Send one command and classify the reply.
pub(crate) async fn execute(
    transport: &dyn Transport,
    command: &Command,
) -> Result<CommandResult, ClientError> {
    debug!(verb = command.verb(), transport = transport.name(), "Sending command");
    let reply = transport.send(command).await?;
    let result = classify(reply)?;
    if let Some(error) = &result.error {
        debug!(verb = command.verb(), ?error, "Command rejected");
    }
    Ok(result)
}

/// Check the daemon binary exists, making it executable if needed.
async fn validate_binary(path: &Path) -> Result<(), ClientError> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        ClientError::Config(format!("daemon binary {}: {e}", path.display()))
    })?;
    if !metadata.is_file() {
        return Err(ClientError::Config(format!(
            "daemon binary {} is not a file",
            path.display()
        )));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if metadata.permissions().mode() & 0o111 == 0 {
            debug!(binary = %path.display(), "Marking daemon binary executable");
            tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
                .await
                .map_err(|e| {
                    ClientError::Config(format!(
                        "daemon binary {} is not executable: {e}",
                        path.display()
                    ))
                })?;
        }
    }

    Ok(())
}

// ── Construction ────────────────────────────────────────────────────────

/// Configures and builds a [`Client`].
pub struct ClientBuilder {
    config: AppConfig,
    transport: Option<Arc<dyn Transport>>,
    on_terminated: Option<TerminationCallback>,
}

impl ClientBuilder {
    /// Use `transport` instead of the one the configuration selects.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Called once if the managed service exits without `close`.
    pub fn on_terminated(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_terminated = Some(Arc::new(callback));
        self
    }

    /// Validate the configuration and binary, pick the transport, and
    /// start the service when `run_as_service` is set.
    pub async fn build(self) -> Result<Client, ClientError> {
        self.config.validate()?;
        let binary = self.config.client.binary_path.clone();
        validate_binary(&binary).await?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => select_transport(&self.config)?,
        };

        let mut service = ServiceSupervisor::new(
            binary.clone(),
            Arc::clone(&transport),
            self.config.client.exit_grace(),
        );
        if let Some(callback) = self.on_terminated {
            service = service.with_termination_callback(callback);
        }

        let client = Client {
            binary,
            transport,
            service,
        };
        if self.config.client.run_as_service {
            client.start_service().await?;
        }
        Ok(client)
    }
}

/// Handle to the VirtualHere client daemon.
pub struct Client {
    binary: PathBuf,
    transport: Arc<dyn Transport>,
    service: ServiceSupervisor,
}

impl Client {
    pub fn builder(config: AppConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            transport: None,
            on_terminated: None,
        }
    }

    /// Build a client from configuration alone.
    pub async fn new(config: AppConfig) -> Result<Self, ClientError> {
        Self::builder(config).build().await
    }

    /// Build a client that talks through `transport`.
    pub async fn with_transport(
        config: AppConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ClientError> {
        Self::builder(config).transport(transport).build().await
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    // ── Service ─────────────────────────────────────────────────────────

    /// Launch the daemon as a managed background process.
    pub async fn start_service(&self) -> Result<(), ClientError> {
        self.service.start().await
    }

    pub async fn is_service_running(&self) -> bool {
        self.service.is_running().await
    }

    pub async fn service_pid(&self) -> Option<u32> {
        self.service.pid().await
    }

    /// Stop the managed service, if any. Safe to call more than once.
    pub async fn close(&self) -> Result<(), ClientError> {
        self.service.stop().await
    }

    // ── Plumbing ────────────────────────────────────────────────────────

    async fn run(&self, command: Command) -> Result<String, ClientError> {
        execute(self.transport.as_ref(), &command).await?.into_output()
    }

    async fn run_verb(&self, verb: &str) -> Result<(), ClientError> {
        self.run(Command::new(verb)?).await.map(drop)
    }

    async fn run_args(&self, verb: &str, args: &[&str]) -> Result<(), ClientError> {
        self.run(Command::with_args(verb, args)?).await.map(drop)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Hubs, devices, and feature flags from `LIST`.
    pub async fn list(&self) -> Result<ClientState, ClientError> {
        let output = self.run(Command::new("LIST")?).await?;
        Ok(parser::parse_list(&output))
    }

    /// Full attribute dump from `GET CLIENT STATE`.
    pub async fn client_state(&self) -> Result<XmlClientState, ClientError> {
        let output = self.run(Command::new("GET CLIENT STATE")?).await?;
        parser::parse_client_state(&output)
    }

    pub async fn device_info(&self, address: &str) -> Result<DeviceInfo, ClientError> {
        let output = self.run(Command::with_args("DEVICE INFO", &[address])?).await?;
        Ok(parser::parse_device_info(&output))
    }

    pub async fn server_info(&self, name: &str) -> Result<ServerInfo, ClientError> {
        let output = self.run(Command::with_args("SERVER INFO", &[name])?).await?;
        Ok(parser::parse_server_info(&output))
    }

    /// Hubs added by hand, without the header line.
    pub async fn manual_hub_list(&self) -> Result<Vec<String>, ClientError> {
        let output = self.run(Command::new("MANUAL HUB LIST")?).await?;
        Ok(parser::parse_lines(&output, Some(MANUAL_HUB_HEADER)))
    }

    /// Reverse clients registered on the server with serial `server_serial`.
    pub async fn list_reverse(&self, server_serial: &str) -> Result<Vec<ReverseClient>, ClientError> {
        let output = self
            .run(Command::with_args("LIST REVERSE", &[server_serial])?)
            .await?;
        Ok(parser::parse_lines(&output, None)
            .into_iter()
            .map(|client_address| ReverseClient {
                server_serial: server_serial.to_string(),
                client_address,
            })
            .collect())
    }

    pub async fn list_licenses(&self) -> Result<Vec<String>, ClientError> {
        let output = self.run(Command::new("LIST LICENSES")?).await?;
        Ok(parser::parse_lines(&output, None))
    }

    /// The daemon's command reference.
    pub async fn help(&self) -> Result<String, ClientError> {
        self.run(Command::new("HELP")?).await
    }

    // ── Device use ──────────────────────────────────────────────────────

    /// Attach a device, with its password if it has one.
    pub async fn use_device(&self, address: &str, password: Option<&str>) -> Result<(), ClientError> {
        match password {
            Some(password) => self.run_args("USE", &[address, password]).await,
            None => self.run_args("USE", &[address]).await,
        }
    }

    pub async fn stop_using(&self, address: &str) -> Result<(), ClientError> {
        self.run_args("STOP USING", &[address]).await
    }

    /// Release every device in use, or only those on `server`.
    pub async fn stop_using_all(&self, server: Option<&str>) -> Result<(), ClientError> {
        match server {
            Some(server) => self.run_args("STOP USING ALL", &[server]).await,
            None => self.run_verb("STOP USING ALL").await,
        }
    }

    /// Release devices used by this machine only.
    pub async fn stop_using_all_local(&self) -> Result<(), ClientError> {
        self.run_verb("STOP USING ALL LOCAL").await
    }

    // ── Naming ──────────────────────────────────────────────────────────

    pub async fn device_rename(&self, address: &str, nickname: &str) -> Result<(), ClientError> {
        self.run_args("DEVICE RENAME", &[address, nickname]).await
    }

    pub async fn server_rename(&self, hub: &str, name: &str) -> Result<(), ClientError> {
        self.run_args("SERVER RENAME", &[hub, name]).await
    }

    // ── Auto-use ────────────────────────────────────────────────────────

    pub async fn auto_use_all(&self) -> Result<(), ClientError> {
        self.run_verb("AUTO USE ALL").await
    }

    pub async fn auto_use_hub(&self, name: &str) -> Result<(), ClientError> {
        self.run_args("AUTO USE HUB", &[name]).await
    }

    pub async fn auto_use_port(&self, address: &str) -> Result<(), ClientError> {
        self.run_args("AUTO USE PORT", &[address]).await
    }

    pub async fn auto_use_device(&self, address: &str) -> Result<(), ClientError> {
        self.run_args("AUTO USE DEVICE", &[address]).await
    }

    pub async fn auto_use_device_port(&self, address: &str) -> Result<(), ClientError> {
        self.run_args("AUTO USE DEVICE PORT", &[address]).await
    }

    pub async fn auto_use_clear_all(&self) -> Result<(), ClientError> {
        self.run_verb("AUTO USE CLEAR ALL").await
    }

    // ── Manual hubs ─────────────────────────────────────────────────────

    /// Add a hub by `host:port` for servers outside auto-discovery.
    pub async fn manual_hub_add(&self, address: &str) -> Result<(), ClientError> {
        self.run_args("MANUAL HUB ADD", &[address]).await
    }

    pub async fn manual_hub_remove(&self, address: &str) -> Result<(), ClientError> {
        self.run_args("MANUAL HUB REMOVE", &[address]).await
    }

    pub async fn manual_hub_remove_all(&self) -> Result<(), ClientError> {
        self.run_verb("MANUAL HUB REMOVE ALL").await
    }

    // ── Reverse clients ─────────────────────────────────────────────────

    pub async fn add_reverse(&self, server_serial: &str, client_address: &str) -> Result<(), ClientError> {
        self.run_args("ADD REVERSE", &[server_serial, client_address]).await
    }

    pub async fn remove_reverse(
        &self,
        server_serial: &str,
        client_address: &str,
    ) -> Result<(), ClientError> {
        self.run_args("REMOVE REVERSE", &[server_serial, client_address])
            .await
    }

    // ── Licensing & misc ────────────────────────────────────────────────

    pub async fn license_server(&self, license_key: &str) -> Result<(), ClientError> {
        self.run_args("LICENSE SERVER", &[license_key]).await
    }

    pub async fn clear_log(&self) -> Result<(), ClientError> {
        self.run_verb("CLEAR LOG").await
    }

    pub async fn custom_event(&self, address: &str, event: &str) -> Result<(), ClientError> {
        self.run_args("CUSTOM EVENT", &[address, event]).await
    }

    /// Toggle auto-find of hubs on the local network.
    pub async fn auto_find(&self) -> Result<(), ClientError> {
        self.run_verb("AUTOFIND").await
    }

    /// Toggle reverse lookup of hub hostnames.
    pub async fn reverse(&self) -> Result<(), ClientError> {
        self.run_verb("REVERSE").await
    }

    /// Toggle SSL for reverse connections.
    pub async fn ssl_reverse(&self) -> Result<(), ClientError> {
        self.run_verb("SSLREVERSE").await
    }

    /// Ask the daemon to shut down. This does not touch a managed service
    /// handle; use [`close`](Self::close) for that.
    pub async fn exit(&self) -> Result<(), ClientError> {
        self.run_verb("EXIT").await
    }
}
