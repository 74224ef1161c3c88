//! Client operations against a scripted transport: exit-code replies and
//! configuration checks at build time.

use std::path::PathBuf;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use vhctl_core::{Client, ClientError, Transport, TransportError};
use vhctl_test_utils::config::TestConfigBuilder;
use vhctl_test_utils::tracing_setup::init_test_tracing;
use vhctl_test_utils::transport::ScriptedTransport;

fn fake_binary(dir: &TempDir) -> PathBuf {
    let binary = dir.path().join("vhclient");
    std::fs::write(&binary, "").unwrap();
    binary
}

async fn client_with(transport: &Arc<ScriptedTransport>) -> (TempDir, Client) {
    let dir = TempDir::new().unwrap();
    let config = TestConfigBuilder::new()
        .binary_path(fake_binary(&dir))
        .build();
    let client = Client::with_transport(config, Arc::clone(transport) as Arc<dyn Transport>)
        .await
        .unwrap();
    (dir, client)
}

// ── Exit-code replies ─────────────────────────────────────────────

#[tokio::test]
async fn test_exit_codes_map_to_outcomes() {
    init_test_tracing();
    let transport = Arc::new(
        ScriptedTransport::new()
            .exit(0, "VirtualHere Client help\n")
            .exit(1, "FAILED")
            .exit(2, "ERROR: no such device")
            .exit(7, "crashed"),
    );
    let (_dir, client) = client_with(&transport).await;

    assert_eq!(client.help().await.unwrap(), "VirtualHere Client help");
    assert!(matches!(
        client.use_device("h.1", None).await,
        Err(ClientError::CommandFailed)
    ));
    match client.stop_using("h.9").await {
        Err(ClientError::Protocol(msg)) => assert_eq!(msg, "no such device"),
        other => panic!("expected protocol error, got {other:?}"),
    }
    match client.clear_log().await {
        Err(ClientError::Transport(TransportError::UnexpectedExit { code, output })) => {
            assert_eq!(code, Some(7));
            assert_eq!(output, "crashed");
        }
        other => panic!("expected unexpected exit, got {other:?}"),
    }

    assert_eq!(
        transport.sent(),
        vec!["HELP", "USE,h.1", "STOP USING,h.9", "CLEAR LOG"]
    );
}

#[tokio::test]
async fn test_exit_zero_payload_is_parsed() {
    init_test_tracing();
    let transport = Arc::new(ScriptedTransport::new().exit(0, "Hub (h:7575)\n--> Cam (h.1)\n"));
    let (_dir, client) = client_with(&transport).await;

    let state = client.list().await.unwrap();
    assert_eq!(state.hubs.len(), 1);
    assert_eq!(state.hubs[0].address, "h:7575");
    assert_eq!(state.hubs[0].devices[0].address, "h.1");
}

// ── Build-time configuration ──────────────────────────────────────

#[tokio::test]
async fn test_valid_log_level_builds() {
    init_test_tracing();
    let dir = TempDir::new().unwrap();
    let config = TestConfigBuilder::new()
        .binary_path(fake_binary(&dir))
        .log_level("DEBUG")
        .build();
    assert!(
        Client::with_transport(config, Arc::new(ScriptedTransport::new()))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_unknown_log_level_is_config_error() {
    init_test_tracing();
    let dir = TempDir::new().unwrap();
    let config = TestConfigBuilder::new()
        .binary_path(fake_binary(&dir))
        .log_level("loud")
        .build();
    match Client::with_transport(config, Arc::new(ScriptedTransport::new())).await {
        Err(ClientError::Config(msg)) => assert!(msg.contains("logging.level"), "{msg}"),
        Err(other) => panic!("expected config error, got {other:?}"),
        Ok(_) => panic!("expected config error, got a client"),
    }
}
