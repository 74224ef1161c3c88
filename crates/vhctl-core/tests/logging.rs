//! Secrets in command arguments never reach the logs.

use std::sync::Arc;

use vhctl_core::{Client, Transport};
use vhctl_test_utils::config::TestConfigBuilder;
use vhctl_test_utils::tracing_setup::LogCapture;
use vhctl_test_utils::transport::ScriptedTransport;

#[tokio::test]
async fn test_passwords_and_keys_are_not_logged() {
    let dir = tempfile::TempDir::new().unwrap();
    let binary = dir.path().join("vhclient");
    std::fs::write(&binary, "").unwrap();
    let config = TestConfigBuilder::new().binary_path(&binary).build();

    let transport = Arc::new(ScriptedTransport::new().reply("OK").reply("FAILED"));
    let client = Client::with_transport(config, Arc::clone(&transport) as Arc<dyn Transport>)
        .await
        .unwrap();

    let logs = LogCapture::new();
    let _guard = logs.install();

    client.use_device("h.1", Some("hunter2")).await.unwrap();
    let _ = client.license_server("LIC-SECRET-42").await;

    assert_eq!(
        transport.sent(),
        vec!["USE,h.1,hunter2", "LICENSE SERVER,LIC-SECRET-42"]
    );
    let contents = logs.contents();
    assert!(contents.contains("USE"), "{contents}");
    assert!(contents.contains("LICENSE SERVER"), "{contents}");
    assert!(!contents.contains("hunter2"), "{contents}");
    assert!(!contents.contains("LIC-SECRET-42"), "{contents}");
}
