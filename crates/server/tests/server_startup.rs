use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config
fn minimal_config(port: u16) -> String {
    format!(
        r#"
[download]
api_url = "https://api.example.com/pictures"
browser_path = "/usr/bin/chromium"

[server]
host = "127.0.0.1"
port = {}
"#,
        port
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_picgrab"))
        .env("PICGRAB_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

async fn exits_with_error(config_path: &std::path::Path) -> bool {
    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_picgrab"))
            .env("PICGRAB_CONFIG", config_path)
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    !result.status.success()
}

#[tokio::test]
async fn test_health_and_config_endpoints() {
    let port = get_available_port();
    let config_file = write_config(&minimal_config(port));

    let mut server = spawn_server(config_file.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let health: serde_json::Value = client
        .get(format!("http://127.0.0.1:{}/api/v1/health", port))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(health["status"], "ok");

    let config: serde_json::Value = client
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(config["server"]["port"], port);
    assert_eq!(config["download"]["page_size"], 20);

    let status = client
        .get(format!("http://127.0.0.1:{}/api/v1/runs/status", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(status.status().is_success());

    // Cleanup
    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    assert!(exits_with_error(std::path::Path::new("/nonexistent/config.toml")).await);
}

#[tokio::test]
async fn test_missing_download_section_exits_with_error() {
    let config_file = write_config(
        r#"
[server]
port = 8080
"#,
    );
    assert!(exits_with_error(config_file.path()).await);
}

#[tokio::test]
async fn test_invalid_run_defaults_exit_with_error() {
    let config_file = write_config(
        r#"
[download]
api_url = "not a url"
browser_path = "/usr/bin/chromium"
"#,
    );
    assert!(exits_with_error(config_file.path()).await);
}
