use anyhow::Result;
use serde_json::{json, Value};
use std::{
    path::Path,
    process::Stdio,
    time::Duration,
};
use tokio::process::{Child, Command};

const BASE_PORT: u16 = 17000;
const PORT_RANGE: u32 = 8000;
const PORT_ATTEMPTS: u16 = 5;

/// Client for the binary's `serve` mode.
pub struct HttpClient {
    http_client: reqwest::Client,
    base_url: String,
    port: u16,
    /// Killed when the client is dropped.
    _process: Child,
}

impl HttpClient {
    /// Starts `binary serve` against `crm_url` and waits until it answers health checks.
    ///
    /// The port is derived from `crm_url` and the test process id. If the child
    /// exits before it is healthy (port taken), the next port is tried.
    pub async fn start(binary: impl AsRef<Path>, crm_url: &str, token: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let first_port = deterministic_port(&format!("{}:{}", std::process::id(), crm_url));

        for port in first_port..first_port + PORT_ATTEMPTS {
            let base_url = format!("http://127.0.0.1:{}", port);
            eprintln!("Starting HTTP server on port {}", port);
            let mut process = spawn_server(binary.as_ref(), crm_url, token, port)?;

            for _ in 0..50 {
                // Give a failed bind time to surface before trusting a health reply.
                tokio::time::sleep(Duration::from_millis(100)).await;
                if process.try_wait()?.is_some() {
                    eprintln!("Server on port {} exited early, trying next port", port);
                    break;
                }
                if let Ok(resp) = http_client
                    .get(format!("{}/api/v1/health", base_url))
                    .send()
                    .await
                {
                    if resp.status().is_success() {
                        return Ok(Self {
                            http_client,
                            base_url,
                            port,
                            _process: process,
                        });
                    }
                }
            }
        }

        Err(anyhow::anyhow!(
            "HTTP server did not become healthy on ports {}..{}",
            first_port,
            first_port + PORT_ATTEMPTS
        ))
    }

    pub async fn list_tools(&self) -> Result<Value> {
        let body: Value = self
            .http_client
            .get(format!("{}/api/v1/tools", self.base_url))
            .send()
            .await?
            .json()
            .await?;
        Ok(body["result"]["tools"].clone())
    }

    /// Posts `arguments` to a tool route. Returns the HTTP status and the raw envelope.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<(u16, Value)> {
        let resp = self
            .http_client
            .post(format!("{}/api/v1/{}", self.base_url, name))
            .json(&arguments)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.json().await.unwrap_or_else(|_| json!(null));
        Ok((status, body))
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

fn spawn_server(binary: &Path, crm_url: &str, token: &str, port: u16) -> Result<Child> {
    let child = Command::new(binary)
        .arg("--base-url")
        .arg(crm_url)
        .arg("serve")
        .arg("--port")
        .arg(port.to_string())
        .arg("--bind")
        .arg("127.0.0.1")
        .env("FIREBERRY_TOKEN_ID", token)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;
    Ok(child)
}

/// Same key, same port.
fn deterministic_port(key: &str) -> u16 {
    let hash: u32 = key
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    BASE_PORT + (hash % PORT_RANGE) as u16
}
