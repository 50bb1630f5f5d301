use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::{path::Path, process::Stdio, time::Duration};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Speaks newline-delimited JSON-RPC to the binary's stdio mode.
pub struct StdioClient {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    /// Killed when the client is dropped.
    _process: Child,
}

impl StdioClient {
    pub fn start(binary: impl AsRef<Path>, crm_url: &str, token: &str) -> Result<Self> {
        let mut process = Command::new(binary.as_ref())
            .arg("--base-url")
            .arg(crm_url)
            .env("FIREBERRY_TOKEN_ID", token)
            .env("RUST_LOG", "debug")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = process.stdin.take().ok_or_else(|| anyhow!("stdin not piped"))?;
        let stdout = process.stdout.take().ok_or_else(|| anyhow!("stdout not piped"))?;

        Ok(Self {
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            _process: process,
        })
    }

    /// Sends a request and waits for the response with the same id.
    pub async fn send_request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let mut message = json!({ "jsonrpc": "2.0", "id": id, "method": method });
        if let Some(params) = params {
            message["params"] = params;
        }
        self.write(&message).await?;

        loop {
            let line = tokio::time::timeout(Duration::from_secs(30), self.stdout.next_line())
                .await
                .map_err(|_| anyhow!("Timed out waiting for response to {}", method))??
                .ok_or_else(|| anyhow!("Server closed stdout"))?;
            let response: Value = serde_json::from_str(&line)?;
            if response["id"] == json!(id) {
                return Ok(response);
            }
        }
    }

    pub async fn send_notification(&mut self, method: &str) -> Result<()> {
        self.write(&json!({ "jsonrpc": "2.0", "method": method })).await
    }

    /// Runs the `initialize` handshake.
    pub async fn initialize(&mut self) -> Result<Value> {
        let response = self
            .send_request(
                "initialize",
                Some(json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "test-support", "version": "0.1.0" }
                })),
            )
            .await?;
        self.send_notification("notifications/initialized").await?;
        Ok(response["result"].clone())
    }

    /// Calls a tool and returns the MCP tool result.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value> {
        let response = self
            .send_request(
                "tools/call",
                Some(json!({ "name": name, "arguments": arguments })),
            )
            .await?;
        if let Some(error) = response.get("error") {
            return Err(anyhow!("JSON-RPC error: {}", error));
        }
        Ok(response["result"].clone())
    }

    /// Writes a raw line, for exercising protocol errors.
    pub async fn send_raw(&mut self, line: &str) -> Result<Value> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        let line = self
            .stdout
            .next_line()
            .await?
            .ok_or_else(|| anyhow!("Server closed stdout"))?;
        Ok(serde_json::from_str(&line)?)
    }

    async fn write(&mut self, message: &Value) -> Result<()> {
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');
        self.stdin.write_all(&line).await?;
        self.stdin.flush().await?;
        Ok(())
    }
}
