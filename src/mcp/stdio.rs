//! MCP over stdio: newline-delimited JSON-RPC 2.0 on stdin/stdout.
//!
//! Every request is handled on its own task so a slow CRM call does not hold
//! up later requests. Responses are funneled through one writer so lines
//! never interleave. Logging goes to stderr and never touches stdout.

use anyhow::Result;
use log::{debug, info, warn};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::config::{DEFAULT_PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION};
use crate::protocol::jsonrpc::{
    JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR,
};

use super::server::FireberryMcpServer;

pub async fn serve_stdio(server: FireberryMcpServer) -> Result<()> {
    info!("Fireberry MCP server running on stdio");
    serve(
        Arc::new(server),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

/// Runs the protocol loop until `reader` reaches EOF.
///
/// A line that is not UTF-8 gets a parse error reply; only I/O errors end the loop.
pub async fn serve<R, W>(
    server: Arc<FireberryMcpServer>,
    mut reader: R,
    mut writer: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();

    let writer_task = tokio::spawn(async move {
        while let Some(response) = rx.recv().await {
            let mut line = serde_json::to_vec(&response)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
            writer.flush().await?;
        }
        anyhow::Ok(())
    });

    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = match String::from_utf8(std::mem::take(&mut buf)) {
            Ok(line) => line,
            Err(e) => {
                warn!("Message is not valid UTF-8: {}", e);
                let _ = tx.send(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let server = server.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some(response) = handle_message(&server, &line).await {
                // Receiver only goes away once stdout is broken.
                let _ = tx.send(response);
            }
        });
    }

    debug!("stdin closed, draining pending responses");
    drop(tx);
    writer_task.await??;
    Ok(())
}

/// Handles one raw line. Returns `None` for notifications.
pub async fn handle_message(server: &FireberryMcpServer, line: &str) -> Option<JsonRpcResponse> {
    let raw: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            warn!("Unparseable message: {}", e);
            return Some(JsonRpcResponse::error(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {}", e),
            ));
        }
    };

    let id = raw.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(e) => {
            warn!("Invalid request: {}", e);
            return Some(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {}", e),
            ));
        }
    };

    if request.is_notification() {
        debug!("Notification: {}", request.method);
        return None;
    }

    Some(handle_request(server, request).await)
}

async fn handle_request(server: &FireberryMcpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    let id = request.id.unwrap_or(Value::Null);
    let params = request.params.unwrap_or(Value::Null);

    match request.method.as_str() {
        "initialize" => {
            let protocol_version = params
                .get("protocolVersion")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_PROTOCOL_VERSION);
            JsonRpcResponse::success(
                id,
                json!({
                    "protocolVersion": protocol_version,
                    "capabilities": { "tools": {} },
                    "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION }
                }),
            )
        }
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => JsonRpcResponse::success(id, json!({ "tools": server.tools() })),
        "tools/call" => {
            let Some(name) = params.get("name").and_then(Value::as_str) else {
                return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing tool name");
            };
            let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
            debug!("tools/call {}", name);
            let result = server.call_tool(name, arguments).await;
            match serde_json::to_value(result) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
            }
        }
        method => JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", method)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::MockCrmTransport;
    use crate::error::UpstreamError;

    fn server() -> FireberryMcpServer {
        let mut mock = MockCrmTransport::new();
        mock.expect_send().returning(|req| {
            if req.path() == "/v3/metadata/objects" {
                Ok(json!({"data": [{"objectTypeCode": 1}]}))
            } else {
                Err(UpstreamError::status(404, "not found"))
            }
        });
        FireberryMcpServer::new(Arc::new(mock))
    }

    fn handle(line: &str) -> Option<JsonRpcResponse> {
        tokio_test::block_on(handle_message(&server(), line))
    }

    #[test]
    fn initialize_echoes_protocol_version() {
        let response = handle(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26"}}"#,
        )
        .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["serverInfo"]["name"], "fireberry-mcp");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[test]
    fn initialize_defaults_protocol_version() {
        let response = handle(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#).unwrap();
        assert_eq!(response.result.unwrap()["protocolVersion"], DEFAULT_PROTOCOL_VERSION);
    }

    #[test]
    fn notifications_get_no_response() {
        assert!(handle(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).is_none());
    }

    #[test]
    fn tools_list_advertises_every_tool() {
        let response = handle(r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#).unwrap();
        assert_eq!(response.id, json!("a"));
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 13);
        assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
    }

    #[test]
    fn tools_call_success() {
        let response = handle(
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"get_objects"}}"#,
        )
        .unwrap();
        assert_eq!(
            response.result.unwrap(),
            json!({"content": [{"type": "text", "text": r#"{"data":[{"objectTypeCode":1}]}"#}]})
        );
    }

    #[test]
    fn tool_failure_is_a_result_not_a_protocol_error() {
        let response = handle(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"get_record","arguments":{"objectType":"account","recordId":"x"}}}"#,
        )
        .unwrap();
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "not found");
    }

    #[test]
    fn tools_call_without_name() {
        let response =
            handle(r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{}}"#).unwrap();
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[test]
    fn protocol_errors() {
        let response = handle("{not json").unwrap();
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);

        let response = handle(r#"{"jsonrpc":"2.0","id":5}"#).unwrap();
        assert_eq!(response.id, json!(5));
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);

        let response = handle(r#"{"jsonrpc":"2.0","id":6,"method":"resources/list"}"#).unwrap();
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn serve_answers_each_request_line() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n"
        );
        let (client, server_end) = tokio::io::duplex(64 * 1024);
        serve(Arc::new(server()), BufReader::new(input.as_bytes()), server_end)
            .await
            .unwrap();

        let mut output = String::new();
        let mut client = BufReader::new(client);
        tokio::io::AsyncReadExt::read_to_string(&mut client, &mut output)
            .await
            .unwrap();

        let mut ids: Vec<i64> = output
            .lines()
            .map(|l| serde_json::from_str::<Value>(l).unwrap()["id"].as_i64().unwrap())
            .collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
    }

    async fn run(input: &[u8]) -> Vec<Value> {
        let (client, server_end) = tokio::io::duplex(64 * 1024);
        serve(Arc::new(server()), BufReader::new(input), server_end)
            .await
            .unwrap();

        let mut output = String::new();
        let mut client = BufReader::new(client);
        tokio::io::AsyncReadExt::read_to_string(&mut client, &mut output)
            .await
            .unwrap();
        output
            .lines()
            .map(|l| serde_json::from_str::<Value>(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_end_the_session() {
        let mut input = Vec::new();
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
        input.push(b'\n');
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"p\xffng\"}\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#);
        input.push(b'\n');

        let responses = run(&input).await;
        assert_eq!(responses.len(), 3);

        let parse_errors: Vec<_> = responses
            .iter()
            .filter(|r| r["error"]["code"] == json!(PARSE_ERROR))
            .collect();
        assert_eq!(parse_errors.len(), 1);
        assert_eq!(parse_errors[0]["id"], Value::Null);

        let mut ids: Vec<i64> = responses.iter().filter_map(|r| r["id"].as_i64()).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn last_line_without_newline_is_answered() {
        let responses = run(br#"{"jsonrpc":"2.0","id":9,"method":"ping"}"#).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 9);
    }

    #[test]
    fn null_id_gets_a_reply() {
        let response = handle(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.result.unwrap(), json!({}));
    }
}
