use log::debug;
use serde_json::Value;

use crate::error::ToolError;

use super::params::ToolRequest;
use super::server::FireberryMcpServer;
use super::tools::ToolKind;

pub async fn handle_tool_call(
    server: &FireberryMcpServer,
    tool_name: &str,
    args: Value,
) -> Result<Value, ToolError> {
    let Some(kind) = ToolKind::from_name(tool_name) else {
        return Err(ToolError::UnknownTool(tool_name.to_string()));
    };

    let request = ToolRequest::decode(kind, &args)?.into_crm_request();
    debug!("{}: {}", kind.name(), request);

    let body = server.transport.send(request).await?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::MockCrmTransport;
    use crate::error::UpstreamError;
    use reqwest::Method;
    use serde_json::json;
    use std::sync::Arc;

    fn server_with(mock: MockCrmTransport) -> FireberryMcpServer {
        FireberryMcpServer::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn get_fields_hits_normalized_path() {
        let mut mock = MockCrmTransport::new();
        mock.expect_send()
            .withf(|req| req.method == Method::GET && req.path() == "/v3/metadata/fields/1")
            .times(1)
            .returning(|_| Ok(json!({"data": [{"fieldname": "accountname"}]})));

        let result = server_with(mock)
            .call_tool("get_fields", json!({"objectType": "Account"}))
            .await;
        assert!(!result.is_error);
        assert_eq!(result.text(), r#"{"data":[{"fieldname":"accountname"}]}"#);
    }

    #[tokio::test]
    async fn query_body_carries_objecttype() {
        let mut mock = MockCrmTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.method == Method::POST
                    && req.path() == "/query"
                    && req.body == Some(json!({"pageNumber": 1, "pageSize": 10, "objecttype": 3}))
            })
            .times(1)
            .returning(|_| Ok(json!({"data": {"Records": []}})));

        let result = server_with(mock)
            .call_tool(
                "query",
                json!({"objectType": "lead", "query": {"pageNumber": 1, "pageSize": 10}}),
            )
            .await;
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn delete_record_has_no_body() {
        let mut mock = MockCrmTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.method == Method::DELETE && req.path() == "/record/2/abc" && req.body.is_none()
            })
            .times(1)
            .returning(|_| Ok(json!({"success": true})));

        let result = server_with(mock)
            .call_tool(
                "manage_record",
                json!({"action": "delete", "objectType": "contact", "recordId": "abc"}),
            )
            .await;
        assert!(!result.is_error);
        assert_eq!(result.text(), r#"{"success":true}"#);
    }

    #[tokio::test]
    async fn upstream_message_becomes_error_text() {
        let mut mock = MockCrmTransport::new();
        mock.expect_send()
            .returning(|_| Err(UpstreamError::status(404, "not found")));

        let result = server_with(mock)
            .call_tool("get_record", json!({"objectType": "account", "recordId": "x"}))
            .await;
        assert!(result.is_error);
        assert_eq!(result.text(), "not found");
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_result() {
        let mut mock = MockCrmTransport::new();
        mock.expect_send().never();

        let server = server_with(mock);
        let result = server.call_tool("drop_tables", json!({})).await;
        assert!(result.is_error);
        assert_eq!(result.text(), "Unknown tool: drop_tables");

        let err = server.execute("drop_tables", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "drop_tables"));
    }

    #[tokio::test]
    async fn missing_argument_never_reaches_transport() {
        let mut mock = MockCrmTransport::new();
        mock.expect_send().never();

        let result = server_with(mock)
            .call_tool("get_record", json!({"objectType": "account"}))
            .await;
        assert!(result.is_error);
        assert_eq!(result.text(), "Missing required argument: recordId");
    }

    #[tokio::test]
    async fn response_body_is_passed_through_untouched() {
        let body = json!({"success": true, "data": {"Records": [{"id": 1}, {"id": 2}]}, "message": ""});
        let expected = body.clone();
        let mut mock = MockCrmTransport::new();
        mock.expect_send().returning(move |_| Ok(body.clone()));

        let value = server_with(mock)
            .execute("batch_create", json!({"objectType": "1", "records": [{}, {}]}))
            .await
            .unwrap();
        assert_eq!(value, expected);
    }

    #[test_log::test(tokio::test)]
    async fn concurrent_calls_are_independent() {
        let mut mock = MockCrmTransport::new();
        mock.expect_send()
            .times(8)
            .returning(|req| Ok(json!({ "path": req.path() })));
        let server = server_with(mock);

        let calls = (0..8).map(|i| {
            let server = server.clone();
            async move {
                server
                    .call_tool("get_record", json!({"objectType": "task", "recordId": i}))
                    .await
            }
        });
        let results = futures::future::join_all(calls).await;

        for (i, result) in results.iter().enumerate() {
            assert!(!result.is_error);
            assert_eq!(result.text(), format!(r#"{{"path":"/record/9/{}"}}"#, i));
        }
    }
}
