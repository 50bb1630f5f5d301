//! Drives the compiled binary's `serve` mode, with the CRM mocked out.

use serde_json::json;
use test_support::HttpClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BINARY: &str = env!("CARGO_BIN_EXE_fireberry-mcp");

#[tokio::test]
async fn tools_over_http() {
    let crm = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/record/117/t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&crm)
        .await;
    Mock::given(method("GET"))
        .and(path("/record/invoiceitems/inv-1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "upstream down"})))
        .mount(&crm)
        .await;

    let client = HttpClient::start(BINARY, &crm.uri(), "e2e-token").await.unwrap();
    assert!(client.port() > 0);

    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools.as_array().unwrap().len(), 13);

    let (status, body) = client
        .call_tool(
            "manage_record",
            json!({"action": "update", "objectType": "ticket", "recordId": "t-1", "data": {"statuscode": 2}}),
        )
        .await
        .unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["result"], json!({"success": true}));

    let (status, body) = client
        .call_tool(
            "get_financial_items",
            json!({"parentObjectType": "invoice", "parentId": "inv-1"}),
        )
        .await
        .unwrap();
    assert_eq!(status, 502);
    assert_eq!(body["error"], "upstream down");

    let (status, _) = client.call_tool("bogus", json!({})).await.unwrap();
    assert_eq!(status, 404);
}
