use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{SERVER_NAME, SERVER_VERSION};
use crate::error::ToolError;

use super::state::AppState;

#[derive(Serialize)]
pub(crate) struct ApiResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiResponse {
    fn success(result: Value) -> Json<ApiResponse> {
        Json(ApiResponse {
            ok: true,
            result: Some(result),
            error: None,
        })
    }

    fn error(status: StatusCode, msg: impl Into<String>) -> (StatusCode, Json<ApiResponse>) {
        (
            status,
            Json(ApiResponse {
                ok: false,
                result: None,
                error: Some(msg.into()),
            }),
        )
    }
}

fn status_for(err: &ToolError) -> StatusCode {
    match err {
        ToolError::UnknownTool(_) => StatusCode::NOT_FOUND,
        ToolError::Validation(_) => StatusCode::BAD_REQUEST,
        ToolError::Upstream(_) => StatusCode::BAD_GATEWAY,
        ToolError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn health() -> Json<ApiResponse> {
    ApiResponse::success(json!({
        "status": "ok",
        "server": SERVER_NAME,
        "version": SERVER_VERSION,
    }))
}

pub async fn list_tools(State(state): State<AppState>) -> Json<ApiResponse> {
    ApiResponse::success(json!({ "tools": state.server.tools() }))
}

pub async fn call_tool(
    State(state): State<AppState>,
    Path(tool_name): Path<String>,
    Json(args): Json<Value>,
) -> Result<Json<ApiResponse>, (StatusCode, Json<ApiResponse>)> {
    match state.server.execute(&tool_name, args).await {
        Ok(body) => Ok(ApiResponse::success(body)),
        Err(e) => Err(ApiResponse::error(status_for(&e), e.to_string())),
    }
}
