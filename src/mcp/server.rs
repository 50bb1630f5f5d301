use log::warn;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::crm::{CrmTransport, HttpTransport};
use crate::error::{ConfigError, ToolError};
use crate::protocol::mcp::{ToolDefinition, ToolResult};

use super::handlers::handle_tool_call;
use super::tools::get_tools;

/// The tool surface over one CRM tenant.
///
/// Holds no mutable state, so a single instance can serve any number of
/// concurrent calls behind an `Arc`.
#[derive(Clone)]
pub struct FireberryMcpServer {
    pub(crate) transport: Arc<dyn CrmTransport>,
}

impl FireberryMcpServer {
    pub fn new(transport: Arc<dyn CrmTransport>) -> Self {
        Self { transport }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(Arc::new(transport)))
    }

    pub fn tools(&self) -> Vec<ToolDefinition> {
        get_tools()
    }

    /// Runs a tool and returns the raw CRM body.
    pub async fn execute(&self, tool_name: &str, args: Value) -> Result<Value, ToolError> {
        handle_tool_call(self, tool_name, args).await
    }

    /// Runs a tool and folds any failure into an error-flagged result.
    pub async fn call_tool(&self, tool_name: &str, args: Value) -> ToolResult {
        let outcome = self
            .execute(tool_name, args)
            .await
            .and_then(|body| serde_json::to_string(&body).map_err(ToolError::from));

        match outcome {
            Ok(text) => ToolResult::success(text),
            Err(e) => {
                warn!("{} failed: {}", tool_name, e);
                ToolResult::error(e.to_string())
            }
        }
    }
}
