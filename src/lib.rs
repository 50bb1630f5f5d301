pub mod config;
pub mod crm;
pub mod error;
pub mod http;
pub mod mcp;
pub mod protocol;

pub use config::Config;
pub use error::{ConfigError, ToolError, UpstreamError};
pub use mcp::FireberryMcpServer;
