use thiserror::Error;

/// Startup failures. Any of these stops the process before it serves.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("FIREBERRY_TOKEN_ID environment variable is required")]
    MissingToken,

    #[error("invalid CRM base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("token cannot be sent as a header value")]
    InvalidToken,

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// A failed call against the CRM.
///
/// `message` is what the caller sees: the CRM's own `message` field when it
/// supplied one, otherwise the transport error text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UpstreamError {
    pub status: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

/// Per-call failures. These become error-flagged tool results, never panics.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("failed to serialize CRM response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    pub fn missing(argument: &str) -> Self {
        Self::Validation(format!("Missing required argument: {}", argument))
    }

    pub fn invalid(argument: &str, expected: &str) -> Self {
        Self::Validation(format!("Invalid argument {}: expected {}", argument, expected))
    }
}
