use reqwest::Url;

use crate::error::ConfigError;

/// Production Fireberry REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.fireberry.com/api";

/// Environment variable carrying the tenant token.
pub const TOKEN_ENV_VAR: &str = "FIREBERRY_TOKEN_ID";

/// Environment variable overriding the CRM base URL.
pub const BASE_URL_ENV_VAR: &str = "FIREBERRY_API_URL";

/// Header Fireberry reads the tenant token from.
pub const AUTH_HEADER: &str = "tokenid";

pub const SERVER_NAME: &str = "fireberry-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP revision answered when the client does not ask for one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// Settings needed to reach the CRM. Built once at startup and never mutated.
#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub base_url: Url,
}

impl Config {
    pub fn new(token: Option<String>, base_url: &str) -> Result<Self, ConfigError> {
        let token = match token {
            Some(token) if !token.trim().is_empty() => token.trim().to_string(),
            _ => return Err(ConfigError::MissingToken),
        };

        let base_url = Url::parse(base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "not a base URL".to_string(),
            });
        }

        Ok(Self { token, base_url })
    }
}

// Keeps the token out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_rejected() {
        let err = Config::new(None, DEFAULT_BASE_URL).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
        assert_eq!(
            err.to_string(),
            "FIREBERRY_TOKEN_ID environment variable is required"
        );
    }

    #[test]
    fn blank_token_is_rejected() {
        let err = Config::new(Some("   ".to_string()), DEFAULT_BASE_URL).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = Config::new(Some("tok".to_string()), "not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = Config::new(Some("secret-token".to_string()), DEFAULT_BASE_URL).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("api.fireberry.com"));
    }
}
