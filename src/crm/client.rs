use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use serde_json::Value;

use crate::config::{Config, AUTH_HEADER};
use crate::error::{ConfigError, UpstreamError};

use super::request::CrmRequest;

/// Performs resolved requests against the CRM.
///
/// Implementations are shared between concurrent tool calls and must not
/// rely on interior mutability for correctness.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrmTransport: Send + Sync {
    async fn send(&self, request: CrmRequest) -> Result<Value, UpstreamError>;
}

/// `reqwest`-backed transport carrying the tenant token on every request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let mut token = HeaderValue::from_str(&config.token).map_err(|_| ConfigError::InvalidToken)?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTH_HEADER, token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    fn url_for(&self, request: &CrmRequest) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::transport("CRM base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(&request.segments);
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

#[async_trait]
impl CrmTransport for HttpTransport {
    async fn send(&self, request: CrmRequest) -> Result<Value, UpstreamError> {
        let url = self.url_for(&request)?;
        debug!("CRM request: {}", request);

        let mut builder = self.http.request(request.method.clone(), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!("CRM request {} failed: {}", request, e);
            UpstreamError::transport(e.to_string())
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            UpstreamError::transport(format!("Failed to read CRM response body: {}", e))
        })?;
        let body = parse_response_body(&bytes);

        if status.is_success() {
            debug!("CRM response: {} -> {}", request, status);
            Ok(body)
        } else {
            let err = error_from_response(status.as_u16(), &body);
            warn!("CRM request {} returned {}: {}", request, status, err.message);
            Err(err)
        }
    }
}

fn parse_response_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).to_string()))
}

/// Prefers the CRM's own `message`, falling back to the status line.
fn error_from_response(status: u16, body: &Value) -> UpstreamError {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status code {}", status));
    UpstreamError::status(status, message)
}
