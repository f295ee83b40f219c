use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use portal_domain::CoreError;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

/// One remote-procedure call: the dotted method name plus either query-string
/// parameters (GET) or a JSON body (POST).
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub method: String,
    pub call: RpcCall,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RpcCall {
    Get { params: Vec<(String, String)> },
    Post { body: Value },
}

impl RpcRequest {
    pub fn get(method: impl Into<String>, params: Vec<(String, String)>) -> Self {
        Self {
            method: method.into(),
            call: RpcCall::Get { params },
        }
    }

    pub fn post(method: impl Into<String>, body: Value) -> Self {
        Self {
            method: method.into(),
            call: RpcCall::Post { body },
        }
    }
}

/// Seam between typed backend calls and the wire. Production uses
/// [`ReqwestRpcTransport`]; tests queue canned payloads through a stub.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Executes the call and returns the decoded response body. Business
    /// failures inside HTTP 200 responses are NOT errors at this layer.
    async fn execute(&self, request: RpcRequest) -> Result<Value, CoreError>;
}

#[derive(Clone)]
pub struct ReqwestRpcTransport {
    base_url: String,
    client: Client,
}

impl fmt::Debug for ReqwestRpcTransport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ReqwestRpcTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ReqwestRpcTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CoreError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(CoreError::Configuration(
                "billing API base URL cannot be empty.".to_owned(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        // The session cookie issued by the auth collaborator's login call
        // scopes every subsequent request, so the cookie store is shared.
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|error| {
                CoreError::Configuration(format!("failed to build billing HTTP client: {error}"))
            })?;

        Ok(Self { base_url, client })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/api/method/{}", self.base_url, method.trim())
    }
}

#[async_trait]
impl RpcTransport for ReqwestRpcTransport {
    async fn execute(&self, request: RpcRequest) -> Result<Value, CoreError> {
        let builder = match &request.call {
            RpcCall::Get { params } => self
                .client
                .get(self.endpoint(&request.method))
                .query(params),
            RpcCall::Post { body } => self
                .client
                .post(self.endpoint(&request.method))
                .json(body),
        };

        let response = builder.send().await.map_err(|error| {
            CoreError::DependencyUnavailable(format!(
                "billing API request `{}` failed: {error}",
                request.method
            ))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            CoreError::DependencyUnavailable(format!(
                "billing API response read for `{}` failed: {error}",
                request.method
            ))
        })?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CoreError::Unauthenticated(format!(
                "billing API rejected `{}` with status {status}",
                request.method
            )));
        }
        if !status.is_success() {
            return Err(CoreError::DependencyUnavailable(format!(
                "billing API request `{}` failed with status {status}: {}",
                request.method,
                truncate_for_error(&body)
            )));
        }

        serde_json::from_str(&body).map_err(|error| {
            CoreError::DependencyUnavailable(format!(
                "billing API response for `{}` was malformed JSON: {error}",
                request.method
            ))
        })
    }
}

fn truncate_for_error(body: &str) -> String {
    const MAX_LEN: usize = 200;
    if body.chars().count() <= MAX_LEN {
        body.to_owned()
    } else {
        format!("{}...", body.chars().take(MAX_LEN).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::{truncate_for_error, ReqwestRpcTransport};

    #[test]
    fn endpoint_joins_base_url_and_method_path() {
        let transport =
            ReqwestRpcTransport::new("https://portal.example.com/").expect("build transport");
        assert_eq!(
            transport.endpoint("isp_billing.api.issue.get_issues"),
            "https://portal.example.com/api/method/isp_billing.api.issue.get_issues"
        );
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(ReqwestRpcTransport::new("   ").is_err());
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(500);
        let truncated = truncate_for_error(&body);
        assert!(truncated.len() < body.len());
        assert!(truncated.ends_with("..."));
    }
}
