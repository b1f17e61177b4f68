// HTTP transport for the Chronicle backend

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const NETWORK_ERROR_MESSAGE: &str = "Network error, please try again later.";
pub const HTTP_ERROR_MESSAGE: &str = "An error occurred";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "Unexpected error occurred";

/// Failure reported by the transport: the HTTP status when the server
/// answered, and a message fit to show the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn network() -> Self {
        Self::new(None, NETWORK_ERROR_MESSAGE)
    }

    pub fn unexpected() -> Self {
        Self::new(None, UNEXPECTED_ERROR_MESSAGE)
    }

    /// Build from an error response body, preferring `message`, then the
    /// `detail` field FastAPI uses for `HTTPException`.
    fn from_response_body(status: u16, body: &Value) -> Self {
        let message = ["message", "detail"]
            .iter()
            .find_map(|key| body.get(key).and_then(Value::as_str))
            .filter(|message| !message.trim().is_empty())
            .unwrap_or(HTTP_ERROR_MESSAGE);
        Self::new(Some(status), message)
    }
}

/// Swappable JSON transport. Paths are relative to the client's base URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value, ApiError>;
    #[allow(dead_code)]
    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError>;
    /// Like `post`, but hands back the success body undecoded.
    async fn post_raw(&self, path: &str, body: Value) -> Result<String, ApiError>;
    #[allow(dead_code)]
    async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError>;
    #[allow(dead_code)]
    async fn delete(&self, path: &str) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpApiClient {
    base_url: String,
    client: Client,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>, request_timeout: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let text = self.execute_raw(request).await?;
        Ok(lenient_json(text))
    }

    async fn execute_raw(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await.map_err(|e| {
            if e.is_builder() {
                warn!(error = %e, "Failed to build request");
                ApiError::unexpected()
            } else {
                warn!(error = %e, "Network error");
                ApiError::network()
            }
        })?;

        Self::read_body(response).await
    }

    async fn read_body(response: Response) -> Result<String, ApiError> {
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            warn!(error = %e, "Failed to read response body");
            ApiError::network()
        })?;

        if status.is_success() {
            debug!(%status, "Request succeeded");
            Ok(text)
        } else {
            let body = lenient_json(text);
            warn!(%status, %body, "API error");
            Err(ApiError::from_response_body(status.as_u16(), &body))
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, %url, "Sending request");
        self.client
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
    }
}

/// Bodies that are not JSON are surfaced as a plain string.
fn lenient_json(text: String) -> Value {
    serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text))
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(self.request(Method::GET, path)).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.execute(self.request(Method::POST, path).json(&body)).await
    }

    async fn post_raw(&self, path: &str, body: Value) -> Result<String, ApiError> {
        self.execute_raw(self.request(Method::POST, path).json(&body)).await
    }

    async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.execute(self.request(Method::PUT, path).json(&body)).await
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(self.request(Method::DELETE, path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_creation() {
        let client = HttpApiClient::new("http://localhost:8000/api/", 10);
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url(), "http://localhost:8000/api");
    }

    #[test]
    fn test_url_joining() {
        let client = HttpApiClient::new("http://localhost:8000/api", 10).unwrap();
        assert_eq!(client.url("/models"), "http://localhost:8000/api/models");
        assert_eq!(client.url("chat"), "http://localhost:8000/api/chat");
    }

    #[test]
    fn test_error_message_from_body() {
        let error = ApiError::from_response_body(400, &json!({"message": "Bad provider"}));
        assert_eq!(error, ApiError::new(Some(400), "Bad provider"));

        let error = ApiError::from_response_body(503, &json!({"detail": "No providers"}));
        assert_eq!(error, ApiError::new(Some(503), "No providers"));

        let error = ApiError::from_response_body(500, &json!("Internal Server Error"));
        assert_eq!(error, ApiError::new(Some(500), HTTP_ERROR_MESSAGE));

        let error = ApiError::from_response_body(500, &json!({"message": "  "}));
        assert_eq!(error.message, HTTP_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_get_decodes_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/models"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["openai", "gemini"])))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpApiClient::new(format!("{}/api", server.uri()), 10).unwrap();
        let body = client.get("/models").await.unwrap();
        assert_eq!(body, json!(["openai", "gemini"]));
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start().await;
        let payload = json!({"provider": "openai", "messages": []});
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "[]"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpApiClient::new(server.uri(), 10).unwrap();
        let body = client.post("/chat", payload).await.unwrap();
        assert_eq!(body, json!({"response": "[]"}));
    }

    #[tokio::test]
    async fn test_put_and_delete() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/items/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/items/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": true})))
            .mount(&server)
            .await;

        let client = HttpApiClient::new(server.uri(), 10).unwrap();
        let updated = client.put("/items/1", json!({"name": "x"})).await;
        assert_eq!(updated.unwrap(), json!({"id": 1}));
        let deleted = client.delete("/items/1").await;
        assert_eq!(deleted.unwrap(), json!({"deleted": true}));
    }

    #[tokio::test]
    async fn test_plain_text_body_becomes_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("1. 1969 - Moon landing."))
            .mount(&server)
            .await;

        let client = HttpApiClient::new(server.uri(), 10).unwrap();
        let body = client.post("/chat", json!({})).await.unwrap();
        assert_eq!(body, json!("1. 1969 - Moon landing."));
    }

    #[tokio::test]
    async fn test_post_raw_keeps_body_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let client = HttpApiClient::new(server.uri(), 10).unwrap();
        let body = client.post_raw("/chat", json!({})).await.unwrap();
        assert_eq!(body, "<html>Bad Gateway</html>");
    }

    #[tokio::test]
    async fn test_post_raw_maps_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"detail": "Bad provider"})),
            )
            .mount(&server)
            .await;

        let client = HttpApiClient::new(server.uri(), 10).unwrap();
        let error = client.post_raw("/chat", json!({})).await.unwrap_err();
        assert_eq!(error, ApiError::new(Some(400), "Bad provider"));
    }

    #[tokio::test]
    async fn test_http_error_carries_status_and_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(json!({"detail": "No AI providers are currently configured"})),
            )
            .mount(&server)
            .await;

        let client = HttpApiClient::new(server.uri(), 10).unwrap();
        let error = client.get("/models").await.unwrap_err();
        assert_eq!(error.status, Some(503));
        assert_eq!(error.message, "No AI providers are currently configured");
    }

    #[tokio::test]
    async fn test_http_error_without_message_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = HttpApiClient::new(server.uri(), 10).unwrap();
        let error = client.get("/models").await.unwrap_err();
        assert_eq!(error, ApiError::new(Some(500), HTTP_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client = HttpApiClient::new(server.uri(), 1).unwrap();
        let error = client.get("/models").await.unwrap_err();
        assert_eq!(error, ApiError::network());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let client = HttpApiClient::new("http://127.0.0.1:1", 2).unwrap();
        let error = client.get("/models").await.unwrap_err();
        assert_eq!(error.status, None);
        assert_eq!(error.message, NETWORK_ERROR_MESSAGE);
    }
}
