// Typed calls to the Chronicle backend over an `ApiClient`

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::ChatRequest;

#[derive(Clone)]
pub struct LlmProviderService {
    client: Arc<dyn ApiClient>,
}

impl LlmProviderService {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self { client }
    }

    /// `GET /models`: identifiers of the providers the backend can call.
    pub async fn fetch_available_models(&self) -> Result<Vec<String>, ApiError> {
        let body = self.client.get("/models").await?;
        let models = serde_json::from_value::<Vec<String>>(body).map_err(|e| {
            warn!(error = %e, "Unexpected models response");
            ApiError::unexpected()
        })?;
        debug!(count = models.len(), "Fetched available models");
        Ok(models)
    }

    /// `POST /chat`. The reply body is returned as text; its shape varies
    /// and decoding it is left to the parser.
    pub async fn chat(&self, request: &ChatRequest) -> Result<String, ApiError> {
        let body = serde_json::to_value(request).map_err(|e| {
            warn!(error = %e, "Failed to serialize chat request");
            ApiError::unexpected()
        })?;
        self.client.post_raw("/chat", body).await
    }

    /// `GET /health`. Any failure counts as unhealthy.
    pub async fn health_check(&self) -> bool {
        match self.client.get("/health").await {
            Ok(body) => body.get("status").and_then(Value::as_str) == Some("healthy"),
            Err(e) => {
                debug!(error = %e, "Health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApiClient;
    use crate::models::{ChatMessage, MessageRole};
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn service(client: MockApiClient) -> LlmProviderService {
        LlmProviderService::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_fetch_available_models() {
        let mut client = MockApiClient::new();
        client
            .expect_get()
            .withf(|path| path == "/models")
            .times(1)
            .returning(|_| Ok(json!(["openai", "gemini"])));

        let models = assert_ok!(service(client).fetch_available_models().await);
        assert_eq!(models, vec!["openai", "gemini"]);
    }

    #[tokio::test]
    async fn test_fetch_models_rejects_unexpected_shape() {
        let mut client = MockApiClient::new();
        client
            .expect_get()
            .returning(|_| Ok(json!({"models": ["openai"]})));

        let error = assert_err!(service(client).fetch_available_models().await);
        assert_eq!(error, ApiError::unexpected());
    }

    #[tokio::test]
    async fn test_fetch_models_propagates_transport_error() {
        let mut client = MockApiClient::new();
        client
            .expect_get()
            .returning(|_| {
                Err(ApiError::new(
                    Some(503),
                    "No AI providers are currently configured",
                ))
            });

        let error = assert_err!(service(client).fetch_available_models().await);
        assert_eq!(error.status, Some(503));
    }

    #[tokio::test]
    async fn test_chat_posts_request() {
        let mut client = MockApiClient::new();
        client
            .expect_post_raw()
            .withf(|path, body| {
                path == "/chat"
                    && body["provider"] == "gemini"
                    && body["messages"][0]["role"] == "user"
                    && body["messages"][0]["content"] == "07-20"
            })
            .times(1)
            .returning(|_, _| Ok(r#"{"response": "[]"}"#.to_string()));

        let request = ChatRequest {
            provider: "gemini".to_string(),
            messages: vec![ChatMessage::new(MessageRole::User, "07-20")],
        };
        let reply = assert_ok!(service(client).chat(&request).await);
        assert_eq!(reply, r#"{"response": "[]"}"#);
    }

    #[tokio::test]
    async fn test_health_check() {
        let mut client = MockApiClient::new();
        client
            .expect_get()
            .withf(|path| path == "/health")
            .returning(|_| Ok(json!({"status": "healthy"})));
        assert!(service(client).health_check().await);

        let mut client = MockApiClient::new();
        client.expect_get().returning(|_| Err(ApiError::network()));
        assert!(!service(client).health_check().await);
    }
}
