use anyhow::{anyhow, Context as _, Result};
use reqwest::Client;

use crate::protocol::{ChatRequest, ChatResponse, ErrorResponse};

/// Client side of the `POST /ollama` endpoint
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    endpoint: String,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/ollama", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .with_context(|| format!("Could not reach the proxy at {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            // Prefer the proxy's own error body; fall back to the bare status.
            let reason = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error,
                Err(_) => status.to_string(),
            };
            return Err(anyhow!("Proxy request failed ({}): {}", status, reason));
        }

        response
            .json::<ChatResponse>()
            .await
            .context("Proxy returned a malformed chat response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_relays_message_and_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ollama"))
            .and(body_json(json!({ "message": "hi", "context": [7] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "hello",
                "context": [7, 8]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ProxyClient::new(&server.uri());
        let response = client
            .send(&ChatRequest {
                message: "hi".to_string(),
                context: Some(vec![7].into()),
            })
            .await
            .unwrap();

        assert_eq!(response.message, "hello");
        assert_eq!(response.context, Some(vec![7, 8].into()));
    }

    #[tokio::test]
    async fn test_send_surfaces_proxy_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ollama"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": "Failed to fetch response from Ollama"
            })))
            .mount(&server)
            .await;

        let client = ProxyClient::new(&server.uri());
        let err = client
            .send(&ChatRequest {
                message: "hi".to_string(),
                context: None,
            })
            .await
            .unwrap_err();

        let text = err.to_string();
        assert!(text.contains("500"));
        assert!(text.contains("Failed to fetch response from Ollama"));
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = ProxyClient::new("http://localhost:3001/");
        assert_eq!(client.endpoint(), "http://localhost:3001/ollama");
    }
}
