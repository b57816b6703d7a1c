//! Stateless forwarder between the chat client and Ollama
//!
//! One route, `POST /ollama`: the client's message and opaque context go to
//! `/api/generate` with a fixed model, and the reply plus updated context
//! come back. Nothing is kept between requests.

pub mod error;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use ollama_chat_core::protocol::{ChatRequest, ChatResponse};
use ollama_chat_core::OllamaClient;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use error::ProxyError;

/// Immutable per-process state shared by every request
#[derive(Clone)]
pub struct ProxyState {
    backend: OllamaClient,
    model: Arc<str>,
}

impl ProxyState {
    pub fn new(backend: OllamaClient, model: &str) -> Self {
        Self {
            backend,
            model: Arc::from(model),
        }
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/ollama", post(handle_chat))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: ProxyState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn handle_chat(
    State(state): State<ProxyState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ProxyError> {
    let Json(request) = payload.map_err(|rejection| ProxyError::BadRequest(rejection.body_text()))?;

    log::info!(
        "Forwarding message ({} chars, context {}) to {}",
        request.message.chars().count(),
        request.context.as_ref().map(|c| c.len()).unwrap_or(0),
        state.model
    );

    let generation = state
        .backend
        .generate(&state.model, &request.message, request.context.as_ref())
        .await
        .map_err(ProxyError::Backend)?;

    Ok(Json(ChatResponse {
        message: generation.response,
        context: generation.context,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "codellama:34b";

    /// Matches backend requests that carry no `context` field at all.
    struct WithoutContext;

    impl wiremock::Match for WithoutContext {
        fn matches(&self, request: &wiremock::Request) -> bool {
            serde_json::from_slice::<Value>(&request.body)
                .map(|body| body.get("context").is_none())
                .unwrap_or(false)
        }
    }

    fn app_for(backend_url: &str) -> Router {
        router(ProxyState::new(OllamaClient::new(backend_url), MODEL))
    }

    async fn post_chat(app: Router, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/ollama")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_relays_reply_and_context() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": MODEL,
                "prompt": "Show me a button",
                "stream": false
            })))
            .and(WithoutContext)
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "Here:\n```html\n<button>Click</button>\n```",
                "context": [1, 2, 3],
                "done": true
            })))
            .expect(1)
            .mount(&backend)
            .await;

        let (status, body) =
            post_chat(app_for(&backend.uri()), r#"{"message":"Show me a button"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "message": "Here:\n```html\n<button>Click</button>\n```",
                "context": [1, 2, 3]
            })
        );
    }

    #[tokio::test]
    async fn test_forwards_context_verbatim() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({ "prompt": "again", "context": [9, 8, 7] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "ok",
                "context": [9, 8, 7, 6]
            })))
            .expect(1)
            .mount(&backend)
            .await;

        let (status, body) = post_chat(
            app_for(&backend.uri()),
            r#"{"message":"again","context":[9,8,7]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["context"], json!([9, 8, 7, 6]));
    }

    #[tokio::test]
    async fn test_backend_error_status_is_generic_500() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": "model 'codellama:34b' not found"
            })))
            .mount(&backend)
            .await;

        let (status, body) = post_chat(app_for(&backend.uri()), r#"{"message":"hi"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to fetch response from Ollama" }));
    }

    #[tokio::test]
    async fn test_malformed_backend_body_is_500() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
            .mount(&backend)
            .await;

        let (status, body) = post_chat(app_for(&backend.uri()), r#"{"message":"hi"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch response from Ollama");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_500() {
        let (status, body) = post_chat(app_for("http://127.0.0.1:1"), r#"{"message":"hi"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to fetch response from Ollama" }));
    }

    #[tokio::test]
    async fn test_missing_message_is_rejected_before_forwarding() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&backend)
            .await;

        let app = app_for(&backend.uri());
        let (status, body) = post_chat(app.clone(), r#"{"context":[1]}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = post_chat(app, "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_keeps_serving_after_a_failure() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&backend)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "recovered",
                "context": [1]
            })))
            .mount(&backend)
            .await;

        let app = app_for(&backend.uri());
        let (first, _) = post_chat(app.clone(), r#"{"message":"one"}"#).await;
        let (second, body) = post_chat(app, r#"{"message":"two"}"#).await;

        assert_eq!(first, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(second, StatusCode::OK);
        assert_eq!(body["message"], "recovered");
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/ollama")
            .header(header::ORIGIN, "http://localhost:8082")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = app_for("http://127.0.0.1:1").oneshot(request).await.unwrap();

        assert!(response.status().is_success());
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
