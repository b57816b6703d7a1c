use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ollama_chat_core::protocol::{ErrorResponse, BACKEND_FAILURE_MESSAGE};

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The client's body could not be read as a chat request
    #[error("invalid chat request: {0}")]
    BadRequest(String),
    /// The backend was unreachable, failed, or answered with garbage
    #[error("backend request failed: {0:#}")]
    Backend(anyhow::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::BadRequest(reason) => {
                log::warn!("Rejected chat request: {}", reason);
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(reason))).into_response()
            }
            ProxyError::Backend(err) => {
                // The cause stays in the server log; clients get the generic message.
                log::error!("Error communicating with Ollama: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(BACKEND_FAILURE_MESSAGE)),
                )
                    .into_response()
            }
        }
    }
}
