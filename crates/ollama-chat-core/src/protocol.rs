//! Wire types for the `POST /ollama` endpoint

use serde::{Deserialize, Serialize};

/// Error body returned by the proxy whenever the backend round trip fails.
pub const BACKEND_FAILURE_MESSAGE: &str = "Failed to fetch response from Ollama";

/// Opaque continuation state issued by the backend.
///
/// Never inspected or constructed by the client; the latest value is passed
/// back verbatim on the next request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationContext(Vec<i64>);

impl ConversationContext {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<i64>> for ConversationContext {
    fn from(tokens: Vec<i64>) -> Self {
        Self(tokens)
    }
}

/// Client -> proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ConversationContext>,
}

/// Proxy -> client on success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ConversationContext>,
}

/// Proxy -> client on failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
