use anyhow::{anyhow, Context as _, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::protocol::ConversationContext;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a ConversationContext>,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    context: Option<ConversationContext>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Deserialize)]
struct OllamaModelsResponse {
    models: Vec<OllamaModel>,
}

/// One completed, non-streamed generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub response: String,
    pub context: Option<ConversationContext>,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a single generation, threading `context` from the previous turn.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        context: Option<&ConversationContext>,
    ) -> Result<Generation> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model,
            prompt,
            context,
            stream: false,
        };

        log::debug!(
            "POST {} model={} prompt_chars={} context_len={}",
            url,
            model,
            prompt.chars().count(),
            context.map(ConversationContext::len).unwrap_or(0)
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Could not reach Ollama at {}", self.base_url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Ollama request failed with status: {}. Make sure Ollama is running with: ollama serve",
                response.status()
            ));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("Ollama returned a malformed generate response")?;

        Ok(Generation {
            response: body.response,
            context: body.context,
        })
    }

    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to list models: {}", response.status()));
        }

        let models_response: OllamaModelsResponse = response.json().await?;
        Ok(models_response
            .models
            .into_iter()
            .map(|model| model.name)
            .collect())
    }

    pub async fn has_model(&self, name: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| m == name))
    }
}
