use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the Ollama server the proxy forwards to
    pub backend_url: String,
    /// Model every proxied request is generated with
    pub model: String,
    /// Address the proxy listens on
    pub listen_addr: String,
    /// Base URL the chat client sends messages to
    pub proxy_url: String,
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:11434".to_string(),
            model: "codellama:34b".to_string(),
            listen_addr: "127.0.0.1:3001".to_string(),
            proxy_url: "http://localhost:3001".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from `path` (or the user config file), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load_from(&Self::get_config_path()?)?,
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Override fields from `OLLAMA_CHAT_*` variables looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("OLLAMA_CHAT_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Some(model) = var("OLLAMA_CHAT_MODEL") {
            self.model = model;
        }
        if let Some(url) = var("OLLAMA_CHAT_PROXY_URL") {
            self.proxy_url = url;
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("ollama-chat").join("config.json"))
    }

    /// Directory for logs and preview pages.
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow!("Could not determine cache directory"))?;

        Ok(cache_dir.join("ollama-chat"))
    }
}
