use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use ollama_chat_core::{Config, OllamaClient};
use ollama_chat_proxy::{serve, ProxyState};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "ollama-chat-proxy")]
#[command(about = "Forward chat messages and conversation context to a local Ollama server")]
struct Cli {
    /// Address to listen on (e.g. 127.0.0.1:3001)
    #[arg(short, long)]
    listen: Option<String>,
    /// Base URL of the Ollama server
    #[arg(short, long)]
    backend_url: Option<String>,
    /// Model used for every request
    #[arg(short, long)]
    model: Option<String>,
    /// Config file to read instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Write the resolved settings back to the config file and exit
    #[arg(long)]
    save_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    if cli.save_config {
        let path = match cli.config {
            Some(path) => path,
            None => Config::get_config_path()?,
        };
        config.save_to(&path)?;
        println!("Saved config to {}", path.display());
        return Ok(());
    }

    let backend = OllamaClient::new(&config.backend_url);

    // Not fatal: Ollama may come up after the proxy does.
    match backend.has_model(&config.model).await {
        Ok(true) => log::info!("Using model {} from {}", config.model, backend.base_url()),
        Ok(false) => log::warn!(
            "Model {} is not available on {}. Pull it with: ollama pull {}",
            config.model,
            backend.base_url(),
            config.model
        ),
        Err(e) => log::warn!(
            "Could not reach Ollama at {} ({:#}). Make sure it is running with: ollama serve",
            backend.base_url(),
            e
        ),
    }

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Could not listen on {}", config.listen_addr))?;
    log::info!("Server is running at http://{}", listener.local_addr()?);

    serve(listener, ProxyState::new(backend, &config.model)).await
}
