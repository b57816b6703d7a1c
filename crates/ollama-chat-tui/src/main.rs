mod app;
mod handler;
mod markdown;
mod tui;
mod ui;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use ollama_chat_core::Config;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "ollama-chat")]
#[command(version, about = "Chat with a local Ollama model through the ollama-chat proxy")]
struct Cli {
    /// Base URL of the chat proxy
    #[arg(long)]
    proxy_url: Option<String>,

    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(proxy_url) = cli.proxy_url {
        config.proxy_url = proxy_url;
    }

    let cache_dir = Config::cache_dir()?;
    fs::create_dir_all(&cache_dir)
        .with_context(|| format!("Failed to create {}", cache_dir.display()))?;

    // The terminal belongs to the UI, so logs go to a file
    init_logging(&cache_dir.join("ollama-chat.log"), &config.log_level)?;
    log::info!("Starting ollama-chat against {}", config.proxy_url);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut app = App::new(&config, cache_dir.join("previews"));
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    finish(result, tui::restore())
}

/// The loop's outcome wins; a restore failure is only logged.
fn finish(result: Result<()>, restored: Result<()>) -> Result<()> {
    if let Err(e) = restored {
        log::error!("Failed to restore terminal: {:#}", e);
    }
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event);
        app.poll_pending().await;
    }
    Ok(())
}

fn init_logging(path: &Path, level: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}
