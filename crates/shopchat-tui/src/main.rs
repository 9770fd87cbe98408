use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use shopchat_core::{Config, ConversationController, QueryClient};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui, TICK_RATE};

#[derive(Parser)]
#[command(name = "shopchat", version)]
#[command(about = "Terminal chat client for the shop assistant")]
struct Cli {
    /// Query endpoint (overrides SHOPCHAT_ENDPOINT and the config file)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Where to write logs (defaults to the user cache directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the chatbot backend is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.clone())?;

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not load config, using defaults");
        Config::new()
    });
    let endpoint = config.resolve_endpoint(cli.endpoint.as_deref());
    let client = QueryClient::new(&endpoint)?.with_user_id(config.user_id.clone());
    info!(%endpoint, "starting shopchat");

    match cli.command {
        Some(Commands::Health) => check_health(&client).await,
        None => run_tui(client, endpoint).await,
    }
}

async fn check_health(client: &QueryClient) -> Result<()> {
    let url = client.health_url()?;
    let text = client
        .health()
        .await
        .with_context(|| format!("chatbot backend at {} is not reachable", url))?;
    println!("{}", text);
    Ok(())
}

async fn run_tui(client: QueryClient, endpoint: String) -> Result<()> {
    let mut app = App::new(ConversationController::new(client), endpoint);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    info!(entries = app.controller.state().entries().len(), "session ended");
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }

    Ok(())
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => dirs::cache_dir()
            .ok_or_else(|| anyhow!("Could not determine cache directory"))?
            .join("shopchat")
            .join("shopchat.log"),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopchat=info,shopchat_core=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();

    Ok(())
}
