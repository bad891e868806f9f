use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

mod app;
mod assistant;
mod config;
mod handler;
mod layout;
mod tui;
mod ui;

use app::App;
use assistant::AssistantClient;
use config::Config;

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "hero-chat")]
#[command(version)]
#[command(about = "Terminal chat client for the HERO housing resource assistant")]
struct Cli {
    /// Assistant service endpoint (overrides the config file)
    #[arg(long)]
    endpoint: Option<String>,

    /// Start with the chat panel already open
    #[arg(long)]
    open: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let endpoint = cli
        .endpoint
        .unwrap_or_else(|| config.endpoint().to_string());
    let client = AssistantClient::new(&endpoint, config.request_timeout())?;
    tracing::info!("starting hero-chat against {endpoint}");

    let mut app = App::new(client);
    if cli.open {
        app.toggle_open();
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let run_result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    run_result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new(TICK_RATE);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event);
        }

        app.poll_reply().await;
    }

    // Quit aborts an in-flight request instead of leaking the task
    if let Some(task) = app.reply_task.take() {
        task.abort();
    }

    Ok(())
}

fn init_logging() -> Result<()> {
    let path = Config::log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(&path)?;

    tracing_subscriber::fmt()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .init();

    Ok(())
}
