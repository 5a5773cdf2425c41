mod action;
mod app;
mod cache;
mod config;
mod error;
mod event;
mod graphql;
mod source;
#[cfg(test)]
mod test_log;
mod tui;
mod types;
mod ui;
mod view;

use std::fs::OpenOptions;
use std::panic;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::cache::CachedSource;
use crate::config::Config;
use crate::event::Event;
use crate::graphql::GraphQlClient;
use crate::source::TodoSource;
use crate::tui::EventHandler;
use crate::view::{PageSize, ViewState};

/// Browse todos served by a GraphQL endpoint.
#[derive(Debug, Parser)]
#[command(name = "todoview", version, about)]
struct Cli {
    /// GraphQL endpoint URL (overrides the config file)
    #[arg(long)]
    endpoint: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rows per page: 5, 10 or 25
    #[arg(long)]
    page_size: Option<usize>,

    /// Write logs here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Build the effective config. The second value is a default config
    /// file that was ignored because it failed to parse.
    fn resolve(self) -> error::Result<(Config, Option<error::TodoError>)> {
        let (mut config, ignored) = match &self.config {
            Some(path) => (Config::load_from(path)?, None),
            None => Config::load(),
        };
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = Some(log_file);
        }
        config.page_size()?;
        Ok((config, ignored))
    }
}

fn init_logging(config: &Config) -> std::io::Result<()> {
    let writer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(config.log_file.is_none()),
        )
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, ignored) = Cli::parse().resolve()?;
    init_logging(&config)?;
    if let Some(e) = ignored {
        tracing::warn!(error = %e, "ignoring config file, using defaults");
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let client = GraphQlClient::new(config.endpoint.clone(), config.request_timeout())?;
    let source: Arc<dyn TodoSource> = Arc::new(CachedSource::new(client));
    tracing::info!(source = source.name(), endpoint = %source.endpoint(), "starting");

    let result = run(source, config.page_size()?).await;

    tui::restore()?;

    result
}

async fn run(
    source: Arc<dyn TodoSource>,
    page_size: PageSize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = tui::init()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let mut app = App::new(source, ViewState::with_page_size(page_size), action_tx.clone());

    let tick_rate = Duration::from_millis(100);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render | Event::Resize => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
