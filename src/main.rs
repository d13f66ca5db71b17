//! capiview - Cluster API visualizer
//!
//! Live management and workload cluster trees in your terminal:
//! - Management cluster with its workload clusters
//! - Resource tree of one workload cluster
//! - Controller logs of a resource
//!
//! Usage: capiview [--server URL] [--interval 30s] [--cluster NAME --namespace NS]

mod api;
mod app;
mod config;
mod modules;
mod refresh;
mod tree;
mod types;
mod ui;
mod view;

use anyhow::{Context, Result};
use app::{App, StartOptions};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "capiview", version, about = "Cluster API visualizer for the terminal")]
struct Cli {
    /// Backend URL for this session (overrides the config file)
    #[arg(long)]
    server: Option<String>,
    /// Polling interval for this session, e.g. 30s, 1m, 1m30s or Off
    #[arg(long)]
    interval: Option<String>,
    /// Open the resource tree of this workload cluster directly
    #[arg(long)]
    cluster: Option<String>,
    /// Namespace of --cluster
    #[arg(long, default_value = "default")]
    namespace: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let result = run_app(cli);

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Log to the file named by CAPIVIEW_LOG; stdout belongs to the TUI.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file = std::env::var_os("CAPIVIEW_LOG")
        .map(PathBuf::from)
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
    match file {
        Some(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
}

fn run_app(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("Failed to load configuration")?;

    let options = StartOptions {
        server_url: cli.server,
        interval: cli.interval,
        cluster: cli.cluster,
        namespace: cli.namespace,
    };
    let mut app = App::new(config, options).context("Failed to initialize application")?;

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to setup terminal")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    // Restore the terminal on panic, otherwise it stays in raw mode
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        let _ = execute!(std::io::stdout(), crossterm::cursor::Show);
        original_hook(info);
    }));

    let result = main_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

fn main_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            ui::render(frame, app);
        })?;

        // Poll timers and background fetches
        app.update_timers()?;

        // Poll for events with timeout (alert expiry, refresh ticks)
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key)?,
                Event::Mouse(mouse) => app.handle_mouse(mouse)?,
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
