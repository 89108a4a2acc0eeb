// ABOUTME: Main entry point for the kube-term TUI

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, Terminal};
use std::{io, sync::Arc, time::Duration};
use tracing::{error, info};

use kube_term::{
    app::{App, AppEvent, AppState, EventHandler},
    cli::Cli,
    components::LayoutComponent,
    config::AppConfig,
    preferences::{FilePreferenceStore, Preferences},
    terminal::{SessionController, WebSocketConnector},
};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging();
    setup_panic_handler();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    cli.apply_overrides(&mut config);
    info!(
        "Starting kube-term against {} (cluster {})",
        config.server, config.cluster
    );

    let preferences = match FilePreferenceStore::open_default() {
        Ok(store) => Preferences::new(Box::new(store)),
        Err(e) => {
            error!("Preferences unavailable, using defaults: {:#}", e);
            Preferences::in_memory()
        }
    };

    let session = SessionController::new(
        config.endpoint()?,
        config.cluster.clone(),
        Arc::new(WebSocketConnector),
        config.session.timings(),
        App::stored_appearance(&preferences),
    );
    let mut app = App::new(AppState::new(cli.target.selection()), session, preferences);
    let mut layout = LayoutComponent::new();

    let result = run_tui(&mut app, &mut layout).await;
    app.shutdown();
    result
}

async fn run_tui(app: &mut App, layout: &mut LayoutComponent) -> Result<()> {
    if let Err(e) = crossterm::terminal::is_raw_mode_enabled() {
        eprintln!("Cannot check terminal raw mode: {}", e);
        return Err(anyhow::anyhow!("Terminal not compatible: {}", e));
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Size the pane before the first connection so the emulator starts at the right geometry
    let size = terminal.size()?;
    app.observe_pane(layout.terminal_area(size, &app.state));
    app.init();

    let result = event_loop(app, layout, &mut terminal).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    result
}

async fn event_loop<B: Backend>(
    app: &mut App,
    layout: &mut LayoutComponent,
    terminal: &mut Terminal<B>,
) -> Result<()> {
    loop {
        app.tick();

        let size = terminal.size()?;
        app.observe_pane(layout.terminal_area(size, &app.state));

        terminal.draw(|frame| {
            layout.render(frame, app);
        })?;

        if event::poll(FRAME_INTERVAL)? {
            let app_event = match event::read()? {
                Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                    EventHandler::handle_key_event(key_event, &app.state)
                }
                Event::Paste(text) => Some(AppEvent::Paste(text)),
                _ => None,
            };
            if let Some(app_event) = app_event {
                EventHandler::process_event(app_event, app);
            }
        }

        if app.state.should_quit {
            break;
        }

        // Let the transport and timer tasks run between frames
        tokio::task::yield_now().await;
    }

    Ok(())
}

fn setup_logging() {
    use std::fs::OpenOptions;
    use std::path::PathBuf;
    use tracing_subscriber::prelude::*;

    let log_dir = dirs::home_dir()
        .map(|home| home.join(".kube-term").join("logs"))
        .unwrap_or_else(|| PathBuf::from(".kube-term/logs"));

    let _ = std::fs::create_dir_all(&log_dir);

    let log_file = log_dir.join(format!(
        "kube-term-{}.log",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .expect("Failed to create log file");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(file)
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kube_term=info".into()),
        )
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        // Restore the terminal before reporting
        let _ = disable_raw_mode();
        let _ = execute!(
            std::io::stderr(),
            LeaveAlternateScreen,
            DisableBracketedPaste
        );

        error!("Application panicked: {}", panic_info);
        eprintln!("Application panicked: {}", panic_info);
        eprintln!("Please check the logs for more details.");
    }));
}
