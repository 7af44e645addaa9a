mod auth;
mod config;
mod controller;
mod logging;
mod model;
mod view;

use std::io;
use std::sync::Arc;
use anyhow::Result;
use std::time::Duration;
use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use config::AppConfig;
use controller::AppController;
use model::{AppModel, FileStore, HttpPlaylistApi};
use view::{AppView, ViewState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = AppConfig::from_env();

    if let Err(e) = logging::init_logging(&config.log_dir) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!(api_url = %config.api_url, "=== Spotkov Client Starting ===");

    let store = FileStore::open(&config.storage_path)?;
    tracing::debug!(path = %store.path().display(), "Using local storage");
    let api = HttpPlaylistApi::new(&config.api_url)?;

    let model = AppModel::new(Arc::new(store), Arc::new(api), &config);
    model.load_persisted().await;

    let controller = AppController::new(model.clone());
    if model.logged_in() {
        controller.spawn_user_fetch();
    }

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, model, controller).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableBracketedPaste, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("Spotkov Client shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: AppModel,
    controller: AppController,
) -> io::Result<()> {
    loop {
        // Auto-clear old errors (after 5 seconds)
        model.auto_clear_old_errors().await;

        let state = ViewState {
            form: model.get_form_state().await,
            draft: model.get_draft().await,
            status: model.get_status().await,
            ui_state: model.get_ui_state().await,
            logged_in: model.logged_in(),
            song_label: model.song_label().await,
            playlist_generated: model.playlist_generated().await,
        };

        terminal.draw(|f| {
            AppView::render(f, &state);
        })?;

        // Short poll time keeps the delayed notice and request results timely
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    if let Err(e) = controller.handle_key_event(key).await {
                        tracing::warn!(error = %e, "Key handling failed");
                    }
                }
                Event::Paste(text) => controller.handle_paste(text).await,
                _ => {}
            }
        }

        if model.should_quit().await {
            break;
        }
    }

    Ok(())
}
