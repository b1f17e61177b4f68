mod api;
mod app;
mod config;
mod events;
mod logging;
mod models;
mod parser;
mod services;
mod ui;
mod workflow;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, prelude::*};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

use api::HttpApiClient;
use app::{App, Focus};
use events::AppEvent;
use services::LlmProviderService;
use workflow::QueryOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_config()?;
    let _log_guard = logging::init(&config::get_config_dir()?, &config.log_level)?;

    // Services are built once here and handed to whoever needs them
    let client = HttpApiClient::new(config.api_base_url.clone(), config.request_timeout)?;
    info!(api_base_url = client.base_url(), "Starting Chronicle Explorer");
    let service = LlmProviderService::new(Arc::new(client));
    let orchestrator = QueryOrchestrator::new(service.clone());

    let mut app = App::new(config.default_model.clone());
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
    load_models(&service, &tx);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &service, &orchestrator, &tx, &mut rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = ?err, "Application error");
        eprintln!("Error: {err:?}");
    }

    info!("Chronicle Explorer stopped");
    Ok(())
}

// Health and models are fetched independently so a slow health check
// never holds back the model list
fn load_models(service: &LlmProviderService, event_tx: &mpsc::UnboundedSender<AppEvent>) {
    let health_service = service.clone();
    let health_tx = event_tx.clone();
    tokio::spawn(async move {
        let healthy = health_service.health_check().await;
        let _ = health_tx.send(AppEvent::HealthChecked(healthy));
    });

    let service = service.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let models = service
            .fetch_available_models()
            .await
            .map_err(|e| e.message);
        let _ = tx.send(AppEvent::ModelsLoaded(models));
    });
}

fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::ModelsLoaded(result) => {
            if let Err(error) = &result {
                error!(%error, "Failed to fetch models");
            }
            app.set_models(result);
        }
        AppEvent::HealthChecked(healthy) => {
            app.backend_healthy = Some(healthy);
        }
        AppEvent::QueryFinished { ticket, state } => {
            app.finish_submission(ticket, state);
        }
    }
}

fn submit_query(
    app: &mut App,
    orchestrator: &QueryOrchestrator,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    // An invalid selection is reported by the app without a request
    let Some(submission) = app.begin_submission() else {
        return;
    };

    let orchestrator = orchestrator.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let state = orchestrator
            .submit(&submission.model, submission.date)
            .await;
        let _ = tx.send(AppEvent::QueryFinished {
            ticket: submission.ticket,
            state,
        });
    });
}

const fn handle_help_keys(app: &mut App, key: KeyCode, modifiers: KeyModifiers) -> bool {
    if !app.show_help {
        return false;
    }

    match key {
        KeyCode::Char('h') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.toggle_help();
        }
        KeyCode::Esc => {
            app.show_help = false;
        }
        _ => {}
    }
    true
}

fn handle_focused_keys(app: &mut App, key: KeyCode) {
    match (app.focus, key) {
        (Focus::Model, KeyCode::Up) => app.select_previous_model(),
        (Focus::Model, KeyCode::Down) => app.select_next_model(),
        (Focus::Date, KeyCode::Up) => app.shift_date_days(1),
        (Focus::Date, KeyCode::Down) => app.shift_date_days(-1),
        (Focus::Date, KeyCode::PageUp) => app.shift_date_months(1),
        (Focus::Date, KeyCode::PageDown) => app.shift_date_months(-1),
        (Focus::Results, KeyCode::Up) => app.select_previous_event(),
        (Focus::Results, KeyCode::Down) => app.select_next_event(),
        _ => {}
    }
}

fn handle_keyboard_input(
    app: &mut App,
    key: KeyCode,
    modifiers: KeyModifiers,
    service: &LlmProviderService,
    orchestrator: &QueryOrchestrator,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    match key {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            if app.exit_pending {
                app.quit();
            } else {
                app.exit_pending = true;
            }
            return;
        }
        KeyCode::Esc if app.exit_pending => {
            app.exit_pending = false;
            return;
        }
        _ if app.exit_pending => {
            // Any other key cancels pending exit
            app.exit_pending = false;
        }
        _ => {}
    }

    match key {
        KeyCode::Char('q') if modifiers.contains(KeyModifiers::CONTROL) => app.quit(),
        KeyCode::Char('h') if modifiers.contains(KeyModifiers::CONTROL) => app.toggle_help(),
        KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.models_loading = true;
            load_models(service, event_tx);
        }
        KeyCode::Tab => app.cycle_focus(),
        // Submitting is disabled while a query is in flight
        KeyCode::Enter if !app.is_loading() => submit_query(app, orchestrator, event_tx),
        _ => handle_focused_keys(app, key),
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    service: &LlmProviderService,
    orchestrator: &QueryOrchestrator,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        while let Ok(app_event) = event_rx.try_recv() {
            handle_app_event(app, app_event);
        }

        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && !handle_help_keys(app, key.code, key.modifiers)
                {
                    handle_keyboard_input(
                        app,
                        key.code,
                        key.modifiers,
                        service,
                        orchestrator,
                        event_tx,
                    );
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
