use std::fs::OpenOptions;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use lookout::broker::BrokerClient;
use lookout::config::{AppConfig, fetch_config};
use lookout::models::Intent;
use lookout::service::{IntentHandler, Services};
use lookout::tui::components::result_panel;
use lookout::tui::event::{spawn_event_reader, spawn_tick_timer, update};
use lookout::tui::terminal::install_panic_hook;
use lookout::tui::{App, Message, Tui, render, restore_terminal, setup_terminal};
use lookout::{LookoutError, Result};

/// Tick interval driving the busy indicator.
const TICK_MS: u64 = 100;

/// Records confirmed intents; opening a full view is left to the host.
struct LogIntentHandler;

impl IntentHandler for LogIntentHandler {
    fn handle_intent(&self, intent: &Intent) {
        info!(
            kind = intent.kind.label(),
            currency = ?intent.parameters.currency,
            pair = ?intent.parameters.currency_pair,
            "Intent confirmed"
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = fetch_config()?;
    init_logging(&config)?;

    let broker = BrokerClient::spawn(config.broker_url.clone());
    let client = Arc::new(broker.clone());
    let services = Services::new()
        .with_classifier(client.clone())
        .with_trades(client.clone())
        .with_prices(client)
        .with_intent_handler(Arc::new(LogIntentHandler));

    install_panic_hook();
    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, App::new(services, &config), &broker).await;
    restore_terminal(&mut terminal)?;

    result
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(config: &AppConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .map_err(|e| LookoutError::Io(format!("failed to open {}: {e}", config.log_file)))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

async fn run(terminal: &mut Tui, mut app: App, broker: &BrokerClient) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_event_reader(tx.clone());
    spawn_tick_timer(tx, TICK_MS);

    let mut status = broker.watch_status();
    app.connection_status = *status.borrow();
    info!("Search assistant started");

    loop {
        if let Some(height) = app.result_height.measure(result_panel::content_height(&app)) {
            debug!(height, "Result panel resized");
        }
        terminal
            .draw(|frame| render(frame, &app))
            .map_err(|e| LookoutError::Io(format!("failed to draw: {e}")))?;

        let message = tokio::select! {
            msg = rx.recv() => match msg {
                Some(msg) => msg,
                None => Message::Quit,
            },
            action = app.search.next_event() => Message::Search(action),
            live = app.live.next_update() => Message::Live(live),
            Ok(()) = status.changed() => Message::Status(*status.borrow_and_update()),
        };

        update(&mut app, message);
        if app.should_quit {
            break;
        }
    }

    app.shutdown();
    info!("Search assistant stopped");
    Ok(())
}
