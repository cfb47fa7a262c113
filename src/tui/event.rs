//! Event handling for the TUI.

use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::debug;

use crate::broker::ConnectionStatus;
use crate::live::LiveUpdate;
use crate::search::SearchAction;

use super::app::App;

/// Events that can occur in the application.
#[derive(Debug)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// Terminal was resized.
    Resize(u16, u16),
    /// Periodic tick for UI updates.
    Tick,
}

/// Messages that update application state.
#[derive(Debug)]
pub enum Message {
    /// Input event from terminal.
    Input(Event),
    /// The orchestrator applied a timer or request event.
    Search(SearchAction),
    /// A live view changed.
    Live(LiveUpdate),
    /// Broker connection status changed.
    Status(ConnectionStatus),
    /// Request to quit the application.
    Quit,
}

/// Spawns a task that polls for terminal events and sends them to a channel.
pub fn spawn_event_reader(tx: mpsc::UnboundedSender<Message>) {
    tokio::spawn(async move {
        loop {
            // Poll for events with a 50ms timeout
            match tokio::task::spawn_blocking(|| {
                if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                    event::read().ok()
                } else {
                    None
                }
            })
            .await
            {
                Ok(Some(CrosstermEvent::Key(key))) => {
                    if tx.send(Message::Input(Event::Key(key))).is_err() {
                        break;
                    }
                }
                Ok(Some(CrosstermEvent::Resize(w, h))) => {
                    if tx.send(Message::Input(Event::Resize(w, h))).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });
}

/// Spawns a task that sends periodic tick events.
pub fn spawn_tick_timer(tx: mpsc::UnboundedSender<Message>, interval_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        loop {
            interval.tick().await;
            if tx.send(Message::Input(Event::Tick)).is_err() {
                break;
            }
        }
    });
}

/// Updates application state based on a message.
pub fn update(app: &mut App, message: Message) {
    match message {
        Message::Input(event) => handle_input(app, event),
        // Already applied by the orchestrator; only the live views follow.
        Message::Search(action) => debug!(?action, "Search event"),
        Message::Live(update) => debug!(?update, "Live view updated"),
        Message::Status(status) => app.connection_status = status,
        Message::Quit => app.should_quit = true,
    }
    app.sync_live();
}

/// Handles input events and updates application state.
fn handle_input(app: &mut App, event: Event) {
    match event {
        Event::Key(key) => handle_key(app, key),
        Event::Resize(_, _) => {}
        Event::Tick => app.tick(),
    }
}

/// Handles a key press.
fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    if app.search.state().search_visible {
        handle_search_keys(app, key);
    } else {
        handle_normal_keys(app, key);
    }
}

/// Keys while the search box is hidden.
fn handle_normal_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('/') => app.search.show(),
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Enter => app.search.confirm(),
        KeyCode::Esc => app.search.escape(),
        _ => {}
    }
}

/// Keys while the search box has focus.
fn handle_search_keys(app: &mut App, key: KeyEvent) {
    let edited = match key.code {
        KeyCode::Char(c) => {
            app.input.insert(c);
            true
        }
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Delete => app.input.delete(),
        KeyCode::Left => {
            app.input.move_left();
            false
        }
        KeyCode::Right => {
            app.input.move_right();
            false
        }
        KeyCode::Home => {
            app.input.move_home();
            false
        }
        KeyCode::End => {
            app.input.move_end();
            false
        }
        KeyCode::Enter => {
            app.search.confirm();
            false
        }
        KeyCode::Esc => {
            app.input.take();
            app.search.escape();
            false
        }
        _ => false,
    };

    if edited {
        app.search.input_changed(app.input.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::search::SearchSettings;
    use crate::service::Services;

    fn app() -> App {
        let config = AppConfig {
            broker_url: String::new(),
            search: SearchSettings::default(),
            max_trades: 20,
            log_file: String::new(),
        };
        App::new(Services::new(), &config)
    }

    fn key(code: KeyCode) -> Message {
        Message::Input(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    #[tokio::test]
    async fn slash_opens_search_and_typing_marks_busy() {
        let mut app = app();
        update(&mut app, key(KeyCode::Char('/')));
        assert!(app.search.state().search_visible);

        update(&mut app, key(KeyCode::Char('e')));
        assert_eq!(app.input.as_str(), "e");
        assert!(app.search.state().is_typing);
        assert!(app.busy_indicator().is_some());
    }

    #[tokio::test]
    async fn escape_clears_input_and_hides() {
        let mut app = app();
        update(&mut app, key(KeyCode::Char('/')));
        update(&mut app, key(KeyCode::Char('x')));

        update(&mut app, key(KeyCode::Esc));
        assert!(app.input.is_empty());
        assert!(!app.search.state().search_visible);
        assert!(!app.search.state().is_typing);
        assert!(app.search.is_idle());
    }

    #[tokio::test]
    async fn q_quits_only_outside_search() {
        let mut app = app();
        update(&mut app, key(KeyCode::Char('/')));
        update(&mut app, key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(app.input.as_str(), "q");

        update(&mut app, key(KeyCode::Esc));
        update(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn ctrl_c_quits() {
        let mut app = app();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        update(&mut app, Message::Input(Event::Key(ctrl_c)));
        assert!(app.should_quit);
    }
}
