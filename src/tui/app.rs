//! Application state for the TUI.

use tracing::debug;

use crate::broker::ConnectionStatus;
use crate::config::AppConfig;
use crate::live::LiveResults;
use crate::models::Intent;
use crate::search::SearchOrchestrator;
use crate::service::Services;

use super::input::text_input::TextInput;

/// Frames of the busy indicator, advanced on every tick while busy.
pub const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

/// Central application state container.
pub struct App {
    // -- Core --
    /// Search state machine; the only writer of the search state.
    pub search: SearchOrchestrator,
    /// Inline results for the shown intent.
    pub live: LiveResults,

    // -- UI State --
    /// Contents of the search box.
    pub input: TextInput,
    /// Current busy indicator frame.
    pub spinner: usize,
    /// Rendered height of the result panel.
    pub result_height: ContentHeight,

    // -- Connection State --
    /// Broker connection status.
    pub connection_status: ConnectionStatus,

    // -- Internal --
    /// Intent the live views currently follow.
    shown: Option<Intent>,
    /// Flag to signal application should quit.
    pub should_quit: bool,
}

impl App {
    /// Creates the app on top of the shared service handles.
    pub fn new(services: Services, config: &AppConfig) -> Self {
        Self {
            search: SearchOrchestrator::new(&services, config.search),
            live: LiveResults::new(services, config.max_trades),
            input: TextInput::new(),
            spinner: 0,
            result_height: ContentHeight::default(),
            connection_status: ConnectionStatus::default(),
            shown: None,
            should_quit: false,
        }
    }

    /// Points the live views at the current response if it changed.
    pub fn sync_live(&mut self) {
        let response = self.search.state().response.as_ref();
        if response == self.shown.as_ref() {
            return;
        }
        debug!(kind = ?response.map(|intent| intent.kind), "Shown intent changed");
        self.live.show(response);
        self.shown = response.cloned();
    }

    /// Advances the busy indicator.
    pub fn tick(&mut self) {
        if self.search.state().is_busy() {
            self.spinner = (self.spinner + 1) % SPINNER_FRAMES.len();
        }
    }

    /// The busy indicator glyph, or `None` when idle.
    pub fn busy_indicator(&self) -> Option<&'static str> {
        self.search
            .state()
            .is_busy()
            .then(|| SPINNER_FRAMES[self.spinner])
    }

    /// Tears down the search and live subscriptions before exit.
    pub fn shutdown(&mut self) {
        self.search.dispose();
        self.live.close();
        self.shown = None;
    }
}

/// Tracks the height of growing content and reports only changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContentHeight {
    height: u16,
}

impl ContentHeight {
    pub fn get(&self) -> u16 {
        self.height
    }

    /// Records a new measurement. Returns the new height if it differs from
    /// the previous one.
    pub fn measure(&mut self, height: u16) -> Option<u16> {
        if height == self.height {
            return None;
        }
        self.height = height;
        Some(height)
    }
}
