//! Terminal User Interface for the lookout assistant.
//!
//! A single Ratatui screen: status line, search box and the inline result
//! panel for the shown intent.

pub mod app;
pub mod components;
pub mod event;
pub mod input;
pub mod terminal;
pub mod ui;

pub use app::App;
pub use event::{Event, Message};
pub use terminal::{Tui, restore_terminal, setup_terminal};
pub use ui::render;
