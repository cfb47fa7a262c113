//! Main UI rendering coordinator.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
};

use super::app::App;
use super::components::{result_panel, search_bar, status_bar};

/// Renders the entire application UI.
pub fn render(frame: &mut Frame, app: &App) {
    let search_height = if app.search.state().search_visible { 3 } else { 0 };
    let result_height = match app.result_height.get() {
        0 => 0,
        rows => rows.saturating_add(2), // borders
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // Status bar
            Constraint::Length(search_height), // Search box
            Constraint::Length(result_height), // Inline result
            Constraint::Min(0),
            Constraint::Length(1), // Keybindings help
        ])
        .split(frame.area());

    status_bar::render(frame, layout[0], app);
    if search_height > 0 {
        search_bar::render(frame, layout[1], app);
    }
    result_panel::render(frame, layout[2], app);
    render_keybindings(frame, layout[4], app);
}

/// Renders the keybindings help line.
fn render_keybindings(frame: &mut Frame, area: Rect, app: &App) {
    let help = if app.search.state().search_visible {
        "[Esc]close [Enter]open result"
    } else {
        "[/]search [Enter]open result [Esc]clear [q]quit"
    };

    let para = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(para, area);
}
