//! Search input box.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

use crate::tui::app::App;

const PROMPT: &str = "> ";

/// Renders the search box and places the cursor in it.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let border_color = if app.search.state().is_contacting {
        Color::Cyan
    } else {
        Color::Yellow
    };

    let block = Block::default()
        .title(" Search ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let para = Paragraph::new(format!("{PROMPT}{}", app.input.as_str()));
    frame.render_widget(para, inner);

    let cursor_x = inner.x + PROMPT.len() as u16 + app.input.cursor_width();
    frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), inner.y));
}
