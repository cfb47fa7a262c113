//! Status bar component.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::broker::ConnectionStatus;
use crate::tui::app::App;

/// Renders the status bar: connection, busy indicator, intent label.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let status_color = match app.connection_status {
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::Connecting | ConnectionStatus::Reconnecting => Color::Yellow,
        ConnectionStatus::Disconnected => Color::Red,
    };

    let busy = match app.busy_indicator() {
        Some(glyph) => Span::styled(format!(" {glyph} "), Style::default().fg(Color::Cyan)),
        None => Span::raw("   "),
    };

    let state = app.search.state();
    let intent = match state.response.as_ref() {
        Some(intent) => Span::styled(
            format!(" {} ", intent.kind.label()),
            Style::default().fg(Color::White),
        ),
        None if state.search_visible && !state.request_text.is_empty() && !state.is_busy() => {
            Span::styled(" No match ", Style::default().fg(Color::DarkGray))
        }
        None => Span::raw(""),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", app.connection_status.label()),
            Style::default().fg(status_color),
        ),
        Span::raw("│"),
        busy,
        Span::raw("│"),
        intent,
    ]);

    let para = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(para, area);
}
