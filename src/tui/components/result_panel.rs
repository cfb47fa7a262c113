//! Inline result panel: quote line and trade table for the shown intent.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::live::TradeView;
use crate::models::QuoteView;
use crate::tui::app::App;

/// Renders the panel. Nothing is drawn while no intent is shown.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let lines = content(app);
    if lines.is_empty() {
        return;
    }

    let title = app
        .search
        .state()
        .response
        .as_ref()
        .map(|intent| format!(" {} ", intent.kind.label()))
        .unwrap_or_default();

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Rows of content the panel needs, excluding its border.
pub fn content_height(app: &App) -> u16 {
    u16::try_from(content(app).len()).unwrap_or(u16::MAX)
}

fn content(app: &App) -> Vec<Line<'static>> {
    let Some(intent) = app.search.state().response.as_ref() else {
        return Vec::new();
    };

    let mut lines = Vec::new();

    if intent.quote_pair().is_some() {
        let quote = app.live.quote().and_then(|live| live.quote());
        lines.push(quote_line(quote));
    }

    if intent.wants_trades() {
        match app.live.trades() {
            Some(live) => lines.extend(trade_lines(live.view())),
            None => lines.push(empty_line(" No last trades")),
        }
    }

    if lines.is_empty() {
        lines.push(empty_line(" Press Enter to open"));
    }

    lines
}

fn quote_line(quote: Option<&QuoteView>) -> Line<'static> {
    let Some(quote) = quote else {
        return empty_line(" No quote");
    };

    Line::from(vec![
        Span::raw(format!(" 1 {} = ", quote.base_currency())),
        Span::styled(
            quote.mid.to_string(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {}", quote.counter_currency())),
    ])
}

fn trade_lines(view: &TradeView) -> Vec<Line<'static>> {
    if view.is_empty() {
        return vec![empty_line(" No last trades")];
    }

    let mut lines = Vec::with_capacity(view.trades.len() + 2);

    lines.push(Line::from(Span::styled(
        format!(
            " {:>8}  {:<7} {:<4} {:>14}  {:<10}  {:<8}",
            "Id", "Pair", "Ccy", "Notional", "Date", "Status"
        ),
        Style::default().fg(Color::DarkGray),
    )));

    for trade in &view.trades {
        lines.push(Line::from(format!(
            " {:>8}  {:<7} {:<4} {:>14}  {:<10}  {:<8}",
            trade.trade_id,
            trade.symbol,
            trade.dealt_currency,
            trade.notional.round_dp(2),
            trade.trade_date,
            trade.status
        )));
    }

    lines.push(Line::from(Span::styled(
        format!(" {}", view.summary()),
        Style::default().fg(Color::DarkGray),
    )));

    lines
}

fn empty_line(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}
