mod todo_table;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{App, InputMode};
use crate::source::FetchState;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match &app.fetch {
        FetchState::Pending => render_busy(frame, app, chunks[1]),
        FetchState::Failed(message) => render_error(frame, message, chunks[1]),
        FetchState::Succeeded(_) => todo_table::render(frame, app, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        format!("todoview - {}", app.source().endpoint()),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];

    if let Some(at) = app.fetched_at {
        spans.push(Span::styled(
            format!("  updated {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::Gray),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_busy(frame: &mut Frame, app: &App, area: Rect) {
    let spinner = SPINNER[app.ticks % SPINNER.len()];
    let area = centered_rect(30, 3, area);
    let busy = Paragraph::new(Line::from(vec![
        Span::styled(spinner, Style::default().fg(Color::Cyan)),
        Span::raw(" Loading todos..."),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));

    frame.render_widget(busy, area);
}

fn render_error(frame: &mut Frame, message: &str, area: Rect) {
    let area = centered_rect(area.width.saturating_sub(4).min(80), 5, area);
    let error = Paragraph::new(Line::from(Span::styled(
        format!("Error: {}", message),
        Style::default().fg(Color::Red),
    )))
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(Span::styled(
                " Failed to load todos ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
    );

    frame.render_widget(error, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if app.refreshing {
        Line::from(vec![Span::styled(
            "Refreshing...",
            Style::default().fg(Color::Yellow),
        )])
    } else {
        let help = match (app.mode, &app.fetch) {
            (InputMode::Search, _) => "type to filter | Backspace: delete | Ctrl+u: clear | Enter/Esc: done",
            (InputMode::Normal, FetchState::Succeeded(_)) => {
                "/: search | t/s/u: sort | h/l: page | g/G: first/last | +/-: rows | r: refresh | q: quit"
            }
            (InputMode::Normal, _) => "r: refresh | q: quit",
        };
        Line::from(vec![Span::styled(help, Style::default().fg(Color::Gray))])
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

/// Rect of the given size centered inside `outer`, clamped to fit.
fn centered_rect(width: u16, height: u16, outer: Rect) -> Rect {
    let width = width.min(outer.width);
    let height = height.min(outer.height);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(outer.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(outer);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(outer.width.saturating_sub(width) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}
