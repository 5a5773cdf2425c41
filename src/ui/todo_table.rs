use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use crate::app::{App, InputMode};
use crate::types::Status;
use crate::view::{Page, PageSize, SortDirection, SortKey};

const UNASSIGNED: &str = "Unassigned";

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(page) = app.page() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_search(frame, app, chunks[0]);
    render_table(frame, app, &page, chunks[1]);
    render_pagination(frame, app, &page, chunks[2]);
}

fn render_search(frame: &mut Frame, app: &App, area: Rect) {
    let editing = app.mode == InputMode::Search;
    let term = &app.view.search_term;

    let mut spans = vec![Span::styled("/ ", Style::default().fg(Color::Gray))];
    if term.is_empty() && !editing {
        spans.push(Span::styled(
            "Search todos or users...",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.push(Span::raw(term.as_str()));
    }
    if editing {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }

    let search = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Search ")
            .border_style(if editing {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            }),
    );

    frame.render_widget(search, area);
}

fn header_cell(app: &App, key: SortKey) -> Cell<'static> {
    let active = app.view.sort_key == key;
    let label = if active {
        let arrow = match app.view.sort_direction {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        };
        format!("{} {}", key.label(), arrow)
    } else {
        key.label().to_string()
    };

    let style = if active {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    Cell::from(label).style(style)
}

fn render_table(frame: &mut Frame, app: &App, page: &Page, area: Rect) {
    let header = Row::new(SortKey::ALL.map(|key| header_cell(app, key)))
        .style(Style::default().bg(Color::DarkGray));

    let mut rows: Vec<Row> = page
        .rows
        .iter()
        .enumerate()
        .map(|(i, todo)| {
            let status = todo.status();
            let status_color = match status {
                Status::Completed => Color::Green,
                Status::Pending => Color::Yellow,
            };

            let (user, user_style) = match &todo.user {
                Some(user) => (user.name.as_str(), Style::default().fg(Color::Gray)),
                None => (UNASSIGNED, Style::default().fg(Color::DarkGray)),
            };

            let row = Row::new(vec![
                Cell::from(todo.title.as_str()),
                Cell::from(format!("[{}]", status)).style(Style::default().fg(status_color)),
                Cell::from(user).style(user_style),
            ]);

            // Zebra striping
            if i % 2 == 1 {
                row.style(Style::default().bg(Color::Black))
            } else {
                row
            }
        })
        .collect();

    // Keep the table height fixed on a short last page
    rows.extend((0..page.empty_rows).map(|_| Row::new(vec!["", "", ""])));

    let block = Block::default().borders(Borders::ALL).title(format!(
        " Todos ({}) ",
        app.fetch.todos().map(|t| t.len()).unwrap_or(0)
    ));

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(40),
            Constraint::Percentage(20),
            Constraint::Percentage(40),
        ],
    )
    .header(header)
    .block(block);

    frame.render_widget(table, area);
}

fn render_pagination(frame: &mut Frame, app: &App, page: &Page, area: Rect) {
    let enabled = Style::default().fg(Color::Cyan);
    let disabled = Style::default().fg(Color::DarkGray);

    let mut spans = vec![Span::styled("Rows per page: ", Style::default().fg(Color::Gray))];
    for size in PageSize::ALL {
        if size == app.view.page_size {
            spans.push(Span::styled(
                format!("[{}]", size),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(format!(" {} ", size), Style::default().fg(Color::Gray)));
        }
    }

    spans.push(Span::raw("   "));
    spans.push(Span::raw(page.range_label()));
    spans.push(Span::raw("   "));
    spans.push(Span::styled(
        "◀",
        if page.has_prev() { enabled } else { disabled },
    ));
    spans.push(Span::raw(" "));
    spans.push(Span::styled(
        "▶",
        if page.has_next() { enabled } else { disabled },
    ));

    let footer = Paragraph::new(Line::from(spans)).alignment(Alignment::Right);
    frame.render_widget(footer, area);
}
