use crate::state::{App, Focus};
use crate::theme;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

pub fn render(frame: &mut Frame, app: &App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Percentage(40),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(outer[0]);

    render_switches(frame, app, inner[0]);
    render_status(frame, app, inner[1]);
    render_logs(frame, app, outer[1]);
    render_status_bar(frame, app, outer[2]);
}

fn border_style(app: &App, focus: Focus) -> ratatui::style::Style {
    if app.focus == focus {
        theme::FOCUSED_BORDER
    } else {
        theme::BLURRED_BORDER
    }
}

fn render_switches(frame: &mut Frame, app: &App, area: Rect) {
    let rows = app.tree.visible_rows();
    let mut selected = None;
    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            if row.id == app.selection {
                selected = Some(index);
            }
            let node = app.tree.node(row.id);
            let indent = "  ".repeat(row.depth);
            let line = if node.entity.is_some() {
                Line::from(format!("{indent}{}", node.label))
            } else {
                Line::from(Span::styled(
                    format!("{indent}{}", node.label),
                    theme::GROUP_ROW,
                ))
            };
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("switches")
                .border_style(border_style(app, Focus::Switches)),
        )
        .highlight_style(theme::SELECTED_ROW);

    let mut list_state = ListState::default();
    list_state.select(selected);
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let title = app.tree.node(app.selection).label.clone();
    let status = Paragraph::new(app.status.as_str())
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(status, area);
}

fn render_logs(frame: &mut Frame, app: &App, area: Rect) {
    let text = app.log.join(",\n");
    let total = text.lines().count() as u16;
    let visible = area.height.saturating_sub(2);
    let offset = app.log_offset.min(u16::MAX as usize) as u16;
    let scroll = total.saturating_sub(visible).saturating_sub(offset);

    let logs = Paragraph::new(text).scroll((scroll, 0)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("logs")
            .border_style(border_style(app, Focus::Logs)),
    );
    frame.render_widget(logs, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let connection = if app.connected {
        "hub: connected"
    } else {
        "hub: offline"
    };
    let chord = if app.chord.buffer.is_empty() {
        String::new()
    } else {
        format!("  chord: {}", app.chord.buffer)
    };
    let line = Line::from(vec![
        Span::styled(connection, theme::connection_style(app.connected)),
        Span::raw(chord),
    ]);
    frame.render_widget(Paragraph::new(line).style(theme::STATUS_BAR), area);
}
