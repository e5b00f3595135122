use ratatui::style::{Color, Modifier, Style};

pub const FOCUSED_BORDER: Style = Style::new().fg(Color::Green);
pub const BLURRED_BORDER: Style = Style::new().fg(Color::DarkGray);
pub const SELECTED_ROW: Style = Style::new()
    .bg(Color::Rgb(104, 157, 106))
    .fg(Color::Black)
    .add_modifier(Modifier::BOLD);
pub const GROUP_ROW: Style = Style::new()
    .fg(Color::Rgb(250, 189, 47))
    .add_modifier(Modifier::BOLD);
pub const STATUS_BAR: Style = Style::new()
    .bg(Color::Rgb(85, 107, 47))
    .fg(Color::Rgb(235, 219, 178));

pub fn connection_style(connected: bool) -> Style {
    if connected {
        Style::new().fg(Color::Rgb(142, 192, 124))
    } else {
        Style::new().fg(Color::Rgb(251, 73, 52))
    }
}
