// ABOUTME: Help overlay component displaying keyboard shortcuts

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, List, ListItem},
};

pub struct HelpComponent;

impl HelpComponent {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 80, area);

        frame.render_widget(Clear, popup_area);

        let heading = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        let help_items = vec![
            ListItem::new("Session:").style(heading),
            ListItem::new("  F5         Next pod / node"),
            ListItem::new("  F6         Next container"),
            ListItem::new("  F7         Reconnect"),
            ListItem::new(""),
            ListItem::new("Display:").style(heading),
            ListItem::new("  F2         Cycle theme"),
            ListItem::new("  F3 / F4    Smaller / larger font"),
            ListItem::new("  F9         Clear terminal"),
            ListItem::new("  F11        Toggle fullscreen"),
            ListItem::new("  Shift+PgUp Scroll back"),
            ListItem::new("  Shift+PgDn Scroll forward"),
            ListItem::new(""),
            ListItem::new("General:").style(heading),
            ListItem::new("  F1         Toggle this help"),
            ListItem::new("  Ctrl+Q     Quit"),
            ListItem::new("  Other keys are sent to the remote shell"),
        ];

        let help_list = List::new(help_items).block(
            Block::default()
                .title("Help - Press F1 or Esc to close")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

        frame.render_widget(help_list, popup_area);
    }
}

impl Default for HelpComponent {
    fn default() -> Self {
        Self::new()
    }
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
