// ABOUTME: Terminal pane rendering the session's emulator inside a bordered block
// Shows a placeholder while no target is selected

use crate::terminal::session::{ConnectionIndicator, SessionController};
use ratatui::{
    prelude::*,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub struct TerminalPaneComponent;

impl TerminalPaneComponent {
    pub fn new() -> Self {
        Self
    }

    /// Block drawn around the emulator; `inner` of it is the emulator's area
    pub fn block(session: &SessionController, bordered: bool) -> Block<'static> {
        if !bordered {
            return Block::default();
        }
        let border_color = match session.indicator() {
            ConnectionIndicator::Connected => Color::Green,
            ConnectionIndicator::Connecting => Color::Yellow,
            ConnectionIndicator::Disconnected => Color::Gray,
        };
        let title = match session.target() {
            Some(target) => format!(" {} ", target),
            None => " Terminal ".to_string(),
        };
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, session: &SessionController, bordered: bool) {
        let block = Self::block(session, bordered);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match session.emulator() {
            Some(emulator) => frame.render_widget(emulator, inner),
            None => {
                let hint = Paragraph::new("Select a pod or node to open a terminal (F5)")
                    .style(Style::default().fg(Color::Gray))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true });
                frame.render_widget(hint, inner);
            }
        }
    }
}

impl Default for TerminalPaneComponent {
    fn default() -> Self {
        Self::new()
    }
}
