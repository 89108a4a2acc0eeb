// ABOUTME: Main layout component arranging status header, terminal pane and key-hint bar

use ratatui::{
    prelude::*,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

use super::{HelpComponent, StatusHeaderComponent, TerminalPaneComponent};
use crate::app::{App, AppState, ViewMode};

const HINTS: &str =
    "F1 help  F2 theme  F3/F4 font  F5 next target  F6 container  F7 reconnect  F9 clear  F11 fullscreen  ^Q quit";

pub struct LayoutComponent {
    header: StatusHeaderComponent,
    pane: TerminalPaneComponent,
    help: HelpComponent,
}

impl LayoutComponent {
    pub fn new() -> Self {
        Self {
            header: StatusHeaderComponent::new(),
            pane: TerminalPaneComponent::new(),
            help: HelpComponent::new(),
        }
    }

    fn split(area: Rect, state: &AppState) -> (Option<Rect>, Rect, Option<Rect>) {
        match state.view_mode {
            ViewMode::Fullscreen => (None, area, None),
            ViewMode::Normal => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3), // Status header
                        Constraint::Min(0),    // Terminal
                        Constraint::Length(3), // Key hints
                    ])
                    .split(area);
                (Some(chunks[0]), chunks[1], Some(chunks[2]))
            }
        }
    }

    /// Area the emulator occupies for a screen of `area`
    pub fn terminal_area(&self, area: Rect, state: &AppState) -> Rect {
        let (_, pane, _) = Self::split(area, state);
        if state.view_mode == ViewMode::Fullscreen {
            pane
        } else {
            Block::default().borders(Borders::ALL).inner(pane)
        }
    }

    pub fn render(&mut self, frame: &mut Frame, app: &App) {
        let (header, pane, hints) = Self::split(frame.size(), &app.state);

        if let Some(header) = header {
            self.header.render(frame, header, &app.session);
        }

        self.pane.render(
            frame,
            pane,
            &app.session,
            app.state.view_mode == ViewMode::Normal,
        );

        if let Some(hints) = hints {
            self.render_hint_bar(frame, hints, &app.state);
        }

        if app.state.help_visible {
            self.help.render(frame, frame.size());
        }
    }

    fn render_hint_bar(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let (text, color) = match &state.last_error {
            Some(error) => (error.as_str(), Color::Red),
            None => (HINTS, Color::Yellow),
        };

        let menu = Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .style(Style::default().fg(color))
            .alignment(Alignment::Center);

        frame.render_widget(menu, area);
    }
}

impl Default for LayoutComponent {
    fn default() -> Self {
        Self::new()
    }
}
