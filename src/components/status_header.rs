// ABOUTME: Status header showing connection state, target, traffic rates and latency

use crate::terminal::{
    session::{ConnectionIndicator, SessionController},
    traffic::format_rate,
};
use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
};

pub struct StatusHeaderComponent;

impl StatusHeaderComponent {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, session: &SessionController) {
        let paragraph = Paragraph::new(Self::status_line(session)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(paragraph, area);
    }

    pub fn status_line(session: &SessionController) -> Line<'static> {
        let indicator = session.indicator();
        let indicator_color = match indicator {
            ConnectionIndicator::Connected => Color::Green,
            ConnectionIndicator::Connecting => Color::Yellow,
            ConnectionIndicator::Disconnected => Color::Red,
        };
        let dim = Style::default().fg(Color::Gray);

        let target = session
            .target()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "no target".to_string());
        let rates = session.rates();
        let latency = session
            .latency()
            .map(|d| format!("{} ms", d.as_millis()))
            .unwrap_or_else(|| "-".to_string());
        let appearance = session.appearance();

        Line::from(vec![
            Span::styled(
                format!("{} {}", indicator.symbol(), indicator.label()),
                Style::default().fg(indicator_color).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(target, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            Span::styled(format!(" @ {}", session.cluster()), dim),
            Span::raw("  "),
            Span::styled(format!("↑ {}", format_rate(rates.upload)), Style::default().fg(Color::Cyan)),
            Span::raw(" "),
            Span::styled(
                format!("↓ {}", format_rate(rates.download)),
                Style::default().fg(Color::Magenta),
            ),
            Span::styled(format!("  latency {}", latency), dim),
            Span::styled(
                format!("  {} {}px", appearance.theme, appearance.font_size),
                dim,
            ),
        ])
    }
}

impl Default for StatusHeaderComponent {
    fn default() -> Self {
        Self::new()
    }
}
