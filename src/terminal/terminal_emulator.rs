// ABOUTME: Terminal emulator adapter wrapping a vt100 screen for remote shell output
// Fits geometry to the observed container size and dispatches input/resize handlers

use crate::terminal::{
    error::TerminalError,
    protocol::Geometry,
    theme::{is_valid_font_size, CellMetrics, Palette, TerminalTheme, DEFAULT_FONT_SIZE},
};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use tracing::{debug, trace};

pub const DEFAULT_SCROLLBACK_LINES: usize = 10_000;

/// Pixel size of the element hosting the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerSize {
    pub width: u32,
    pub height: u32,
    /// Visible cell area when the host lays out in cells; the fit never exceeds it
    pub cell_bounds: Option<Geometry>,
}

impl ContainerSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cell_bounds: None,
        }
    }

    /// Pixel size of a pane measured in character cells of the given metrics
    pub fn from_cells(cols: u16, rows: u16, cell: CellMetrics) -> Self {
        Self {
            width: u32::from(cols) * cell.width,
            height: u32::from(rows) * cell.height,
            cell_bounds: Some(Geometry { cols, rows }),
        }
    }
}

impl Default for ContainerSize {
    /// A standard 80x24 pane at the default font, used until the host reports its size
    fn default() -> Self {
        Self::from_cells(
            Geometry::default().cols,
            Geometry::default().rows,
            CellMetrics::for_font(DEFAULT_FONT_SIZE),
        )
    }
}

/// Geometry that fits in a container at a font size
pub fn fit_geometry(container: ContainerSize, font_size: u16) -> Geometry {
    let cell = CellMetrics::for_font(font_size);
    let mut cols = (container.width / cell.width).min(u32::from(u16::MAX)) as u16;
    let mut rows = (container.height / cell.height).min(u32::from(u16::MAX)) as u16;
    if let Some(bounds) = container.cell_bounds {
        cols = cols.min(bounds.cols);
        rows = rows.min(bounds.rows);
    }
    Geometry::new(cols, rows)
}

/// Detachment token returned by handler registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerToken(u64);

pub type InputHandler = Box<dyn FnMut(&str) + Send>;
pub type ResizeHandler = Box<dyn FnMut(Geometry) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Success,
    Info,
    Error,
}

impl StatusLevel {
    fn sgr(&self) -> &'static str {
        match self {
            StatusLevel::Success => "32",
            StatusLevel::Info => "33",
            StatusLevel::Error => "31",
        }
    }
}

/// Terminal emulator instance owned by one session generation
pub struct TerminalEmulator {
    /// VT100 parser for processing ANSI escape codes
    parser: vt100::Parser,

    theme: TerminalTheme,
    font_size: u16,
    container: ContainerSize,
    geometry: Geometry,
    scrollback_lines: usize,

    input_handlers: Vec<(HandlerToken, InputHandler)>,
    resize_handlers: Vec<(HandlerToken, ResizeHandler)>,
    next_token: u64,

    disposed: bool,
}

impl TerminalEmulator {
    pub fn create(
        container: ContainerSize,
        theme: TerminalTheme,
        font_size: u16,
    ) -> Result<Self, TerminalError> {
        Self::create_with_scrollback(container, theme, font_size, DEFAULT_SCROLLBACK_LINES)
    }

    pub fn create_with_scrollback(
        container: ContainerSize,
        theme: TerminalTheme,
        font_size: u16,
        scrollback_lines: usize,
    ) -> Result<Self, TerminalError> {
        if !is_valid_font_size(font_size) {
            return Err(TerminalError::InvalidFontSize(font_size));
        }
        let geometry = fit_geometry(container, font_size);
        debug!(
            "Creating terminal emulator {} ({} theme, font {})",
            geometry, theme, font_size
        );

        Ok(Self {
            parser: vt100::Parser::new(geometry.rows, geometry.cols, scrollback_lines),
            theme,
            font_size,
            container,
            geometry,
            scrollback_lines,
            input_handlers: Vec::new(),
            resize_handlers: Vec::new(),
            next_token: 0,
            disposed: false,
        })
    }

    /// Feed remote output into the screen
    pub fn write(&mut self, data: &str) {
        if self.disposed {
            trace!("Dropping {} bytes written to a disposed emulator", data.len());
            return;
        }
        trace!("Terminal emulator processing {} bytes of output", data.len());
        self.parser.process(data.as_bytes());

        // New output snaps the view back to the live screen
        if self.parser.screen().scrollback() > 0 {
            self.parser.set_scrollback(0);
        }
    }

    /// Write one colored status line, starting on a fresh line
    pub fn write_status(&mut self, level: StatusLevel, text: &str) {
        let (_, col) = self.parser.screen().cursor_position();
        let prefix = if col > 0 { "\r\n" } else { "" };
        let line = format!("{}\x1b[{}m{}\x1b[0m\r\n", prefix, level.sgr(), text);
        self.write(&line);
    }

    pub fn on_user_input(&mut self, handler: InputHandler) -> HandlerToken {
        let token = self.allocate_token();
        self.input_handlers.push((token, handler));
        token
    }

    pub fn on_resize(&mut self, handler: ResizeHandler) -> HandlerToken {
        let token = self.allocate_token();
        self.resize_handlers.push((token, handler));
        token
    }

    /// Remove a handler. Returns false when the token was already detached.
    pub fn detach(&mut self, token: HandlerToken) -> bool {
        let before = self.input_handlers.len() + self.resize_handlers.len();
        self.input_handlers.retain(|(t, _)| *t != token);
        self.resize_handlers.retain(|(t, _)| *t != token);
        before != self.input_handlers.len() + self.resize_handlers.len()
    }

    pub fn handler_count(&self) -> usize {
        self.input_handlers.len() + self.resize_handlers.len()
    }

    /// Keystrokes typed by the user, already encoded as terminal input
    pub fn feed_user_input(&mut self, data: &str) {
        if self.disposed || data.is_empty() {
            return;
        }
        for (_, handler) in self.input_handlers.iter_mut() {
            handler(data);
        }
    }

    /// Report the container's current pixel size
    pub fn observe(&mut self, container: ContainerSize) {
        self.container = container;
        self.refit();
    }

    pub fn set_theme(&mut self, theme: TerminalTheme) {
        self.theme = theme;
    }

    pub fn set_font_size(&mut self, font_size: u16) -> Result<(), TerminalError> {
        if !is_valid_font_size(font_size) {
            return Err(TerminalError::InvalidFontSize(font_size));
        }
        self.font_size = font_size;
        self.refit();
        Ok(())
    }

    fn refit(&mut self) {
        if self.disposed {
            return;
        }
        let geometry = fit_geometry(self.container, self.font_size);
        if geometry == self.geometry {
            return;
        }
        debug!("Terminal geometry changed {} -> {}", self.geometry, geometry);
        self.geometry = geometry;
        self.parser.set_size(geometry.rows, geometry.cols);
        for (_, handler) in self.resize_handlers.iter_mut() {
            handler(geometry);
        }
    }

    /// Release handlers and stop accepting output. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        debug!("Disposing terminal emulator");
        self.input_handlers.clear();
        self.resize_handlers.clear();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn clear(&mut self) {
        self.parser = vt100::Parser::new(self.geometry.rows, self.geometry.cols, self.scrollback_lines);
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let offset = self.parser.screen().scrollback();
        self.parser.set_scrollback(offset.saturating_add(lines));
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let offset = self.parser.screen().scrollback();
        self.parser.set_scrollback(offset.saturating_sub(lines));
    }

    pub fn scroll_to_bottom(&mut self) {
        self.parser.set_scrollback(0);
    }

    /// Lines scrolled back from the live screen (0 = bottom)
    pub fn scroll_offset(&self) -> usize {
        self.parser.screen().scrollback()
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn theme(&self) -> TerminalTheme {
        self.theme
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    /// Plain text of the visible screen
    pub fn contents(&self) -> String {
        self.parser.screen().contents()
    }

    pub fn screen(&self) -> &vt100::Screen {
        self.parser.screen()
    }

    fn allocate_token(&mut self) -> HandlerToken {
        self.next_token += 1;
        HandlerToken(self.next_token)
    }

    /// Convert a vt100 color to the themed ratatui color
    fn themed_color(color: vt100::Color, default: Color, palette: &Palette) -> Color {
        match color {
            vt100::Color::Default => default,
            vt100::Color::Idx(n) if n < 16 => palette.ansi[n as usize],
            vt100::Color::Idx(n) => Color::Indexed(n),
            vt100::Color::Rgb(r, g, b) => Color::Rgb(r, g, b),
        }
    }

    fn cell_style(cell: &vt100::Cell, palette: &Palette) -> Style {
        let mut style = Style::default()
            .fg(Self::themed_color(cell.fgcolor(), palette.foreground, palette))
            .bg(Self::themed_color(cell.bgcolor(), palette.background, palette));

        if cell.bold() {
            style = style.add_modifier(Modifier::BOLD);
        }
        if cell.italic() {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if cell.underline() {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        if cell.inverse() {
            style = style.add_modifier(Modifier::REVERSED);
        }
        style
    }
}

impl Widget for &TerminalEmulator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let palette = self.theme.palette();
        buf.set_style(
            area,
            Style::default().fg(palette.foreground).bg(palette.background),
        );

        let screen = self.parser.screen();
        let rows = self.geometry.rows.min(area.height);
        let cols = self.geometry.cols.min(area.width);

        for row in 0..rows {
            for col in 0..cols {
                let Some(cell) = screen.cell(row, col) else {
                    continue;
                };
                if cell.is_wide_continuation() {
                    continue;
                }
                let contents = cell.contents();
                let symbol = if contents.is_empty() { " " } else { contents.as_str() };
                buf.get_mut(area.x + col, area.y + row)
                    .set_symbol(symbol)
                    .set_style(TerminalEmulator::cell_style(cell, &palette));
            }
        }

        // Cursor only on the live screen
        let scrollback = screen.scrollback();
        if !screen.hide_cursor() && scrollback == 0 {
            let (cursor_row, cursor_col) = screen.cursor_position();
            if cursor_row < rows && cursor_col < cols {
                buf.get_mut(area.x + cursor_col, area.y + cursor_row)
                    .set_style(Style::default().fg(palette.background).bg(palette.cursor));
            }
        }

        if scrollback > 0 && area.width > 4 {
            let indicator = format!(" ▲ {} lines above ", scrollback);
            let width = indicator.chars().count() as u16;
            let x = area.right().saturating_sub(width.min(area.width));
            buf.set_string(
                x,
                area.y,
                indicator,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    fn container(cols: u16, rows: u16) -> ContainerSize {
        ContainerSize::from_cells(cols, rows, CellMetrics::for_font(14))
    }

    fn emulator(cols: u16, rows: u16) -> TerminalEmulator {
        TerminalEmulator::create(container(cols, rows), TerminalTheme::Dark, 14).unwrap()
    }

    #[test]
    fn test_geometry_fits_container_at_default_font() {
        let term = emulator(100, 30);
        assert_eq!(term.geometry(), Geometry { cols: 100, rows: 30 });
    }

    #[test]
    fn test_larger_font_yields_fewer_cells() {
        let geometry = fit_geometry(ContainerSize::new(1200, 480), 20);
        assert_eq!(geometry, Geometry { cols: 100, rows: 20 });
        assert_eq!(fit_geometry(ContainerSize::new(0, 0), 14), Geometry { cols: 2, rows: 2 });
    }

    #[test]
    fn test_create_rejects_bad_font_size() {
        let result = TerminalEmulator::create(container(80, 24), TerminalTheme::Dark, 2);
        assert!(matches!(result, Err(TerminalError::InvalidFontSize(2))));
    }

    #[test]
    fn test_output_concatenates_in_order() {
        let mut term = emulator(40, 5);
        for chunk in ["hel", "lo ", "wor", "ld"] {
            term.write(chunk);
        }
        assert!(term.contents().starts_with("hello world"));
    }

    #[test]
    fn test_status_line_is_colored_and_on_its_own_line() {
        let mut term = emulator(40, 5);
        term.write("$ ");
        term.write_status(StatusLevel::Error, "Connection closed unexpectedly");

        let screen = term.screen();
        assert_eq!(screen.cell(1, 0).unwrap().contents(), "C");
        assert_eq!(screen.cell(1, 0).unwrap().fgcolor(), vt100::Color::Idx(1));
        assert_eq!(screen.cursor_position(), (2, 0));
    }

    #[test]
    fn test_resize_handlers_fire_only_on_change() {
        let mut term = emulator(80, 24);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        term.on_resize(Box::new(move |g| sink.lock().unwrap().push(g)));

        term.observe(container(80, 24));
        term.observe(container(100, 30));
        term.observe(container(100, 30));
        assert_eq!(*seen.lock().unwrap(), vec![Geometry { cols: 100, rows: 30 }]);
    }

    #[test]
    fn test_font_size_change_refits() {
        let mut term = emulator(80, 24);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        term.on_resize(Box::new(move |g| sink.lock().unwrap().push(g)));

        term.set_font_size(20).unwrap();
        assert_eq!(term.font_size(), 20);
        // 80 * 8px / 12px, 24 * 17px / 24px
        assert_eq!(term.geometry(), Geometry { cols: 53, rows: 17 });
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(term.set_font_size(99).is_err());
        assert_eq!(term.font_size(), 20);
    }

    #[test]
    fn test_set_theme_keeps_screen() {
        let mut term = emulator(40, 5);
        term.write("kept");
        term.set_theme(TerminalTheme::Solarized);
        assert_eq!(term.theme(), TerminalTheme::Solarized);
        assert!(term.contents().starts_with("kept"));
    }

    #[test]
    fn test_detached_input_handler_is_not_called() {
        let mut term = emulator(40, 5);
        let typed = Arc::new(Mutex::new(String::new()));
        let sink = typed.clone();
        let token = term.on_user_input(Box::new(move |data| sink.lock().unwrap().push_str(data)));

        term.feed_user_input("ls");
        assert!(term.detach(token));
        assert!(!term.detach(token));
        term.feed_user_input("pwd");
        assert_eq!(*typed.lock().unwrap(), "ls");
    }

    #[test]
    fn test_dispose_is_idempotent_and_silences_adapter() {
        let mut term = emulator(40, 5);
        term.on_user_input(Box::new(|_| {}));
        term.on_resize(Box::new(|_| {}));
        term.dispose();
        term.dispose();
        assert!(term.is_disposed());
        assert_eq!(term.handler_count(), 0);

        term.write("ignored");
        assert!(!term.contents().contains("ignored"));
    }

    #[test]
    fn test_scrollback_is_bounded() {
        let mut term =
            TerminalEmulator::create_with_scrollback(container(20, 4), TerminalTheme::Dark, 14, 5)
                .unwrap();
        for i in 0..20 {
            term.write(&format!("line{}\r\n", i));
        }
        term.scroll_up(1000);
        assert_eq!(term.scroll_offset(), 5);

        term.write("x");
        assert_eq!(term.scroll_offset(), 0);
    }

    #[test]
    fn test_render_applies_theme_colors() {
        let mut term = emulator(10, 2);
        term.write("\x1b[31mR\x1b[0mx");
        let area = Rect::new(0, 0, 10, 2);
        let mut buf = Buffer::empty(area);
        (&term).render(area, &mut buf);

        let palette = TerminalTheme::Dark.palette();
        assert_eq!(buf.get(0, 0).symbol(), "R");
        assert_eq!(buf.get(0, 0).fg, palette.ansi[1]);
        assert_eq!(buf.get(1, 0).fg, palette.foreground);
        assert_eq!(buf.get(5, 1).bg, palette.background);
    }

    #[test]
    fn test_smaller_font_never_exceeds_pane() {
        let mut term = emulator(80, 24);
        term.set_font_size(8).unwrap();
        assert_eq!(term.geometry(), Geometry { cols: 80, rows: 24 });

        term.set_font_size(20).unwrap();
        assert_eq!(term.geometry(), Geometry { cols: 53, rows: 17 });
    }

    #[test]
    fn test_wrapped_output_in_smallest_pane() {
        for (cols, rows) in [(0, 0), (1, 1), (20, 1)] {
            let mut term = emulator(cols, rows);
            assert!(term.geometry().rows >= Geometry::MIN_ROWS);
            term.write_status(StatusLevel::Info, "Connecting to pod default/web-1 (app)...");
            term.write("a line long enough to wrap several times in a tiny pane\r\n");
            term.write("漢字 wide glyphs wrap too");
        }
    }

    #[test]
    fn test_default_container_is_standard_pane() {
        let term = TerminalEmulator::create(ContainerSize::default(), TerminalTheme::Dark, 14).unwrap();
        assert_eq!(term.geometry(), Geometry { cols: 80, rows: 24 });
    }

    #[test]
    fn test_last_line_renders_after_font_shrink() {
        let mut term = emulator(80, 24);
        term.set_font_size(13).unwrap();
        for i in 0..40 {
            term.write(&format!("line{}\r\n", i));
        }
        term.write("PROMPT$ ");

        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        (&term).render(area, &mut buf);
        let last_row: String = (0..8).map(|x| buf.get(x, 23).symbol().to_string()).collect();
        assert_eq!(last_row, "PROMPT$ ");
    }
}
