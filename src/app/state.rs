// ABOUTME: Application state for the terminal TUI and the App that drives the session
// Holds the target selector, view flags, the session controller and preferences

use crate::preferences::Preferences;
use crate::terminal::{
    session::{Appearance, SessionController},
    target::{SelectionEvent, TargetSelection},
    terminal_emulator::ContainerSize,
    theme::{CellMetrics, DEFAULT_FONT_SIZE, MAX_FONT_SIZE, MIN_FONT_SIZE},
};
use ratatui::layout::Rect;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Header, terminal pane and key hints
    Normal,
    /// Terminal pane only
    Fullscreen,
}

#[derive(Debug)]
pub struct AppState {
    pub selection: TargetSelection,
    pub view_mode: ViewMode,
    pub help_visible: bool,
    pub should_quit: bool,
    /// Last preference write failure, shown in the hint bar
    pub last_error: Option<String>,
}

impl AppState {
    pub fn new(selection: TargetSelection) -> Self {
        Self {
            selection,
            view_mode: ViewMode::Normal,
            help_visible: false,
            should_quit: false,
            last_error: None,
        }
    }

    pub fn toggle_help(&mut self) {
        self.help_visible = !self.help_visible;
    }

    pub fn toggle_fullscreen(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Normal => ViewMode::Fullscreen,
            ViewMode::Fullscreen => ViewMode::Normal,
        };
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

pub struct App {
    pub state: AppState,
    pub session: SessionController,
    preferences: Preferences,
}

impl App {
    pub fn new(state: AppState, session: SessionController, preferences: Preferences) -> Self {
        Self {
            state,
            session,
            preferences,
        }
    }

    /// Appearance restored from stored preferences
    pub fn stored_appearance(preferences: &Preferences) -> Appearance {
        Appearance {
            theme: preferences.theme(),
            font_size: preferences.font_size(),
        }
    }

    /// Connect to whatever the selector currently resolves to
    pub fn init(&mut self) {
        self.session.apply_selection(&self.state.selection);
    }

    /// Drain session events; returns how many were processed
    pub fn tick(&mut self) -> usize {
        self.session.pump()
    }

    pub fn select(&mut self, event: SelectionEvent) {
        if self.state.selection.apply(event) {
            self.session.apply_selection(&self.state.selection);
        }
    }

    /// Report the terminal pane's area in character cells
    pub fn observe_pane(&mut self, area: Rect) {
        let cell = CellMetrics::for_font(DEFAULT_FONT_SIZE);
        self.session
            .observe_container(ContainerSize::from_cells(area.width, area.height, cell));
    }

    pub fn cycle_theme(&mut self) {
        let theme = self.session.appearance().theme.next();
        info!("Switching terminal theme to {}", theme);
        self.session.set_theme(theme);
        if let Err(e) = self.preferences.set_theme(theme) {
            self.remember_error(e);
        }
    }

    pub fn adjust_font_size(&mut self, delta: i32) {
        let current = i32::from(self.session.appearance().font_size);
        let next = (current + delta).clamp(i32::from(MIN_FONT_SIZE), i32::from(MAX_FONT_SIZE)) as u16;
        if i32::from(next) == current {
            return;
        }
        if let Err(e) = self.session.set_font_size(next) {
            warn!("Rejected font size {}: {}", next, e);
            return;
        }
        if let Err(e) = self.preferences.set_font_size(next) {
            self.remember_error(e);
        }
    }

    pub fn shutdown(&mut self) {
        self.session.teardown();
    }

    fn remember_error(&mut self, error: anyhow::Error) {
        warn!("Failed to save preferences: {:#}", error);
        self.state.last_error = Some(format!("Preferences not saved: {}", error));
    }
}
