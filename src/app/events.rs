// ABOUTME: Event handling system for keyboard input and app actions
// Control keys live on function keys; everything else goes to the remote shell

use crate::app::state::App;
use crate::app::AppState;
use crate::terminal::target::{SelectionEvent, TargetSelection};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

const SCROLL_LINES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Quit,
    ToggleHelp,
    ToggleFullscreen,
    CycleTheme,
    DecreaseFontSize,
    IncreaseFontSize,
    NextTarget,
    NextContainer,
    Reconnect,
    ClearTerminal,
    ScrollUp,
    ScrollDown,
    /// Keystroke bytes for the remote shell
    Input(String),
    /// Pasted text, sent as a single stdin frame
    Paste(String),
}

pub struct EventHandler;

impl EventHandler {
    pub fn handle_key_event(key_event: KeyEvent, state: &AppState) -> Option<AppEvent> {
        if state.help_visible {
            return match key_event.code {
                KeyCode::F(1) | KeyCode::Esc => Some(AppEvent::ToggleHelp),
                _ => None,
            };
        }

        match (key_event.code, key_event.modifiers) {
            (KeyCode::Char('q'), m) if m.contains(KeyModifiers::CONTROL) => Some(AppEvent::Quit),
            (KeyCode::F(1), _) => Some(AppEvent::ToggleHelp),
            (KeyCode::F(2), _) => Some(AppEvent::CycleTheme),
            (KeyCode::F(3), _) => Some(AppEvent::DecreaseFontSize),
            (KeyCode::F(4), _) => Some(AppEvent::IncreaseFontSize),
            (KeyCode::F(5), _) => Some(AppEvent::NextTarget),
            (KeyCode::F(6), _) => Some(AppEvent::NextContainer),
            (KeyCode::F(7), _) => Some(AppEvent::Reconnect),
            (KeyCode::F(9), _) => Some(AppEvent::ClearTerminal),
            (KeyCode::F(11), _) => Some(AppEvent::ToggleFullscreen),
            (KeyCode::PageUp, m) if m.contains(KeyModifiers::SHIFT) => Some(AppEvent::ScrollUp),
            (KeyCode::PageDown, m) if m.contains(KeyModifiers::SHIFT) => Some(AppEvent::ScrollDown),
            _ => key_to_input(key_event).map(AppEvent::Input),
        }
    }

    pub fn process_event(event: AppEvent, app: &mut App) {
        match event {
            AppEvent::Quit => app.state.quit(),
            AppEvent::ToggleHelp => app.state.toggle_help(),
            AppEvent::ToggleFullscreen => app.state.toggle_fullscreen(),
            AppEvent::CycleTheme => app.cycle_theme(),
            AppEvent::DecreaseFontSize => app.adjust_font_size(-1),
            AppEvent::IncreaseFontSize => app.adjust_font_size(1),
            AppEvent::NextTarget => {
                let event = match app.state.selection {
                    TargetSelection::Pods { .. } => SelectionEvent::NextPod,
                    TargetSelection::Nodes { .. } => SelectionEvent::NextNode,
                };
                app.select(event);
            }
            AppEvent::NextContainer => {
                if matches!(app.state.selection, TargetSelection::Pods { .. }) {
                    app.select(SelectionEvent::NextContainer);
                }
            }
            AppEvent::Reconnect => {
                app.session.reconnect();
            }
            AppEvent::ClearTerminal => app.session.clear(),
            AppEvent::ScrollUp => {
                if let Some(emulator) = app.session.emulator_mut() {
                    emulator.scroll_up(SCROLL_LINES);
                }
            }
            AppEvent::ScrollDown => {
                if let Some(emulator) = app.session.emulator_mut() {
                    emulator.scroll_down(SCROLL_LINES);
                }
            }
            AppEvent::Input(data) | AppEvent::Paste(data) => app.session.input(&data),
        }
    }
}

/// Translate a key press into the bytes an xterm would send
pub fn key_to_input(key: KeyEvent) -> Option<String> {
    let data: Vec<u8> = match key.code {
        KeyCode::Char(c) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) && c.is_ascii() {
                vec![(c as u8) & 0x1f]
            } else if key.modifiers.contains(KeyModifiers::ALT) {
                let mut data = vec![0x1b];
                data.extend_from_slice(c.to_string().as_bytes());
                data
            } else {
                c.to_string().into_bytes()
            }
        }
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Tab => vec![b'\t'],
        KeyCode::BackTab => b"\x1b[Z".to_vec(),
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Esc => vec![0x1b],
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Home => b"\x1b[H".to_vec(),
        KeyCode::End => b"\x1b[F".to_vec(),
        KeyCode::PageUp => b"\x1b[5~".to_vec(),
        KeyCode::PageDown => b"\x1b[6~".to_vec(),
        KeyCode::Delete => b"\x1b[3~".to_vec(),
        KeyCode::Insert => b"\x1b[2~".to_vec(),
        // F1-F7, F9 and F11 are client controls
        KeyCode::F(8) => b"\x1b[19~".to_vec(),
        KeyCode::F(10) => b"\x1b[21~".to_vec(),
        KeyCode::F(12) => b"\x1b[24~".to_vec(),
        _ => {
            debug!("No terminal sequence for {:?}", key.code);
            return None;
        }
    };
    Some(String::from_utf8_lossy(&data).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_control_and_alt_sequences() {
        assert_eq!(
            key_to_input(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some("\x03".to_string())
        );
        assert_eq!(
            key_to_input(key(KeyCode::Char('b'), KeyModifiers::ALT)),
            Some("\x1bb".to_string())
        );
        assert_eq!(
            key_to_input(key(KeyCode::Char('é'), KeyModifiers::NONE)),
            Some("é".to_string())
        );
    }

    #[test]
    fn test_navigation_keys() {
        assert_eq!(key_to_input(key(KeyCode::Up, KeyModifiers::NONE)), Some("\x1b[A".to_string()));
        assert_eq!(key_to_input(key(KeyCode::Enter, KeyModifiers::NONE)), Some("\r".to_string()));
        assert_eq!(
            key_to_input(key(KeyCode::Delete, KeyModifiers::NONE)),
            Some("\x1b[3~".to_string())
        );
        assert_eq!(key_to_input(key(KeyCode::F(2), KeyModifiers::NONE)), None);
    }
}
