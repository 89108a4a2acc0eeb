// ABOUTME: Color themes and font sizing for the terminal emulator
// Palettes are applied live; font size drives the cell metrics used to fit geometry

use ratatui::style::Color;
use std::fmt;
use std::str::FromStr;

pub const MIN_FONT_SIZE: u16 = 8;
pub const MAX_FONT_SIZE: u16 = 32;
pub const DEFAULT_FONT_SIZE: u16 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminalTheme {
    #[default]
    Dark,
    Light,
    Solarized,
    Monokai,
}

/// Resolved colors for a theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub foreground: Color,
    pub background: Color,
    pub cursor: Color,
    pub ansi: [Color; 16],
}

impl TerminalTheme {
    pub const ALL: [TerminalTheme; 4] = [
        TerminalTheme::Dark,
        TerminalTheme::Light,
        TerminalTheme::Solarized,
        TerminalTheme::Monokai,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TerminalTheme::Dark => "dark",
            TerminalTheme::Light => "light",
            TerminalTheme::Solarized => "solarized",
            TerminalTheme::Monokai => "monokai",
        }
    }

    /// The theme after this one, wrapping around
    pub fn next(&self) -> Self {
        let index = Self::ALL.iter().position(|t| t == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn palette(&self) -> Palette {
        match self {
            TerminalTheme::Dark => Palette {
                foreground: Color::Rgb(0xd4, 0xd4, 0xd4),
                background: Color::Rgb(0x1e, 0x1e, 0x1e),
                cursor: Color::Rgb(0xff, 0xff, 0xff),
                ansi: [
                    Color::Rgb(0x00, 0x00, 0x00),
                    Color::Rgb(0xcd, 0x31, 0x31),
                    Color::Rgb(0x0d, 0xbc, 0x79),
                    Color::Rgb(0xe5, 0xe5, 0x10),
                    Color::Rgb(0x24, 0x72, 0xc8),
                    Color::Rgb(0xbc, 0x3f, 0xbc),
                    Color::Rgb(0x11, 0xa8, 0xcd),
                    Color::Rgb(0xe5, 0xe5, 0xe5),
                    Color::Rgb(0x66, 0x66, 0x66),
                    Color::Rgb(0xf1, 0x4c, 0x4c),
                    Color::Rgb(0x23, 0xd1, 0x8b),
                    Color::Rgb(0xf5, 0xf5, 0x43),
                    Color::Rgb(0x3b, 0x8e, 0xea),
                    Color::Rgb(0xd6, 0x70, 0xd6),
                    Color::Rgb(0x29, 0xb8, 0xdb),
                    Color::Rgb(0xff, 0xff, 0xff),
                ],
            },
            TerminalTheme::Light => Palette {
                foreground: Color::Rgb(0x33, 0x33, 0x33),
                background: Color::Rgb(0xff, 0xff, 0xff),
                cursor: Color::Rgb(0x00, 0x00, 0x00),
                ansi: [
                    Color::Rgb(0x00, 0x00, 0x00),
                    Color::Rgb(0xcd, 0x31, 0x31),
                    Color::Rgb(0x00, 0xbc, 0x00),
                    Color::Rgb(0x94, 0x98, 0x00),
                    Color::Rgb(0x04, 0x51, 0xa5),
                    Color::Rgb(0xbc, 0x05, 0xbc),
                    Color::Rgb(0x05, 0x98, 0xbc),
                    Color::Rgb(0x55, 0x55, 0x55),
                    Color::Rgb(0x66, 0x66, 0x66),
                    Color::Rgb(0xcd, 0x31, 0x31),
                    Color::Rgb(0x14, 0xce, 0x14),
                    Color::Rgb(0xb5, 0xba, 0x00),
                    Color::Rgb(0x04, 0x51, 0xa5),
                    Color::Rgb(0xbc, 0x05, 0xbc),
                    Color::Rgb(0x05, 0x98, 0xbc),
                    Color::Rgb(0xa5, 0xa5, 0xa5),
                ],
            },
            TerminalTheme::Solarized => Palette {
                foreground: Color::Rgb(0x83, 0x94, 0x96),
                background: Color::Rgb(0x00, 0x2b, 0x36),
                cursor: Color::Rgb(0x93, 0xa1, 0xa1),
                ansi: [
                    Color::Rgb(0x07, 0x36, 0x42),
                    Color::Rgb(0xdc, 0x32, 0x2f),
                    Color::Rgb(0x85, 0x99, 0x00),
                    Color::Rgb(0xb5, 0x89, 0x00),
                    Color::Rgb(0x26, 0x8b, 0xd2),
                    Color::Rgb(0xd3, 0x36, 0x82),
                    Color::Rgb(0x2a, 0xa1, 0x98),
                    Color::Rgb(0xee, 0xe8, 0xd5),
                    Color::Rgb(0x00, 0x2b, 0x36),
                    Color::Rgb(0xcb, 0x4b, 0x16),
                    Color::Rgb(0x58, 0x6e, 0x75),
                    Color::Rgb(0x65, 0x7b, 0x83),
                    Color::Rgb(0x83, 0x94, 0x96),
                    Color::Rgb(0x6c, 0x71, 0xc4),
                    Color::Rgb(0x93, 0xa1, 0xa1),
                    Color::Rgb(0xfd, 0xf6, 0xe3),
                ],
            },
            TerminalTheme::Monokai => Palette {
                foreground: Color::Rgb(0xf8, 0xf8, 0xf2),
                background: Color::Rgb(0x27, 0x28, 0x22),
                cursor: Color::Rgb(0xf8, 0xf8, 0xf0),
                ansi: [
                    Color::Rgb(0x27, 0x28, 0x22),
                    Color::Rgb(0xf9, 0x26, 0x72),
                    Color::Rgb(0xa6, 0xe2, 0x2e),
                    Color::Rgb(0xf4, 0xbf, 0x75),
                    Color::Rgb(0x66, 0xd9, 0xef),
                    Color::Rgb(0xae, 0x81, 0xff),
                    Color::Rgb(0xa1, 0xef, 0xe4),
                    Color::Rgb(0xf8, 0xf8, 0xf2),
                    Color::Rgb(0x75, 0x71, 0x5e),
                    Color::Rgb(0xf9, 0x26, 0x72),
                    Color::Rgb(0xa6, 0xe2, 0x2e),
                    Color::Rgb(0xf4, 0xbf, 0x75),
                    Color::Rgb(0x66, 0xd9, 0xef),
                    Color::Rgb(0xae, 0x81, 0xff),
                    Color::Rgb(0xa1, 0xef, 0xe4),
                    Color::Rgb(0xf9, 0xf8, 0xf5),
                ],
            },
        }
    }
}

impl fmt::Display for TerminalTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TerminalTheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown terminal theme '{}'", s))
    }
}

/// Size in pixels of one character cell at a given font size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics {
    pub width: u32,
    pub height: u32,
}

impl CellMetrics {
    /// Monospace approximation: 0.6em wide, 1.2em line height, rounded
    pub fn for_font(font_size: u16) -> Self {
        let size = u32::from(font_size.max(1));
        Self {
            width: ((size * 6 + 5) / 10).max(1),
            height: ((size * 12 + 5) / 10).max(1),
        }
    }
}

pub fn is_valid_font_size(font_size: u16) -> bool {
    (MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&font_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_names_round_trip_through_from_str() {
        for theme in TerminalTheme::ALL {
            assert_eq!(theme.name().parse::<TerminalTheme>().unwrap(), theme);
        }
        assert_eq!("  Solarized ".parse::<TerminalTheme>().unwrap(), TerminalTheme::Solarized);
        assert!("neon".parse::<TerminalTheme>().is_err());
    }

    #[test]
    fn test_theme_cycle_wraps() {
        assert_eq!(TerminalTheme::Dark.next(), TerminalTheme::Light);
        assert_eq!(TerminalTheme::Monokai.next(), TerminalTheme::Dark);
    }

    #[test]
    fn test_cell_metrics() {
        assert_eq!(CellMetrics::for_font(14), CellMetrics { width: 8, height: 17 });
        assert_eq!(CellMetrics::for_font(20), CellMetrics { width: 12, height: 24 });
        assert_eq!(CellMetrics::for_font(0), CellMetrics { width: 1, height: 1 });
    }

    #[test]
    fn test_font_size_bounds() {
        assert!(is_valid_font_size(DEFAULT_FONT_SIZE));
        assert!(is_valid_font_size(MIN_FONT_SIZE));
        assert!(is_valid_font_size(MAX_FONT_SIZE));
        assert!(!is_valid_font_size(7));
        assert!(!is_valid_font_size(33));
    }
}
