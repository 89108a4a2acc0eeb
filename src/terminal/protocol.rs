// ABOUTME: Wire protocol definitions for PTY bridge communication
// JSON frames exchanged with the dashboard's pod and node terminal endpoints

use crate::terminal::error::TerminalError;
use serde::{Deserialize, Serialize};

// ============================================
// Frames
// ============================================

/// One discrete message exchanged over the transport channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frame {
    // Client → PTY bridge
    Stdin { data: String },
    Resize { cols: u16, rows: u16 },
    Ping,

    // PTY bridge → Client
    Stdout { data: String },
    Stderr { data: String },
    Info { data: String },
    Connected { data: String },
    Error { data: String },
    Pong,
}

impl Frame {
    /// Create a stdin frame
    pub fn stdin(data: impl Into<String>) -> Self {
        Frame::Stdin { data: data.into() }
    }

    /// Create a resize frame
    pub fn resize(geometry: Geometry) -> Self {
        Frame::Resize {
            cols: geometry.cols,
            rows: geometry.rows,
        }
    }

    /// Serialize to the JSON text sent over the socket
    pub fn encode(&self) -> Result<String, TerminalError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a JSON text frame received from the socket
    pub fn decode(text: &str) -> Result<Self, TerminalError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Name of the `type` discriminator, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Stdin { .. } => "stdin",
            Frame::Resize { .. } => "resize",
            Frame::Ping => "ping",
            Frame::Stdout { .. } => "stdout",
            Frame::Stderr { .. } => "stderr",
            Frame::Info { .. } => "info",
            Frame::Connected { .. } => "connected",
            Frame::Error { .. } => "error",
            Frame::Pong => "pong",
        }
    }
}

// ============================================
// Geometry
// ============================================

/// Terminal column/row dimensions as perceived by the emulator viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    pub cols: u16,
    pub rows: u16,
}

impl Geometry {
    pub const MIN_COLS: u16 = 2;
    /// vt100 needs a second row to scroll a wrapped line
    pub const MIN_ROWS: u16 = 2;

    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols: cols.max(Self::MIN_COLS),
            rows: rows.max(Self::MIN_ROWS),
        }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self { cols: 80, rows: 24 }
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}
