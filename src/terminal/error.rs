// ABOUTME: Error types for the remote terminal session
// Defines the failure conditions contained at the transport and adapter boundaries

use thiserror::Error;

/// Close code sent and expected for an intentional, orderly shutdown
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close code reported when the peer sent a close frame without a status
pub const NO_STATUS_RECEIVED: u16 = 1005;

/// Close code reported when the connection dropped without a close frame
pub const ABNORMAL_CLOSURE: u16 = 1006;

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connection closed unexpectedly (code {code}): {reason}")]
    AbnormalClosure { code: u16, reason: String },

    #[error("Session target is not resolved: {0}")]
    UnresolvedTarget(String),

    #[error("Invalid terminal endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Font size {0} is outside the supported range")]
    InvalidFontSize(u16),
}

impl From<url::ParseError> for TerminalError {
    fn from(err: url::ParseError) -> Self {
        TerminalError::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for TerminalError {
    fn from(err: serde_json::Error) -> Self {
        TerminalError::MalformedFrame(err.to_string())
    }
}

/// How a channel closure should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    Normal,
    Abnormal,
}

impl CloseKind {
    pub fn from_code(code: u16) -> Self {
        if code == NORMAL_CLOSURE {
            CloseKind::Normal
        } else {
            CloseKind::Abnormal
        }
    }
}
