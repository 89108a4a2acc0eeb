// ABOUTME: Events posted to the session controller by channels, timers and the emulator
// Every event carries the epoch of the session generation that produced it

use crate::terminal::protocol::{Frame, Geometry};
use std::fmt;
use tokio::sync::mpsc;

/// Identity of one session generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SessionEpoch(u64);

impl SessionEpoch {
    pub fn next(self) -> Self {
        SessionEpoch(self.0 + 1)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the transport reports about its socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Frame(Frame),
    Closed { code: u16, reason: String },
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Keepalive,
    TrafficSample,
    ResizeDebounce,
    ResizeSettle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Channel {
        epoch: SessionEpoch,
        event: ChannelEvent,
    },
    UserInput {
        epoch: SessionEpoch,
        data: String,
    },
    GeometryChanged {
        epoch: SessionEpoch,
        geometry: Geometry,
    },
    Timer {
        epoch: SessionEpoch,
        timer: TimerKind,
    },
}

impl SessionEvent {
    pub fn epoch(&self) -> SessionEpoch {
        match self {
            SessionEvent::Channel { epoch, .. }
            | SessionEvent::UserInput { epoch, .. }
            | SessionEvent::GeometryChanged { epoch, .. }
            | SessionEvent::Timer { epoch, .. } => *epoch,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;
