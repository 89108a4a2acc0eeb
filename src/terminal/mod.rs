// ABOUTME: Terminal module for interactive pod and node shells over WebSocket
// Session lifecycle, PTY bridge wire protocol, emulator adapter and telemetry

pub mod endpoint;
pub mod error;
pub mod events;
pub mod keepalive;
pub mod protocol;
pub mod session;
pub mod target;
pub mod terminal_emulator;
pub mod theme;
pub mod timers;
pub mod traffic;
pub mod websocket_client;

pub use endpoint::EndpointConfig;
pub use error::{CloseKind, TerminalError};
pub use events::{ChannelEvent, SessionEpoch, SessionEvent, TimerKind};
pub use protocol::{Frame, Geometry};
pub use session::{Appearance, ConnectionIndicator, SessionController, SessionState, SessionTimings};
pub use target::{PodInfo, SelectionEvent, SessionTarget, TargetSelection};
pub use terminal_emulator::{ContainerSize, StatusLevel, TerminalEmulator};
pub use theme::{CellMetrics, TerminalTheme};
pub use traffic::{format_rate, TrafficRates};
pub use websocket_client::{ChannelConnector, ChannelSink, TransportChannel, WebSocketConnector};
