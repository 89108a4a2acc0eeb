// ABOUTME: Session lifecycle controller for interactive pod and node terminals
// Owns the state machine and the single live emulator/channel generation

use crate::terminal::{
    endpoint::EndpointConfig,
    error::{CloseKind, TerminalError, NORMAL_CLOSURE},
    events::{
        ChannelEvent, EventReceiver, EventSender, SessionEpoch, SessionEvent, TimerKind,
    },
    keepalive::KeepaliveMonitor,
    protocol::{Frame, Geometry},
    target::{SessionTarget, TargetSelection},
    terminal_emulator::{
        ContainerSize, HandlerToken, StatusLevel, TerminalEmulator, DEFAULT_SCROLLBACK_LINES,
    },
    theme::{is_valid_font_size, TerminalTheme, DEFAULT_FONT_SIZE},
    timers::SessionTimers,
    traffic::{TrafficMeter, TrafficRates},
    websocket_client::{ChannelConnector, ChannelSink, TransportChannel},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Connected,
    Closed { reason: String, code: u16 },
    TransportError(String),
}

/// What the connection indicator shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionIndicator {
    Connected,
    Connecting,
    Disconnected,
}

impl ConnectionIndicator {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionIndicator::Connected => "Connected",
            ConnectionIndicator::Connecting => "Connecting",
            ConnectionIndicator::Disconnected => "Disconnected",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ConnectionIndicator::Connected => "●",
            ConnectionIndicator::Connecting => "◌",
            ConnectionIndicator::Disconnected => "○",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    pub keepalive_interval: Duration,
    pub sample_interval: Duration,
    pub rate_window: Duration,
    pub resize_debounce: Duration,
    pub resize_settle: Duration,
    pub scrollback_lines: usize,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            keepalive_interval: Duration::from_secs(30),
            sample_interval: Duration::from_millis(500),
            rate_window: Duration::from_secs(3),
            resize_debounce: Duration::from_millis(100),
            resize_settle: Duration::from_millis(100),
            scrollback_lines: DEFAULT_SCROLLBACK_LINES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appearance {
    pub theme: TerminalTheme,
    pub font_size: u16,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            theme: TerminalTheme::default(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

/// Everything owned by one session generation
struct Generation {
    target: SessionTarget,
    url: Option<Url>,
    emulator: TerminalEmulator,
    channel: Option<Box<dyn TransportChannel>>,
    handlers: Vec<HandlerToken>,
    timers: SessionTimers,
    last_sent_geometry: Option<Geometry>,
}

pub struct SessionController {
    endpoint: EndpointConfig,
    cluster: String,
    connector: Arc<dyn ChannelConnector>,
    timings: SessionTimings,
    appearance: Appearance,
    container: ContainerSize,

    target: Option<SessionTarget>,
    state: SessionState,
    epoch: SessionEpoch,
    generation: Option<Generation>,

    events_tx: EventSender,
    events_rx: EventReceiver,

    traffic: TrafficMeter,
    keepalive: KeepaliveMonitor,
    teardowns: u64,
}

impl SessionController {
    pub fn new(
        endpoint: EndpointConfig,
        cluster: impl Into<String>,
        connector: Arc<dyn ChannelConnector>,
        timings: SessionTimings,
        appearance: Appearance,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            endpoint,
            cluster: cluster.into(),
            connector,
            timings,
            appearance,
            container: ContainerSize::default(),
            target: None,
            state: SessionState::Idle,
            epoch: SessionEpoch::default(),
            generation: None,
            events_tx,
            events_rx,
            traffic: TrafficMeter::new(timings.rate_window),
            keepalive: KeepaliveMonitor::new(timings.keepalive_interval),
            teardowns: 0,
        }
    }

    // ============================================
    // Accessors
    // ============================================

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn indicator(&self) -> ConnectionIndicator {
        match self.state {
            SessionState::Connected => ConnectionIndicator::Connected,
            SessionState::Connecting => ConnectionIndicator::Connecting,
            _ => ConnectionIndicator::Disconnected,
        }
    }

    pub fn target(&self) -> Option<&SessionTarget> {
        self.target.as_ref()
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    pub fn url(&self) -> Option<&Url> {
        self.generation.as_ref().and_then(|g| g.url.as_ref())
    }

    pub fn rates(&self) -> TrafficRates {
        self.traffic.rates()
    }

    pub fn latency(&self) -> Option<Duration> {
        self.keepalive.latency()
    }

    pub fn appearance(&self) -> Appearance {
        self.appearance
    }

    pub fn emulator(&self) -> Option<&TerminalEmulator> {
        self.generation.as_ref().map(|g| &g.emulator)
    }

    pub fn emulator_mut(&mut self) -> Option<&mut TerminalEmulator> {
        self.generation.as_mut().map(|g| &mut g.emulator)
    }

    /// Number of generations torn down so far
    pub fn teardown_count(&self) -> u64 {
        self.teardowns
    }

    // ============================================
    // Target selection
    // ============================================

    /// Switch to a new target. Returns true when the session was rebuilt.
    pub fn set_target(&mut self, target: Option<SessionTarget>) -> bool {
        if target == self.target && (self.generation.is_some() || target.is_none()) {
            return false;
        }
        self.teardown();
        self.target = target;
        if self.target.is_some() {
            self.connect();
        }
        true
    }

    /// Resolve the selector state and follow it. An unresolved selection is
    /// expected while the selector settles; it tears down without an error.
    pub fn apply_selection(&mut self, selection: &TargetSelection) -> bool {
        match selection.resolve() {
            Ok(target) => self.set_target(Some(target)),
            Err(TerminalError::UnresolvedTarget(why)) => {
                debug!("Not connecting: {}", why);
                self.set_target(None)
            }
            Err(e) => {
                warn!("Unexpected selection error: {}", e);
                self.set_target(None)
            }
        }
    }

    /// Follow the cluster-context provider; a new cluster means a new session
    pub fn set_cluster(&mut self, cluster: impl Into<String>) -> bool {
        let cluster = cluster.into();
        if cluster == self.cluster {
            return false;
        }
        info!("Active cluster changed from {} to {}", self.cluster, cluster);
        self.cluster = cluster;
        if self.target.is_some() {
            self.teardown();
            self.connect();
            return true;
        }
        false
    }

    /// Start a fresh generation for the current target
    pub fn reconnect(&mut self) -> bool {
        if self.target.is_none() {
            return false;
        }
        self.teardown();
        self.connect();
        true
    }

    // ============================================
    // Generation lifecycle
    // ============================================

    fn connect(&mut self) {
        let Some(target) = self.target.clone() else {
            return;
        };
        self.epoch = self.epoch.next();
        let epoch = self.epoch;
        info!("Starting terminal session {} for {}", epoch, target);

        let mut emulator = match TerminalEmulator::create_with_scrollback(
            self.container,
            self.appearance.theme,
            self.appearance.font_size,
            self.timings.scrollback_lines,
        ) {
            Ok(emulator) => emulator,
            Err(e) => {
                error!("Failed to create terminal emulator: {}", e);
                self.state = SessionState::TransportError(e.to_string());
                return;
            }
        };

        let input_tx = self.events_tx.clone();
        let input_token = emulator.on_user_input(Box::new(move |data: &str| {
            let _ = input_tx.send(SessionEvent::UserInput {
                epoch,
                data: data.to_string(),
            });
        }));
        let resize_tx = self.events_tx.clone();
        let resize_token = emulator.on_resize(Box::new(move |geometry| {
            let _ = resize_tx.send(SessionEvent::GeometryChanged { epoch, geometry });
        }));

        // Fresh counters so a stale channel cannot report into this generation
        self.traffic = TrafficMeter::new(self.timings.rate_window);
        self.keepalive.reset();

        let mut generation = Generation {
            target: target.clone(),
            url: None,
            emulator,
            channel: None,
            handlers: vec![input_token, resize_token],
            timers: SessionTimers::new(epoch, self.events_tx.clone()),
            last_sent_geometry: None,
        };

        match self.endpoint.terminal_url(&target, &self.cluster) {
            Ok(url) => {
                generation
                    .emulator
                    .write_status(StatusLevel::Info, &format!("Connecting to {}...", target));
                let sink = ChannelSink::new(epoch, self.events_tx.clone(), self.traffic.counters());
                generation.channel = Some(self.connector.open(&url, sink));
                generation.url = Some(url);
                self.state = SessionState::Connecting;
            }
            Err(e) => {
                error!("Cannot build terminal URL for {}: {}", target, e);
                generation.emulator.write_status(StatusLevel::Error, &e.to_string());
                self.state = SessionState::TransportError(e.to_string());
            }
        }

        self.generation = Some(generation);
    }

    /// Tear down the current generation completely: timers, handlers,
    /// channel (closed normally) and emulator. Leaves the controller Idle.
    pub fn teardown(&mut self) {
        if let Some(mut generation) = self.generation.take() {
            debug!("Tearing down terminal session {} for {}", self.epoch, generation.target);
            generation.timers.cancel_all();
            for token in generation.handlers.drain(..) {
                generation.emulator.detach(token);
            }
            if let Some(mut channel) = generation.channel.take() {
                channel.close(NORMAL_CLOSURE);
            }
            generation.emulator.dispose();
            self.teardowns += 1;
        }
        // Anything still in flight for the old generation is now stale
        self.epoch = self.epoch.next();
        self.traffic = TrafficMeter::new(self.timings.rate_window);
        self.keepalive.reset();
        self.state = SessionState::Idle;
    }

    // ============================================
    // Event processing
    // ============================================

    /// Process every queued event without waiting
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            processed += 1;
        }
        processed
    }

    /// Wait for the next queued event
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        if event.epoch() != self.epoch {
            trace!("Dropping stale event from session {}", event.epoch());
            return;
        }
        match event {
            SessionEvent::Channel { event, .. } => self.handle_channel_event(event),
            SessionEvent::UserInput { data, .. } => self.send(Frame::stdin(data)),
            SessionEvent::GeometryChanged { geometry, .. } => {
                if self.state == SessionState::Connected {
                    trace!("Geometry now {}, debouncing resize", geometry);
                    if let Some(generation) = self.generation.as_mut() {
                        generation
                            .timers
                            .after(TimerKind::ResizeDebounce, self.timings.resize_debounce);
                    }
                }
            }
            SessionEvent::Timer { timer, .. } => match timer {
                TimerKind::Keepalive => self.send_keepalive(),
                TimerKind::TrafficSample => {
                    self.traffic.sample();
                }
                TimerKind::ResizeDebounce | TimerKind::ResizeSettle => self.send_current_geometry(),
            },
        }
    }

    fn handle_channel_event(&mut self, event: ChannelEvent) {
        let Some(generation) = self.generation.as_mut() else {
            return;
        };
        match event {
            ChannelEvent::Opened => {
                if self.state != SessionState::Connecting {
                    debug!("Ignoring open in state {:?}", self.state);
                    return;
                }
                info!("Terminal session {} connected", self.epoch);
                self.state = SessionState::Connected;
                generation
                    .timers
                    .every(TimerKind::Keepalive, self.timings.keepalive_interval);
                generation
                    .timers
                    .every(TimerKind::TrafficSample, self.timings.sample_interval);
                generation
                    .timers
                    .after(TimerKind::ResizeSettle, self.timings.resize_settle);
            }
            ChannelEvent::Frame(frame) => match frame {
                Frame::Stdout { data } | Frame::Stderr { data } => generation.emulator.write(&data),
                Frame::Connected { data } => {
                    generation.emulator.write_status(StatusLevel::Success, &data)
                }
                Frame::Info { data } => generation.emulator.write_status(StatusLevel::Info, &data),
                Frame::Error { data } => {
                    warn!("PTY bridge error: {}", data);
                    generation.emulator.write_status(StatusLevel::Error, &data)
                }
                Frame::Pong => {
                    self.keepalive.pong_received(Instant::now());
                }
                Frame::Stdin { .. } | Frame::Resize { .. } | Frame::Ping => {
                    debug!("Ignoring client-bound {} frame from server", frame.kind());
                }
            },
            ChannelEvent::Closed { code, reason } => {
                generation.timers.cancel_all();
                generation.channel = None;
                generation.last_sent_geometry = None;
                match CloseKind::from_code(code) {
                    CloseKind::Normal => {
                        info!("Terminal session {} closed", self.epoch);
                        generation
                            .emulator
                            .write_status(StatusLevel::Success, "Connection closed");
                    }
                    CloseKind::Abnormal => {
                        let err = TerminalError::AbnormalClosure {
                            code,
                            reason: reason.clone(),
                        };
                        warn!("Terminal session {}: {}", self.epoch, err);
                        let line = if reason.is_empty() {
                            format!("Connection closed unexpectedly (code {})", code)
                        } else {
                            format!("Connection closed unexpectedly (code {}): {}", code, reason)
                        };
                        generation.emulator.write_status(StatusLevel::Error, &line);
                    }
                }
                self.traffic.reset();
                self.keepalive.reset();
                self.state = SessionState::Closed { reason, code };
            }
            ChannelEvent::Error(message) => {
                let err = TerminalError::Transport(message.clone());
                error!("Terminal session {}: {}", self.epoch, err);
                generation.timers.cancel_all();
                generation
                    .emulator
                    .write_status(StatusLevel::Error, &format!("Connection error: {}", message));
                self.traffic.reset();
                self.state = SessionState::TransportError(message);
            }
        }
    }

    /// Send a frame on the live channel; dropped silently when not connected
    fn send(&mut self, frame: Frame) {
        if self.state != SessionState::Connected {
            trace!("Not connected, dropping {} frame", frame.kind());
            return;
        }
        if let Some(channel) = self.generation.as_mut().and_then(|g| g.channel.as_mut()) {
            if channel.is_open() {
                channel.send(&frame);
            }
        }
    }

    fn send_current_geometry(&mut self) {
        if self.state != SessionState::Connected {
            return;
        }
        let Some(generation) = self.generation.as_mut() else {
            return;
        };
        let geometry = generation.emulator.geometry();
        if generation.last_sent_geometry == Some(geometry) {
            return;
        }
        let open = generation.channel.as_ref().map(|c| c.is_open()).unwrap_or(false);
        if !open {
            return;
        }
        debug!("Sending terminal resize {}", geometry);
        generation.last_sent_geometry = Some(geometry);
        self.send(Frame::resize(geometry));
    }

    fn send_keepalive(&mut self) {
        let open = self
            .generation
            .as_ref()
            .and_then(|g| g.channel.as_ref())
            .map(|c| c.is_open())
            .unwrap_or(false);
        if self.state != SessionState::Connected || !open {
            return;
        }
        self.send(Frame::Ping);
        self.keepalive.ping_sent(Instant::now());
    }

    // ============================================
    // Adapter-facing controls
    // ============================================

    /// Keystrokes from the user, routed through the emulator's input handlers
    pub fn input(&mut self, data: &str) {
        if let Some(generation) = self.generation.as_mut() {
            generation.emulator.feed_user_input(data);
        }
    }

    /// Report the terminal pane's current size
    pub fn observe_container(&mut self, container: ContainerSize) {
        self.container = container;
        if let Some(generation) = self.generation.as_mut() {
            generation.emulator.observe(container);
        }
    }

    pub fn set_theme(&mut self, theme: TerminalTheme) {
        self.appearance.theme = theme;
        if let Some(generation) = self.generation.as_mut() {
            generation.emulator.set_theme(theme);
        }
    }

    pub fn set_font_size(&mut self, font_size: u16) -> Result<(), TerminalError> {
        if !is_valid_font_size(font_size) {
            return Err(TerminalError::InvalidFontSize(font_size));
        }
        self.appearance.font_size = font_size;
        if let Some(generation) = self.generation.as_mut() {
            generation.emulator.set_font_size(font_size)?;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        if let Some(generation) = self.generation.as_mut() {
            generation.emulator.clear();
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}
