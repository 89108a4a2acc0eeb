// ABOUTME: WebSocket transport channel to the dashboard's PTY bridge
// Frames outbound input/resize/keepalive and demultiplexes inbound frames into session events

use crate::terminal::{
    error::{ABNORMAL_CLOSURE, NORMAL_CLOSURE, NO_STATUS_RECEIVED},
    events::{ChannelEvent, EventSender, SessionEpoch, SessionEvent},
    protocol::Frame,
    traffic::{Direction, TrafficCounters},
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::borrow::Cow;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::{frame::coding::CloseCode, CloseFrame};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// One open (or opening) duplex channel to the PTY bridge
pub trait TransportChannel: Send {
    fn is_open(&self) -> bool;

    /// Queue a frame. Frames are dropped silently while the channel is not open.
    fn send(&mut self, frame: &Frame);

    fn close(&mut self, code: u16);
}

/// Creates transport channels; the seam the controller opens sessions through
pub trait ChannelConnector: Send + Sync {
    fn open(&self, url: &Url, sink: ChannelSink) -> Box<dyn TransportChannel>;
}

/// Where a channel reports what happens on its socket. Inbound payloads are
/// decoded here so malformed frames never get past the channel boundary.
#[derive(Clone)]
pub struct ChannelSink {
    epoch: SessionEpoch,
    events: EventSender,
    traffic: Arc<TrafficCounters>,
}

impl ChannelSink {
    pub fn new(epoch: SessionEpoch, events: EventSender, traffic: Arc<TrafficCounters>) -> Self {
        Self {
            epoch,
            events,
            traffic,
        }
    }

    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    pub fn opened(&self) {
        self.emit(ChannelEvent::Opened);
    }

    /// Decode and forward one inbound text payload. Returns false when the
    /// payload was malformed and discarded.
    pub fn deliver(&self, text: &str) -> bool {
        self.traffic.record(Direction::Download, text.len());
        match Frame::decode(text) {
            Ok(frame) => {
                trace!("Received {} frame", frame.kind());
                self.emit(ChannelEvent::Frame(frame));
                true
            }
            Err(e) => {
                warn!("Discarding inbound payload ({} bytes): {}", text.len(), e);
                false
            }
        }
    }

    pub fn closed(&self, code: u16, reason: impl Into<String>) {
        self.emit(ChannelEvent::Closed {
            code,
            reason: reason.into(),
        });
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(ChannelEvent::Error(message.into()));
    }

    pub fn record_outbound(&self, bytes: usize) {
        self.traffic.record(Direction::Upload, bytes);
    }

    fn emit(&self, event: ChannelEvent) {
        if self
            .events
            .send(SessionEvent::Channel {
                epoch: self.epoch,
                event,
            })
            .is_err()
        {
            debug!("Session {} is gone, dropping channel event", self.epoch);
        }
    }
}

const STATE_CONNECTING: u8 = 0;
const STATE_OPEN: u8 = 1;
const STATE_CLOSING: u8 = 2;
const STATE_CLOSED: u8 = 3;

/// How long a client-initiated close waits for the server's echo
const CLOSE_ACK_TIMEOUT: Duration = Duration::from_secs(2);

enum Outbound {
    Text(String),
    Close(u16),
}

pub struct WebSocketChannel {
    url: String,
    state: Arc<AtomicU8>,
    outbound: mpsc::UnboundedSender<Outbound>,
    sink: ChannelSink,
    task: Option<JoinHandle<()>>,
}

impl WebSocketChannel {
    /// Open a channel; must be called from within a tokio runtime
    pub fn open(url: &Url, sink: ChannelSink) -> Self {
        let url = url.to_string();
        let state = Arc::new(AtomicU8::new(STATE_CONNECTING));
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        info!("Opening terminal channel to {} for session {}", url, sink.epoch());
        let task = tokio::spawn(Self::connection_handler(
            url.clone(),
            state.clone(),
            outbound_rx,
            sink.clone(),
        ));

        Self {
            url,
            state,
            outbound,
            sink,
            task: Some(task),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Handle a single WebSocket connection
    async fn connection_handler(
        url: String,
        state: Arc<AtomicU8>,
        mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
        sink: ChannelSink,
    ) {
        let ws_stream = match connect_async(url.as_str()).await {
            Ok((stream, response)) => {
                debug!("WebSocket response status: {:?}", response.status());
                stream
            }
            Err(e) => {
                error!("WebSocket handshake with {} failed: {}", url, e);
                state.store(STATE_CLOSED, Ordering::SeqCst);
                sink.error(format!("Failed to connect: {}", e));
                sink.closed(ABNORMAL_CLOSURE, e.to_string());
                return;
            }
        };

        // A close requested while the handshake was in flight wins
        if state
            .compare_exchange(STATE_CONNECTING, STATE_OPEN, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Channel closed during handshake, dropping socket");
            return;
        }
        info!("Terminal channel connected to {}", url);
        sink.opened();

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        loop {
            tokio::select! {
                outbound = outbound_rx.recv() => match outbound {
                    Some(Outbound::Text(text)) => {
                        if let Err(e) = ws_sender.send(Message::Text(text)).await {
                            error!("Failed to send WebSocket message: {}", e);
                            state.store(STATE_CLOSED, Ordering::SeqCst);
                            sink.error(e.to_string());
                            sink.closed(ABNORMAL_CLOSURE, e.to_string());
                            break;
                        }
                    }
                    Some(Outbound::Close(code)) => {
                        debug!("Closing terminal channel with code {}", code);
                        Self::send_close(&mut ws_sender, code).await;
                        state.store(STATE_CLOSED, Ordering::SeqCst);
                        Self::await_close_ack(&mut ws_receiver).await;
                        break;
                    }
                    None => {
                        // Handle dropped without an explicit close
                        Self::send_close(&mut ws_sender, NORMAL_CLOSURE).await;
                        state.store(STATE_CLOSED, Ordering::SeqCst);
                        Self::await_close_ack(&mut ws_receiver).await;
                        break;
                    }
                },

                incoming = ws_receiver.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        sink.deliver(&text);
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        sink.deliver(&String::from_utf8_lossy(&bytes));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.to_string()))
                            .unwrap_or((NO_STATUS_RECEIVED, String::new()));
                        info!("WebSocket closed by server with code {}", code);
                        let _ = ws_sender.close().await;
                        state.store(STATE_CLOSED, Ordering::SeqCst);
                        sink.closed(code, reason);
                        break;
                    }
                    Some(Ok(_)) => {
                        // Control frames are answered by tungstenite
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        state.store(STATE_CLOSED, Ordering::SeqCst);
                        sink.error(e.to_string());
                        sink.closed(ABNORMAL_CLOSURE, e.to_string());
                        break;
                    }
                    None => {
                        warn!("WebSocket stream ended without a close frame");
                        state.store(STATE_CLOSED, Ordering::SeqCst);
                        sink.closed(ABNORMAL_CLOSURE, "connection lost");
                        break;
                    }
                },
            }
        }
    }

    async fn send_close<S>(ws_sender: &mut S, code: u16)
    where
        S: Sink<Message> + Unpin,
        S::Error: std::fmt::Display,
    {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: Cow::Borrowed(""),
        };
        if let Err(e) = ws_sender.send(Message::Close(Some(frame))).await {
            debug!("Close frame not delivered: {}", e);
        }
    }

    /// Finish the closing handshake: discard whatever the server still sends
    /// until it echoes the close frame, or give up after CLOSE_ACK_TIMEOUT
    async fn await_close_ack<S>(ws_receiver: &mut S)
    where
        S: Stream<Item = Result<Message, WsError>> + Unpin,
    {
        let drain = async {
            while let Some(Ok(message)) = ws_receiver.next().await {
                if let Message::Close(_) = message {
                    trace!("Server acknowledged close");
                    return true;
                }
            }
            false
        };
        match tokio::time::timeout(CLOSE_ACK_TIMEOUT, drain).await {
            Ok(true) => {}
            Ok(false) => debug!("Socket ended before the close acknowledgement"),
            Err(_) => debug!("No close acknowledgement within {:?}", CLOSE_ACK_TIMEOUT),
        }
    }
}

impl TransportChannel for WebSocketChannel {
    fn is_open(&self) -> bool {
        self.state.load(Ordering::SeqCst) == STATE_OPEN
    }

    fn send(&mut self, frame: &Frame) {
        if !self.is_open() {
            debug!("Channel not open, dropping {} frame", frame.kind());
            return;
        }
        let text = match frame.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to encode {} frame: {}", frame.kind(), e);
                return;
            }
        };
        self.sink.record_outbound(text.len());
        if self.outbound.send(Outbound::Text(text)).is_err() {
            debug!("Channel task finished, dropping {} frame", frame.kind());
        }
    }

    fn close(&mut self, code: u16) {
        match self.state.swap(STATE_CLOSING, Ordering::SeqCst) {
            STATE_OPEN => {
                let _ = self.outbound.send(Outbound::Close(code));
            }
            STATE_CONNECTING => {
                // No socket yet; stop the handshake
                if let Some(task) = self.task.take() {
                    task.abort();
                }
                self.state.store(STATE_CLOSED, Ordering::SeqCst);
            }
            previous => {
                // Already closing or closed
                self.state.store(previous, Ordering::SeqCst);
            }
        }
    }
}

impl Drop for WebSocketChannel {
    fn drop(&mut self) {
        if self.state.load(Ordering::SeqCst) == STATE_CONNECTING {
            if let Some(task) = self.task.take() {
                task.abort();
            }
        }
    }
}

/// Opens real WebSocket channels
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl ChannelConnector for WebSocketConnector {
    fn open(&self, url: &Url, sink: ChannelSink) -> Box<dyn TransportChannel> {
        Box::new(WebSocketChannel::open(url, sink))
    }
}
