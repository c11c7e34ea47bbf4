//! Connection-manager state machine.
//!
//! Everything the socket callbacks and UI handlers do to the chat goes through
//! [`ChatSession`]. It owns the message log and the single in-progress stream
//! handle, and tells the driver when a reconnect has to be (un)scheduled.

use chrono::Local;
use dioxus_logger::tracing::{debug, error, info, warn};
use shared_types::{decode_frame, ChunkPayload, ClientFrame, InboundFrame, SessionId};

use crate::chat::log::{ChatLog, Sender, StreamHandle};
use crate::config::{Labels, ReconnectPolicy, WidgetConfig};
use crate::error::WidgetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl ConnectionState {
    /// Status dot colour.
    pub fn color(self) -> &'static str {
        match self {
            Self::Connected => "#28a745",
            Self::Connecting => "#ffc107",
            Self::Disconnected | Self::Error => "#dc3545",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }
}

/// Timer work the driver must carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Reconnect { after_ms: u32 },
    CancelReconnect,
}

#[derive(Debug)]
pub struct ChatSession {
    session_id: SessionId,
    labels: Labels,
    reconnect: ReconnectPolicy,
    connection: ConnectionState,
    status_label: String,
    input: String,
    send_enabled: bool,
    log: ChatLog,
    stream: Option<StreamHandle>,
    reconnect_pending: bool,
    reconnect_attempt: u32,
    welcomed: bool,
}

impl ChatSession {
    pub fn new(session_id: SessionId, config: &WidgetConfig) -> Self {
        Self {
            session_id,
            labels: config.labels.clone(),
            reconnect: config.reconnect,
            connection: ConnectionState::Disconnected,
            status_label: config.labels.disconnected.clone(),
            input: String::new(),
            send_enabled: false,
            log: ChatLog::default(),
            stream: None,
            reconnect_pending: false,
            reconnect_attempt: 0,
            welcomed: false,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn status_label(&self) -> &str {
        &self.status_label
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn send_enabled(&self) -> bool {
        self.send_enabled
    }

    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    // ------------------------------------------------------------------------
    // Transport lifecycle
    // ------------------------------------------------------------------------

    pub fn on_connecting(&mut self) {
        self.set_status(ConnectionState::Connecting);
    }

    /// The socket could not even be constructed. Retried like a drop.
    pub fn on_connect_failed(&mut self, reason: &str) -> Option<Directive> {
        warn!("WebSocket could not be created: {}", reason);
        self.connection = ConnectionState::Error;
        self.status_label = self.labels.connect_failed.clone();
        self.schedule_reconnect()
    }

    pub fn on_open(&mut self) -> Option<Directive> {
        info!("WebSocket connected");
        self.set_status(ConnectionState::Connected);
        self.reconnect_attempt = 0;
        if self.reconnect_pending {
            self.reconnect_pending = false;
            return Some(Directive::CancelReconnect);
        }
        None
    }

    pub fn on_transport_error(&mut self, detail: &str) {
        error!("WebSocket error: {}", detail);
        self.set_status(ConnectionState::Error);
    }

    pub fn on_close(&mut self) -> Option<Directive> {
        info!("WebSocket disconnected");
        self.set_status(ConnectionState::Disconnected);
        self.schedule_reconnect()
    }

    /// The reconnect timer fired; the driver is about to connect again.
    pub fn on_reconnect_due(&mut self) {
        self.reconnect_pending = false;
    }

    fn schedule_reconnect(&mut self) -> Option<Directive> {
        if self.reconnect_pending {
            return None;
        }
        self.reconnect_pending = true;
        self.reconnect_attempt = self.reconnect_attempt.saturating_add(1);
        Some(Directive::Reconnect {
            after_ms: self.reconnect.delay_ms(self.reconnect_attempt),
        })
    }

    fn set_status(&mut self, state: ConnectionState) {
        self.connection = state;
        self.status_label = match state {
            ConnectionState::Connecting => &self.labels.connecting,
            ConnectionState::Connected => &self.labels.connected,
            ConnectionState::Disconnected => &self.labels.disconnected,
            ConnectionState::Error => &self.labels.connection_error,
        }
        .clone();
    }

    // ------------------------------------------------------------------------
    // Inbound frames
    // ------------------------------------------------------------------------

    pub fn on_raw_frame(&mut self, raw: &str) {
        match decode_frame(raw) {
            Ok(frame) => self.apply_frame(frame),
            Err(e) => error!("Dropping malformed frame ({}): {}", e, raw),
        }
    }

    pub fn apply_frame(&mut self, frame: InboundFrame) {
        debug!("Inbound {} frame", frame.kind());
        match frame {
            InboundFrame::Status(status) => {
                if status.is_processing() {
                    self.log.hide_typing();
                }
            }
            InboundFrame::Chunk(chunk) => self.apply_chunk(&chunk),
            InboundFrame::Error(report) => {
                warn!("Backend reported an error: {}", report.error);
                self.finish_stream();
                self.log.push(
                    Sender::Bot,
                    format!("{}: {}", self.labels.error_prefix, report.error),
                    Local::now(),
                );
                self.log.hide_typing();
                self.send_enabled = true;
            }
            InboundFrame::Unknown { kind } => {
                info!("Ignoring frame of unknown type {:?}", kind);
            }
        }
    }

    fn apply_chunk(&mut self, chunk: &ChunkPayload) {
        self.log.hide_typing();

        if chunk.is_final {
            self.send_enabled = true;
            self.finish_stream();
            return;
        }

        let Some(text) = chunk.text() else {
            return;
        };
        let log = &mut self.log;
        let handle = self
            .stream
            .get_or_insert_with(|| log.begin_stream(Sender::Bot, Local::now()));
        if !log.append(handle, text) {
            warn!("Streaming bubble vanished, dropping chunk");
        }
    }

    fn finish_stream(&mut self) {
        if let Some(handle) = self.stream.take() {
            self.log.finish(handle);
        }
    }

    // ------------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------------

    pub fn set_input(&mut self, text: String) {
        self.send_enabled = !text.trim().is_empty();
        self.input = text;
    }

    /// Consumes the input and returns the frame to transmit, or `None` when
    /// the input is blank or the socket is not connected.
    pub fn begin_send(&mut self) -> Option<ClientFrame> {
        let message = self.input.trim();
        if message.is_empty() || self.connection != ConnectionState::Connected {
            return None;
        }
        let message = message.to_string();

        self.log.push(Sender::User, message.clone(), Local::now());
        self.input.clear();
        self.send_enabled = false;
        self.log.show_typing();

        Some(ClientFrame::message(message, &self.session_id))
    }

    pub fn on_send_failed(&mut self, err: &WidgetError) {
        error!("Send failed: {}", err);
        self.log
            .push(Sender::Bot, self.labels.send_failed.clone(), Local::now());
        self.log.hide_typing();
        self.send_enabled = true;
    }

    /// Caller has already confirmed with the user.
    pub fn clear_history(&mut self) {
        self.log.clear();
        self.stream = None;
    }

    /// Shows the configured greeting once per page load.
    pub fn show_welcome(&mut self) -> bool {
        if self.welcomed {
            return false;
        }
        self.welcomed = true;
        match self.labels.welcome.clone() {
            Some(text) => {
                self.log.push(Sender::Bot, text, Local::now());
                true
            }
            None => false,
        }
    }
}
