//! Owns the socket and turns its events into [`ChatSession`] transitions.
//!
//! Socket callbacks only enqueue [`SocketEvent`]s. A pump task spawned on the
//! Dioxus runtime drains the queue every frame and applies the events to the
//! session signal, so no signal is written from inside a JS callback and a
//! socket is never dropped while one of its own callbacks is running.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use dioxus::prelude::*;
use dioxus_logger::tracing::{debug, info};
use gloo_timers::future::TimeoutFuture;
use shared_types::ClientFrame;

use crate::chat::session::{ChatSession, Directive};
use crate::chat::socket::{ChatSocket, SocketEvent};
use crate::error::WidgetError;

const PUMP_INTERVAL_MS: u32 = 16;

pub struct ConnectionManager {
    url: String,
    queue: Rc<RefCell<VecDeque<SocketEvent>>>,
    socket: RefCell<Option<ChatSocket>>,
    reconnect_token: Cell<u64>,
    reconnect_armed: Cell<bool>,
}

impl ConnectionManager {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            queue: Rc::new(RefCell::new(VecDeque::new())),
            socket: RefCell::new(None),
            reconnect_token: Cell::new(0),
            reconnect_armed: Cell::new(false),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Opens a fresh socket, replacing (and closing) any previous one.
    pub fn connect(&self, session: &mut ChatSession) -> Option<Directive> {
        session.on_connecting();

        let queue = self.queue.clone();
        match ChatSocket::open(&self.url, move |event| {
            queue.borrow_mut().push_back(event);
        }) {
            Ok(socket) => {
                self.socket.replace(Some(socket));
                None
            }
            Err(e) => {
                self.socket.replace(None);
                session.on_connect_failed(&e.to_string())
            }
        }
    }

    pub fn drain(&self) -> Vec<SocketEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn handle(&self, session: &mut ChatSession, event: SocketEvent) -> Option<Directive> {
        match event {
            SocketEvent::Opened => session.on_open(),
            SocketEvent::Message(raw) => {
                session.on_raw_frame(&raw);
                None
            }
            SocketEvent::Errored(detail) => {
                session.on_transport_error(&detail);
                None
            }
            SocketEvent::Closed { code, reason } => {
                debug!("WebSocket closed (code {}, reason {:?})", code, reason);
                session.on_close()
            }
        }
    }

    /// Sends the pending input, if the session allows it.
    pub fn send(&self, session: &mut ChatSession) {
        let Some(frame) = session.begin_send() else {
            return;
        };
        if let Err(e) = self.transmit(&frame) {
            session.on_send_failed(&e);
        }
    }

    fn transmit(&self, frame: &ClientFrame) -> Result<(), WidgetError> {
        let text = frame.encode()?;
        match self.socket.borrow().as_ref() {
            Some(socket) => socket.send_text(&text),
            None => Err(WidgetError::Send("no socket".to_string())),
        }
    }

    /// Arms the reconnect timer. The returned token is only honoured while no
    /// later arm or disarm happened.
    pub fn arm_reconnect(&self) -> u64 {
        let token = self.reconnect_token.get().wrapping_add(1);
        self.reconnect_token.set(token);
        self.reconnect_armed.set(true);
        token
    }

    pub fn disarm_reconnect(&self) {
        self.reconnect_token
            .set(self.reconnect_token.get().wrapping_add(1));
        self.reconnect_armed.set(false);
    }

    pub fn take_reconnect(&self, token: u64) -> bool {
        if !self.reconnect_armed.get() || self.reconnect_token.get() != token {
            return false;
        }
        self.reconnect_armed.set(false);
        true
    }

    #[cfg(test)]
    fn enqueue(&self, event: SocketEvent) {
        self.queue.borrow_mut().push_back(event);
    }
}

/// Connects and pumps socket events into `session` until `alive` goes false.
pub fn start(manager: Rc<ConnectionManager>, mut session: Signal<ChatSession>, alive: Rc<Cell<bool>>) {
    spawn(async move {
        info!("Chat connection starting: {}", manager.url());
        let directive = manager.connect(&mut session.write());
        apply_directive(manager.clone(), session, directive);

        while alive.get() {
            for event in manager.drain() {
                let directive = manager.handle(&mut session.write(), event);
                apply_directive(manager.clone(), session, directive);
            }
            TimeoutFuture::new(PUMP_INTERVAL_MS).await;
        }
        manager.disarm_reconnect();
        manager.socket.replace(None);
    });
}

fn apply_directive(
    manager: Rc<ConnectionManager>,
    mut session: Signal<ChatSession>,
    directive: Option<Directive>,
) {
    match directive {
        None => {}
        Some(Directive::CancelReconnect) => manager.disarm_reconnect(),
        Some(Directive::Reconnect { after_ms }) => {
            info!("Reconnecting in {} ms", after_ms);
            let token = manager.arm_reconnect();
            spawn(async move {
                TimeoutFuture::new(after_ms).await;
                if !manager.take_reconnect(token) {
                    debug!("Reconnect timer superseded");
                    return;
                }
                session.write().on_reconnect_due();
                let directive = manager.connect(&mut session.write());
                apply_directive(manager, session, directive);
            });
        }
    }
}
