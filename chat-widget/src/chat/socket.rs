use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

use crate::error::{describe_js, WidgetError};

/// Transport-level events, forwarded to the connection manager untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Opened,
    Message(String),
    Errored(String),
    Closed { code: u16, reason: String },
}

/// One browser WebSocket plus the JS callbacks bound to it.
///
/// Dropping it detaches the callbacks and closes the socket without emitting
/// `Closed`.
pub struct ChatSocket {
    ws: WebSocket,
    closing: Rc<Cell<bool>>,
    _on_open: Closure<dyn FnMut(JsValue)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
}

impl ChatSocket {
    pub fn open<F>(url: &str, on_event: F) -> Result<Self, WidgetError>
    where
        F: FnMut(SocketEvent) + 'static,
    {
        dioxus_logger::tracing::info!("Connecting to WebSocket: {}", url);
        let ws = WebSocket::new(url).map_err(WidgetError::socket)?;

        let closing = Rc::new(Cell::new(false));
        let on_event_rc = Rc::new(RefCell::new(on_event));
        let on_event_open = on_event_rc.clone();
        let on_event_close = on_event_rc.clone();
        let on_event_error = on_event_rc.clone();
        let closing_for_close = closing.clone();

        let onopen_callback = Closure::wrap(Box::new(move |_e: JsValue| {
            on_event_open.borrow_mut()(SocketEvent::Opened);
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onopen(Some(onopen_callback.as_ref().unchecked_ref()));

        let onmessage_callback = Closure::wrap(Box::new(move |e: MessageEvent| {
            let Ok(text) = e.data().dyn_into::<js_sys::JsString>() else {
                dioxus_logger::tracing::warn!("Ignoring non-text WebSocket message");
                return;
            };
            let text = String::from(text);
            dioxus_logger::tracing::debug!("WebSocket message: {}", text);
            on_event_rc.borrow_mut()(SocketEvent::Message(text));
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(onmessage_callback.as_ref().unchecked_ref()));

        let onclose_callback = Closure::wrap(Box::new(move |e: CloseEvent| {
            if closing_for_close.get() {
                return;
            }
            on_event_close.borrow_mut()(SocketEvent::Closed {
                code: e.code(),
                reason: e.reason(),
            });
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(onclose_callback.as_ref().unchecked_ref()));

        let onerror_callback = Closure::wrap(Box::new(move |e: Event| {
            on_event_error.borrow_mut()(SocketEvent::Errored(e.type_()));
        }) as Box<dyn FnMut(Event)>);
        ws.set_onerror(Some(onerror_callback.as_ref().unchecked_ref()));

        Ok(Self {
            ws,
            closing,
            _on_open: onopen_callback,
            _on_message: onmessage_callback,
            _on_close: onclose_callback,
            _on_error: onerror_callback,
        })
    }

    pub fn is_open(&self) -> bool {
        self.ws.ready_state() == WebSocket::OPEN
    }

    pub fn send_text(&self, text: &str) -> Result<(), WidgetError> {
        if !self.is_open() {
            return Err(WidgetError::Send("socket is not open".to_string()));
        }
        self.ws.send_with_str(text).map_err(WidgetError::send)
    }
}

impl Drop for ChatSocket {
    fn drop(&mut self) {
        self.closing.set(true);
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onerror(None);
        self.ws.set_onclose(None);
        if let Err(e) = self.ws.close() {
            dioxus_logger::tracing::debug!("WebSocket close failed: {}", describe_js(&e));
        }
    }
}

/// Builds the socket URL for a page served from `protocol` + `host`.
///
/// Absolute `ws://`/`wss://` paths are used as-is.
pub fn socket_url(protocol: &str, host: &str, path: &str) -> String {
    if path.starts_with("ws://") || path.starts_with("wss://") {
        return path.to_string();
    }
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    if path.starts_with('/') {
        format!("{scheme}://{host}{path}")
    } else {
        format!("{scheme}://{host}/{path}")
    }
}

/// [`socket_url`] for the current page.
pub fn page_socket_url(path: &str) -> Result<String, WidgetError> {
    let location = web_sys::window().ok_or(WidgetError::NoWindow)?.location();
    let protocol = location.protocol().map_err(WidgetError::dom)?;
    let host = location.host().map_err(WidgetError::dom)?;
    Ok(socket_url(&protocol, &host, path))
}
