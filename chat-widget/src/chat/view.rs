use std::cell::Cell;
use std::rc::Rc;

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use shared_types::SessionId;

use crate::chat::connection::{self, ConnectionManager};
use crate::chat::log::{Bubble, Sender, STREAM_CURSOR, TYPING_INDICATOR_ID};
use crate::chat::session::ChatSession;
use crate::chat::socket::page_socket_url;
use crate::config::WidgetConfig;
use crate::dom::ChatElements;

#[component]
pub fn ChatWidget() -> Element {
    let config = use_context::<WidgetConfig>();
    let mut session = use_signal(|| ChatSession::new(SessionId::generate(), &config));
    let mut elements = use_signal(|| None::<ChatElements>);
    let manager = use_hook(|| {
        let url = page_socket_url(&config.socket_path).unwrap_or_else(|e| {
            dioxus_logger::tracing::warn!("Falling back to raw socket path: {}", e);
            config.socket_path.clone()
        });
        Rc::new(ConnectionManager::new(url))
    });
    let pump_alive = use_hook(|| Rc::new(Cell::new(true)));
    let mut pump_started = use_signal(|| false);

    {
        let pump_alive = pump_alive.clone();
        use_drop(move || {
            pump_alive.set(false);
        });
    }

    // Resolve the rendered elements once, then connect
    {
        let ids = config.elements.clone();
        let manager = manager.clone();
        use_effect(move || {
            if *pump_started.peek() {
                return;
            }
            pump_started.set(true);

            match ChatElements::from_page(&ids) {
                Ok(found) => {
                    found.focus_input();
                    elements.set(Some(found));
                }
                Err(e) => {
                    dioxus_logger::tracing::error!("Chat widget init failed: {}", e);
                    return;
                }
            }
            connection::start(manager.clone(), session, pump_alive.clone());
        });
    }

    let welcome_delay_ms = config.welcome_delay_ms;
    use_effect(move || {
        spawn(async move {
            TimeoutFuture::new(welcome_delay_ms).await;
            session.write().show_welcome();
        });
    });

    // Scroll to bottom whenever the log changes, not on every keystroke
    let log_revision = use_memo(move || session.read().log().revision());
    use_effect(move || {
        let _ = log_revision();
        if let Some(found) = elements.read().as_ref() {
            found.scroll_log_to_bottom();
        }
    });

    let input_max_height_px = config.input_max_height_px;

    let send_message = {
        let manager = manager.clone();
        use_callback(move |_: ()| {
            manager.send(&mut session.write());
            if session.read().input().is_empty() {
                if let Some(found) = elements.read().as_ref() {
                    if let Err(e) = found.reset_input_height() {
                        dioxus_logger::tracing::debug!("{}", e);
                    }
                }
            }
        })
    };

    let onkeydown = use_callback(move |e: KeyboardEvent| {
        if e.key() == Key::Enter && !e.modifiers().shift() {
            e.prevent_default();
            send_message.call(());
        }
    });

    let oninput = use_callback(move |e: FormEvent| {
        session.write().set_input(e.value());
        if let Some(found) = elements.read().as_ref() {
            if let Err(e) = found.fit_input_height(input_max_height_px) {
                dioxus_logger::tracing::debug!("{}", e);
            }
        }
    });

    let clear_confirm = config.labels.clear_confirm.clone();
    let on_clear_chat = use_callback(move |_: MouseEvent| {
        let confirmed = web_sys::window()
            .and_then(|w| w.confirm_with_message(&clear_confirm).ok())
            .unwrap_or(false);
        if confirmed {
            session.write().clear_history();
        }
    });

    let on_clear_input = use_callback(move |_: MouseEvent| {
        session.write().set_input(String::new());
        if let Some(found) = elements.read().as_ref() {
            if let Err(e) = found.reset_input_height() {
                dioxus_logger::tracing::debug!("{}", e);
            }
            found.focus_input();
        }
    });

    let ids = &config.elements;
    let labels = &config.labels;
    let state = session.read();
    let status_color = state.connection().color();
    let status_class = format!("status-dot {}", state.connection().css_class());
    let status_label = state.status_label().to_string();
    let input_value = state.input().to_string();
    let send_disabled = !state.send_enabled();
    let typing = state.log().is_typing();
    let rows: Vec<(Bubble, String)> = state
        .log()
        .bubbles()
        .iter()
        .map(|bubble| {
            let name = match bubble.sender {
                Sender::User => labels.user_name.clone(),
                Sender::Bot => labels.assistant_name.clone(),
            };
            (bubble.clone(), name)
        })
        .collect();
    drop(state);

    rsx! {
        style { {CHAT_STYLES} }

        div {
            class: "chat-container",

            div {
                class: "chat-header",
                div { class: "chat-title", "{labels.title}" }
                div {
                    class: "chat-status",
                    span {
                        id: "{ids.status_dot}",
                        class: "{status_class}",
                        style: "background-color: {status_color};",
                    }
                    span { id: "{ids.status_text}", "{status_label}" }
                    button {
                        id: "{ids.clear_chat}",
                        class: "clear-chat-button",
                        r#type: "button",
                        onclick: move |e| on_clear_chat.call(e),
                        "✕"
                    }
                }
            }

            div {
                id: "{ids.message_log}",
                class: "chat-messages",
                for (bubble, sender_name) in rows {
                    MessageBubble {
                        key: "{bubble.id}",
                        bubble: bubble.clone(),
                        sender_name,
                    }
                }
                if typing {
                    TypingIndicator {}
                }
            }

            div {
                class: "chat-input-area",
                div {
                    class: "input-wrapper",
                    textarea {
                        id: "{ids.message_input}",
                        class: "chat-textarea",
                        placeholder: "{labels.input_placeholder}",
                        value: "{input_value}",
                        rows: "1",
                        oninput,
                        onkeydown,
                    }
                    if let Some(clear_id) = ids.clear_input.as_ref() {
                        button {
                            id: "{clear_id}",
                            class: "clear-input-button",
                            r#type: "button",
                            onclick: move |e| on_clear_input.call(e),
                            "×"
                        }
                    }
                    button {
                        id: "{ids.send_button}",
                        class: "send-button",
                        r#type: "button",
                        disabled: send_disabled,
                        onclick: move |_| send_message.call(()),
                        "➤"
                    }
                }
            }
        }
    }
}

#[component]
pub fn MessageBubble(bubble: Bubble, sender_name: String) -> Element {
    let class = format!("message {}", bubble.sender.css_class());

    rsx! {
        div {
            id: "{bubble.id}",
            class: "{class}",
            div {
                class: "message-header",
                span { class: "sender-name", "{sender_name}" }
                span { class: "message-time", "{bubble.time}" }
            }
            div {
                class: "message-text",
                "{bubble.text}"
                if bubble.streaming {
                    span { class: "streaming-cursor", "{STREAM_CURSOR}" }
                }
            }
        }
    }
}

#[component]
pub fn TypingIndicator() -> Element {
    rsx! {
        div {
            id: TYPING_INDICATOR_ID,
            class: "message bot-message typing-indicator",
            span {}
            span {}
            span {}
        }
    }
}

const CHAT_STYLES: &str = r#"
.chat-container {
    display: flex;
    flex-direction: column;
    height: 100%;
    background: var(--chat-bg, #ffffff);
    color: var(--chat-fg, #1f2937);
    overflow: hidden;
}

.chat-header {
    display: flex;
    align-items: center;
    justify-content: space-between;
    padding: 0.75rem 1rem;
    border-bottom: 1px solid var(--chat-border, #e5e7eb);
}

.chat-title {
    font-weight: 600;
}

.chat-status {
    display: flex;
    align-items: center;
    gap: 0.5rem;
    font-size: 0.85rem;
}

.status-dot {
    width: 10px;
    height: 10px;
    border-radius: 50%;
    display: inline-block;
}

.clear-chat-button,
.clear-input-button {
    background: none;
    border: none;
    cursor: pointer;
    color: inherit;
    opacity: 0.6;
}

.chat-messages {
    flex: 1;
    overflow-y: auto;
    padding: 1rem;
    display: flex;
    flex-direction: column;
    gap: 0.75rem;
}

.message {
    max-width: 80%;
    padding: 0.6rem 0.85rem;
    border-radius: 12px;
    animation: message-fade-in 0.3s ease-out;
}

.user-message {
    align-self: flex-end;
    background: var(--chat-user-bg, #2563eb);
    color: #ffffff;
}

.bot-message {
    align-self: flex-start;
    background: var(--chat-bot-bg, #f3f4f6);
}

.message-header {
    display: flex;
    gap: 0.5rem;
    font-size: 0.75rem;
    opacity: 0.75;
    margin-bottom: 0.25rem;
}

.message-text {
    white-space: pre-wrap;
    word-wrap: break-word;
}

.streaming-cursor {
    animation: cursor-blink 1s steps(1) infinite;
}

.typing-indicator {
    display: flex;
    gap: 4px;
}

.typing-indicator span {
    width: 6px;
    height: 6px;
    border-radius: 50%;
    background: currentColor;
    opacity: 0.4;
    animation: typing-bounce 1.2s infinite ease-in-out;
}

.typing-indicator span:nth-child(2) { animation-delay: 0.2s; }
.typing-indicator span:nth-child(3) { animation-delay: 0.4s; }

.chat-input-area {
    padding: 0.75rem 1rem;
    border-top: 1px solid var(--chat-border, #e5e7eb);
}

.input-wrapper {
    display: flex;
    align-items: flex-end;
    gap: 0.5rem;
}

.chat-textarea {
    flex: 1;
    resize: none;
    min-height: 40px;
    max-height: 120px;
    padding: 0.5rem 0.75rem;
    border-radius: 8px;
    border: 1px solid var(--chat-border, #d1d5db);
    font: inherit;
}

.send-button {
    padding: 0.5rem 0.9rem;
    border-radius: 8px;
    border: none;
    background: var(--chat-user-bg, #2563eb);
    color: #ffffff;
    cursor: pointer;
}

.send-button:disabled {
    opacity: 0.5;
    cursor: not-allowed;
}

@keyframes message-fade-in {
    from { opacity: 0; transform: translateY(10px); }
    to { opacity: 1; transform: translateY(0); }
}

@keyframes cursor-blink {
    50% { opacity: 0; }
}

@keyframes typing-bounce {
    0%, 80%, 100% { transform: scale(0.8); opacity: 0.4; }
    40% { transform: scale(1); opacity: 1; }
}

body.mobile-view .message { max-width: 90%; }
body.mobile-view .chat-textarea { font-size: 16px; }
body.mobile-view .send-button { min-width: 44px; min-height: 44px; }

body.reduced-motion .message,
body.reduced-motion .streaming-cursor,
body.reduced-motion .typing-indicator span {
    animation: none;
}

body.dark-theme {
    --chat-bg: #0f172a;
    --chat-fg: #e2e8f0;
    --chat-border: #334155;
    --chat-bot-bg: #1e293b;
}

body.telegram-webview .chat-container {
    background: var(--tg-theme-bg-color, var(--chat-bg, #ffffff));
    color: var(--tg-theme-text-color, var(--chat-fg, #1f2937));
}

body.telegram-webview .send-button {
    background: var(--tg-theme-button-color, #2563eb);
    color: var(--tg-theme-button-text-color, #ffffff);
}
"#;
