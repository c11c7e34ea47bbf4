use dioxus_logger::tracing::Level;
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsCast;
use web_sys::HtmlScriptElement;

use crate::error::WidgetError;

/// Id of the optional `<script type="application/json">` block holding overrides.
pub const CONFIG_SCRIPT_ID: &str = "chat-widget-config";

/// Widget settings. Every field has a default, so a page may override any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub socket_path: String,
    pub reconnect: ReconnectPolicy,
    pub welcome_delay_ms: u32,
    pub input_max_height_px: u32,
    pub log_level: String,
    pub elements: ElementIds,
    pub labels: Labels,
    pub viewport: ViewportConfig,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            socket_path: "/ws".to_string(),
            reconnect: ReconnectPolicy::default(),
            welcome_delay_ms: 500,
            input_max_height_px: 120,
            log_level: "info".to_string(),
            elements: ElementIds::default(),
            labels: Labels::default(),
            viewport: ViewportConfig::default(),
        }
    }
}

impl WidgetConfig {
    pub fn from_json(raw: &str) -> Result<Self, WidgetError> {
        serde_json::from_str(raw).map_err(|e| WidgetError::Config(e.to_string()))
    }

    /// Read overrides from the page. No config block means defaults.
    pub fn from_page() -> Result<Self, WidgetError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or(WidgetError::NoWindow)?;

        let Some(element) = document.get_element_by_id(CONFIG_SCRIPT_ID) else {
            return Ok(Self::default());
        };

        let script = element.dyn_ref::<HtmlScriptElement>().ok_or_else(|| {
            WidgetError::Config(format!("#{CONFIG_SCRIPT_ID} is not a <script> element"))
        })?;
        let raw = script
            .text()
            .map_err(|e| WidgetError::Config(crate::error::describe_js(&e)))?;

        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_json(&raw)
    }

    /// Unwraps a [`Self::from_page`] result, falling back to defaults on error.
    pub fn or_default(loaded: Result<Self, WidgetError>) -> Self {
        loaded.unwrap_or_else(|e| {
            dioxus_logger::tracing::warn!("Using default widget config: {}", e);
            Self::default()
        })
    }

    pub fn log_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }
}

/// Delay before re-opening a dropped connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Same delay every time, retried forever.
    Fixed { delay_ms: u32 },
    /// Doubles per consecutive attempt, capped at `max_ms`.
    Backoff { base_ms: u32, max_ms: u32 },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Fixed { delay_ms: 3000 }
    }
}

impl ReconnectPolicy {
    /// `attempt` counts from 1 since the last successful open.
    pub fn delay_ms(&self, attempt: u32) -> u32 {
        match *self {
            Self::Fixed { delay_ms } => delay_ms,
            Self::Backoff { base_ms, max_ms } => {
                let exponent = attempt.saturating_sub(1).min(16);
                base_ms.saturating_mul(1u32 << exponent).min(max_ms)
            }
        }
    }
}

/// Ids of the elements the widget renders and later looks up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    pub message_input: String,
    pub send_button: String,
    pub message_log: String,
    pub clear_chat: String,
    pub status_dot: String,
    pub status_text: String,
    pub clear_input: Option<String>,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            message_input: "message-input".to_string(),
            send_button: "send-btn".to_string(),
            message_log: "chat-messages".to_string(),
            clear_chat: "clear-chat".to_string(),
            status_dot: "status-dot".to_string(),
            status_text: "status-text".to_string(),
            clear_input: Some("clear-input".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub title: String,
    pub user_name: String,
    pub assistant_name: String,
    pub connecting: String,
    pub connected: String,
    pub disconnected: String,
    pub connection_error: String,
    pub connect_failed: String,
    pub error_prefix: String,
    pub send_failed: String,
    pub clear_confirm: String,
    pub input_placeholder: String,
    pub welcome: Option<String>,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            title: "Assistant".to_string(),
            user_name: "You".to_string(),
            assistant_name: "Assistant".to_string(),
            connecting: "Connecting...".to_string(),
            connected: "Connected".to_string(),
            disconnected: "Disconnected".to_string(),
            connection_error: "Connection error".to_string(),
            connect_failed: "Unable to connect".to_string(),
            error_prefix: "Error".to_string(),
            send_failed: "Failed to send message. Please try again.".to_string(),
            clear_confirm: "Clear the entire chat history?".to_string(),
            input_placeholder: "Type a message...".to_string(),
            welcome: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub mobile_breakpoint_px: f64,
    pub tap_debounce_ms: f64,
    pub keyboard_scroll_delay_ms: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint_px: 768.0,
            tap_debounce_ms: 300.0,
            keyboard_scroll_delay_ms: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = WidgetConfig::from_json("{}").unwrap();
        assert_eq!(config, WidgetConfig::default());
        assert_eq!(config.socket_path, "/ws");
        assert_eq!(config.reconnect, ReconnectPolicy::Fixed { delay_ms: 3000 });
        assert_eq!(config.elements.send_button, "send-btn");
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let config = WidgetConfig::from_json(
            r#"{
                "labels": { "assistant_name": "Budget Assistant", "welcome": "Hi!" },
                "elements": { "clear_input": null },
                "viewport": { "mobile_breakpoint_px": 600 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.labels.assistant_name, "Budget Assistant");
        assert_eq!(config.labels.welcome.as_deref(), Some("Hi!"));
        assert_eq!(config.labels.user_name, "You");
        assert_eq!(config.elements.clear_input, None);
        assert_eq!(config.elements.message_input, "message-input");
        assert_eq!(config.viewport.mobile_breakpoint_px, 600.0);
        assert_eq!(config.viewport.tap_debounce_ms, 300.0);
    }

    #[test]
    fn backoff_policy_parses_and_caps() {
        let config = WidgetConfig::from_json(
            r#"{ "reconnect": { "kind": "backoff", "base_ms": 500, "max_ms": 4000 } }"#,
        )
        .unwrap();

        let policy = config.reconnect;
        assert_eq!(policy.delay_ms(1), 500);
        assert_eq!(policy.delay_ms(2), 1000);
        assert_eq!(policy.delay_ms(3), 2000);
        assert_eq!(policy.delay_ms(4), 4000);
        assert_eq!(policy.delay_ms(40), 4000);
    }

    #[test]
    fn fixed_policy_never_grows() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_ms(1), 3000);
        assert_eq!(policy.delay_ms(100), 3000);
    }

    #[test]
    fn invalid_json_is_a_config_error() {
        assert!(matches!(
            WidgetConfig::from_json("{ nope"),
            Err(WidgetError::Config(_))
        ));
        assert!(matches!(
            WidgetConfig::from_json(r#"{ "reconnect": { "kind": "sometimes" } }"#),
            Err(WidgetError::Config(_))
        ));
    }

    #[test]
    fn failed_load_falls_back_to_defaults() {
        let loaded = WidgetConfig::from_json("{ nope");
        assert_eq!(WidgetConfig::or_default(loaded), WidgetConfig::default());

        let loaded = WidgetConfig::from_json(r#"{ "socket_path": "/chat/ws" }"#);
        assert_eq!(WidgetConfig::or_default(loaded).socket_path, "/chat/ws");
    }

    #[test]
    fn config_can_be_handed_to_the_launcher() {
        fn launch_context<T: Clone + Send + Sync + 'static>(_: &T) {}
        launch_context(&WidgetConfig::default());
    }

    #[test]
    fn log_level_falls_back_to_info() {
        let mut config = WidgetConfig::default();
        assert_eq!(config.log_level(), Level::INFO);
        config.log_level = "debug".to_string();
        assert_eq!(config.log_level(), Level::DEBUG);
        config.log_level = "loud".to_string();
        assert_eq!(config.log_level(), Level::INFO);
    }
}
