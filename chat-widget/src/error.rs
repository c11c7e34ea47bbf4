use wasm_bindgen::JsValue;

#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("required element #{0} is missing from the page")]
    MissingElement(String),

    #[error("no global `window`/`document` available")]
    NoWindow,

    #[error("failed to open websocket: {0}")]
    Socket(String),

    #[error("failed to send frame: {0}")]
    Send(String),

    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("DOM call failed: {0}")]
    Dom(String),

    #[error("invalid widget config: {0}")]
    Config(String),
}

impl WidgetError {
    pub(crate) fn socket(err: JsValue) -> Self {
        Self::Socket(describe_js(&err))
    }

    pub(crate) fn send(err: JsValue) -> Self {
        Self::Send(describe_js(&err))
    }

    pub(crate) fn dom(err: JsValue) -> Self {
        Self::Dom(describe_js(&err))
    }
}

/// Best-effort text for a thrown JS value.
pub(crate) fn describe_js(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
