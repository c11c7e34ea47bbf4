//! Bindings for the Telegram Mini App host object (`window.Telegram.WebApp`).

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::error::WidgetError;

#[wasm_bindgen]
extern "C" {
    pub type TelegramWebApp;

    #[wasm_bindgen(method, getter, js_name = colorScheme)]
    pub fn color_scheme(this: &TelegramWebApp) -> Option<String>;

    #[wasm_bindgen(method, catch)]
    pub fn expand(this: &TelegramWebApp) -> Result<(), JsValue>;

    #[wasm_bindgen(method, getter, js_name = BackButton)]
    pub fn back_button(this: &TelegramWebApp) -> Option<BackButton>;

    pub type BackButton;

    #[wasm_bindgen(method, catch, js_name = onClick)]
    pub fn on_click(this: &BackButton, cb: &Closure<dyn FnMut()>) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    pub fn show(this: &BackButton) -> Result<(), JsValue>;
}

/// `window.Telegram.WebApp`, when the page runs inside Telegram.
pub fn detect(window: &web_sys::Window) -> Option<TelegramWebApp> {
    let telegram = js_sys::Reflect::get(window, &JsValue::from_str("Telegram")).ok()?;
    if telegram.is_undefined() || telegram.is_null() {
        return None;
    }
    let web_app = js_sys::Reflect::get(&telegram, &JsValue::from_str("WebApp")).ok()?;
    if web_app.is_undefined() || web_app.is_null() {
        return None;
    }
    Some(web_app.unchecked_into())
}

impl TelegramWebApp {
    /// Routes the host back button to browser history.
    pub fn wire_back_button(&self, history_len: u32) -> Result<(), WidgetError> {
        // Absent on hosts older than Bot API 6.1.
        let Some(button) = self.back_button() else {
            dioxus_logger::tracing::debug!("Telegram host has no BackButton");
            return Ok(());
        };
        let on_back = Closure::wrap(Box::new(move || {
            let Some(window) = web_sys::window() else {
                return;
            };
            if let Ok(history) = window.history() {
                if let Err(e) = history.back() {
                    dioxus_logger::tracing::warn!(
                        "history.back failed: {}",
                        crate::error::describe_js(&e)
                    );
                }
            }
        }) as Box<dyn FnMut()>);
        button.on_click(&on_back).map_err(WidgetError::dom)?;
        on_back.forget();

        if super::detect::should_show_back_button(history_len) {
            button.show().map_err(WidgetError::dom)?;
        }
        Ok(())
    }
}
