use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dioxus_logger::tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, ScrollBehavior, ScrollIntoViewOptions,
    ScrollLogicalPosition, Window,
};

use super::detect::{
    is_constrained_network, is_mobile, ColorScheme, LayoutChange, LayoutTracker, MobileOs,
    TapDebounce,
};
use super::telegram::{self, TelegramWebApp};
use crate::config::{ElementIds, ViewportConfig};
use crate::error::{describe_js, WidgetError};

pub const MOBILE_CLASS: &str = "mobile-view";
pub const TELEGRAM_CLASS: &str = "telegram-webview";
pub const DARK_THEME_CLASS: &str = "dark-theme";
pub const REDUCED_MOTION_CLASS: &str = "reduced-motion";

/// Applies device and host presentation tweaks to the page body.
///
/// Installed once after the widget has rendered; its listeners live for the
/// rest of the page.
pub struct ViewportAdapter {
    config: ViewportConfig,
    ids: ElementIds,
    window: Window,
    document: Document,
    body: HtmlElement,
    user_agent: String,
    tracker: RefCell<LayoutTracker>,
    keyboard_installed: Cell<bool>,
}

impl ViewportAdapter {
    pub fn install(config: ViewportConfig, ids: ElementIds) -> Result<Rc<Self>, WidgetError> {
        let window = web_sys::window().ok_or(WidgetError::NoWindow)?;
        let document = window.document().ok_or(WidgetError::NoWindow)?;
        let body = document
            .body()
            .ok_or_else(|| WidgetError::MissingElement("body".to_string()))?;
        let user_agent = window.navigator().user_agent().unwrap_or_default();

        let adapter = Rc::new(Self {
            config,
            ids,
            window,
            document,
            body,
            user_agent,
            tracker: RefCell::new(LayoutTracker::new(false)),
            keyboard_installed: Cell::new(false),
        });

        let mobile = adapter.classify();
        info!(
            "Viewport: mobile={}, os={}",
            mobile,
            MobileOs::detect(&adapter.user_agent)
        );
        adapter.apply_layout(mobile)?;

        for event in ["resize", "orientationchange"] {
            let on_resize = adapter.clone();
            listen(adapter.window.as_ref(), event, move |_| {
                let mobile = on_resize.classify();
                if let Err(e) = on_resize.apply_layout(mobile) {
                    warn!("Viewport update failed: {}", e);
                }
            })?;
        }

        if mobile {
            adapter.suppress_zoom()?;
        }

        // Host quirks never undo the layout wiring above.
        if let Some(web_app) = telegram::detect(&adapter.window) {
            adapter.adapt_for_telegram(&web_app);
        }
        Ok(adapter)
    }

    pub fn is_mobile(&self) -> bool {
        self.tracker.borrow().is_mobile()
    }

    fn classify(&self) -> bool {
        let width = self
            .window
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .unwrap_or(0.0);
        is_mobile(width, &self.user_agent, self.config.mobile_breakpoint_px)
    }

    fn apply_layout(&self, mobile: bool) -> Result<(), WidgetError> {
        let change = self.tracker.borrow_mut().update(mobile);
        match change {
            Some(LayoutChange::EnteredMobile) => self.adapt_for_mobile(),
            Some(LayoutChange::LeftMobile) => {
                debug!("Leaving mobile layout");
                self.body
                    .class_list()
                    .remove_1(MOBILE_CLASS)
                    .map_err(WidgetError::dom)
            }
            None => Ok(()),
        }
    }

    fn adapt_for_mobile(&self) -> Result<(), WidgetError> {
        debug!("Entering mobile layout");
        self.add_body_class(MOBILE_CLASS)?;
        if !self.keyboard_installed.replace(true) {
            self.improve_keyboard_handling()?;
        }
        self.optimize_animations()
    }

    /// Each step is attempted on its own; failures are logged and skipped.
    fn adapt_for_telegram(&self, web_app: &TelegramWebApp) {
        info!("Running inside Telegram WebApp");
        let scheme = ColorScheme::parse(web_app.color_scheme().as_deref());

        let steps = [
            ("body class", self.add_body_class(TELEGRAM_CLASS)),
            ("theme", self.apply_color_scheme(scheme)),
            ("expand", web_app.expand().map_err(WidgetError::dom)),
            ("back button", self.wire_back_button(web_app)),
        ];
        for (step, result) in steps {
            if let Err(e) = result {
                warn!("Telegram {} skipped: {}", step, e);
            }
        }
    }

    fn apply_color_scheme(&self, scheme: ColorScheme) -> Result<(), WidgetError> {
        if scheme == ColorScheme::Dark {
            self.add_body_class(DARK_THEME_CLASS)?;
        }
        if let Some(root) = self.document.document_element() {
            root.set_attribute("data-theme", scheme.data_theme())
                .map_err(WidgetError::dom)?;
        }
        Ok(())
    }

    fn wire_back_button(&self, web_app: &TelegramWebApp) -> Result<(), WidgetError> {
        let history_len = self
            .window
            .history()
            .and_then(|h| h.length())
            .map_err(WidgetError::dom)?;
        web_app.wire_back_button(history_len)
    }

    fn improve_keyboard_handling(&self) -> Result<(), WidgetError> {
        match self.document.get_element_by_id(&self.ids.message_input) {
            Some(input) => {
                let delay_ms = i32::try_from(self.config.keyboard_scroll_delay_ms).unwrap_or(i32::MAX);
                let window = self.window.clone();
                let target = input.clone();
                listen(target.as_ref(), "focus", move |_| {
                    let input = input.clone();
                    let scroll = Closure::once_into_js(move || scroll_into_view(&input));
                    if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                        scroll.unchecked_ref(),
                        delay_ms,
                    ) {
                        debug!("scroll timer failed: {}", describe_js(&e));
                    }
                })?;
            }
            None => warn!("#{} not found; keyboard handling skipped", self.ids.message_input),
        }

        let send_selector = format!("#{}", self.ids.send_button);
        let document = self.document.clone();
        listen(self.document.as_ref(), "click", move |e| {
            let on_send = e
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.closest(&send_selector).ok().flatten())
                .is_some();
            if !on_send {
                return;
            }
            if let Some(active) = document
                .active_element()
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            {
                if let Err(e) = active.blur() {
                    debug!("blur failed: {}", describe_js(&e));
                }
            }
        })
    }

    fn optimize_animations(&self) -> Result<(), WidgetError> {
        let navigator = self.window.navigator();
        let Ok(connection) = js_sys::Reflect::get(&navigator, &JsValue::from_str("connection"))
        else {
            return Ok(());
        };
        if connection.is_undefined() || connection.is_null() {
            return Ok(());
        }

        let save_data = js_sys::Reflect::get(&connection, &JsValue::from_str("saveData"))
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let effective_type = js_sys::Reflect::get(&connection, &JsValue::from_str("effectiveType"))
            .ok()
            .and_then(|v| v.as_string());

        if is_constrained_network(save_data, effective_type.as_deref()) {
            info!("Constrained network, reducing motion");
            self.add_body_class(REDUCED_MOTION_CLASS)?;
        }
        Ok(())
    }

    fn suppress_zoom(&self) -> Result<(), WidgetError> {
        let taps = RefCell::new(TapDebounce::new(self.config.tap_debounce_ms));
        listen(self.document.as_ref(), "touchend", move |e| {
            if taps.borrow_mut().register(js_sys::Date::now()) {
                e.prevent_default();
            }
        })?;
        listen(self.document.as_ref(), "contextmenu", |e| {
            e.prevent_default();
        })
    }

    fn add_body_class(&self, class: &str) -> Result<(), WidgetError> {
        self.body.class_list().add_1(class).map_err(WidgetError::dom)
    }
}

fn scroll_into_view(element: &Element) {
    let options = ScrollIntoViewOptions::new();
    options.set_behavior(ScrollBehavior::Smooth);
    options.set_block(ScrollLogicalPosition::End);
    element.scroll_into_view_with_scroll_into_view_options(&options);
}

/// Registers a page-lifetime listener; the closure is intentionally leaked.
fn listen(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), WidgetError> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(WidgetError::dom)?;
    closure.forget();
    Ok(())
}
