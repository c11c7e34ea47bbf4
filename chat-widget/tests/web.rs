#![cfg(target_arch = "wasm32")]

use chat_widget::chat::socket::page_socket_url;
use chat_widget::config::{ElementIds, ViewportConfig};
use chat_widget::dom::{self, ChatElements};
use chat_widget::viewport::ViewportAdapter;
use chat_widget::{WidgetConfig, WidgetError};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn mount(tag: &str, id: &str) -> web_sys::Element {
    let document = dom::document().unwrap();
    let element = document.create_element(tag).unwrap();
    element.set_id(id);
    document.body().unwrap().append_child(&element).unwrap();
    element
}

#[wasm_bindgen_test]
fn config_defaults_without_script_block() {
    assert_eq!(WidgetConfig::from_page().unwrap(), WidgetConfig::default());
}

#[wasm_bindgen_test]
fn config_is_read_from_script_block() {
    let script = mount("script", "chat-widget-config");
    script.set_attribute("type", "application/json").unwrap();
    script.set_text_content(Some(r#"{ "socket_path": "/chat/ws" }"#));

    let config = WidgetConfig::from_page().unwrap();
    script.remove();

    assert_eq!(config.socket_path, "/chat/ws");
    assert_eq!(config.labels.user_name, "You");
}

#[wasm_bindgen_test]
fn missing_required_element_is_reported() {
    let result = ChatElements::from_page(&ElementIds::default());
    assert!(matches!(
        result,
        Err(WidgetError::MissingElement(id)) if id == "message-input"
    ));
}

#[wasm_bindgen_test]
fn rendered_contract_resolves() {
    let ids = ElementIds::default();
    let mounted = vec![
        mount("textarea", &ids.message_input),
        mount("button", &ids.send_button),
        mount("div", &ids.message_log),
        mount("button", &ids.clear_chat),
        mount("span", &ids.status_dot),
        mount("span", &ids.status_text),
    ];

    let elements = ChatElements::from_page(&ids).unwrap();
    assert!(elements.clear_input.is_none());
    elements.fit_input_height(120).unwrap();
    elements.reset_input_height().unwrap();
    elements.scroll_log_to_bottom();

    for element in mounted {
        element.remove();
    }
}

#[wasm_bindgen_test]
fn socket_url_follows_page_location() {
    let url = page_socket_url("/ws").unwrap();
    assert!(url.starts_with("ws://") || url.starts_with("wss://"));
    assert!(url.ends_with("/ws"));
}

#[wasm_bindgen_test]
fn wide_breakpoint_marks_body_mobile() {
    let config = ViewportConfig {
        mobile_breakpoint_px: 100_000.0,
        ..ViewportConfig::default()
    };
    let adapter = ViewportAdapter::install(config, ElementIds::default()).unwrap();

    assert!(adapter.is_mobile());
    let body = dom::document().unwrap().body().unwrap();
    assert!(body.class_list().contains("mobile-view"));
}

fn install_telegram_stub(web_app: &js_sys::Object) {
    let telegram = js_sys::Object::new();
    js_sys::Reflect::set(&telegram, &"WebApp".into(), web_app).unwrap();
    let window = web_sys::window().unwrap();
    js_sys::Reflect::set(&window, &"Telegram".into(), &telegram).unwrap();
}

fn remove_telegram_stub() {
    let window = web_sys::window().unwrap();
    js_sys::Reflect::delete_property(&window, &"Telegram".into()).unwrap();
}

#[wasm_bindgen_test]
fn telegram_host_without_back_button_keeps_adapting() {
    let web_app = js_sys::Object::new();
    js_sys::Reflect::set(&web_app, &"colorScheme".into(), &"dark".into()).unwrap();
    js_sys::Reflect::set(&web_app, &"expand".into(), &js_sys::Function::new_no_args("")).unwrap();
    install_telegram_stub(&web_app);

    let result = ViewportAdapter::install(ViewportConfig::default(), ElementIds::default());
    remove_telegram_stub();

    assert!(result.is_ok());
    let document = dom::document().unwrap();
    let body = document.body().unwrap();
    assert!(body.class_list().contains("telegram-webview"));
    assert!(body.class_list().contains("dark-theme"));
    assert_eq!(
        document.document_element().unwrap().get_attribute("data-theme").as_deref(),
        Some("dark")
    );
}

#[wasm_bindgen_test]
fn failing_telegram_expand_still_wires_the_theme() {
    let web_app = js_sys::Object::new();
    js_sys::Reflect::set(&web_app, &"colorScheme".into(), &"light".into()).unwrap();
    js_sys::Reflect::set(
        &web_app,
        &"expand".into(),
        &js_sys::Function::new_no_args("throw new Error('not supported')"),
    )
    .unwrap();
    install_telegram_stub(&web_app);

    let result = ViewportAdapter::install(ViewportConfig::default(), ElementIds::default());
    remove_telegram_stub();

    assert!(result.is_ok());
    let root = dom::document().unwrap().document_element().unwrap();
    assert_eq!(root.get_attribute("data-theme").as_deref(), Some("light"));
}
