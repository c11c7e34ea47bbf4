use dioxus::prelude::*;

use crate::chat::ChatWidget;
use crate::config::WidgetConfig;
use crate::viewport::ViewportAdapter;

#[component]
pub fn App() -> Element {
    let config = use_context::<WidgetConfig>();

    let viewport = config.viewport;
    let ids = config.elements.clone();
    use_effect(move || {
        if let Err(e) = ViewportAdapter::install(viewport, ids.clone()) {
            dioxus_logger::tracing::warn!("Viewport adapter unavailable: {}", e);
        }
    });

    rsx! {
        ChatWidget {}
    }
}
