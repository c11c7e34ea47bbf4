use dioxus::LaunchBuilder;
use dioxus_logger::tracing::Level;

use chat_widget::{App, WidgetConfig};

fn main() {
    let loaded = WidgetConfig::from_page();
    let level = loaded
        .as_ref()
        .map(WidgetConfig::log_level)
        .unwrap_or(Level::INFO);
    dioxus_logger::init(level).ok();

    LaunchBuilder::new()
        .with_context(WidgetConfig::or_default(loaded))
        .launch(App);
}
