pub mod app;
pub mod chat;
pub mod config;
pub mod dom;
pub mod error;
pub mod viewport;

pub use app::App;
pub use config::WidgetConfig;
pub use error::WidgetError;
