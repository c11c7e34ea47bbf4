pub mod connection;
pub mod log;
pub mod session;
pub mod socket;
pub mod view;

pub use session::{ChatSession, ConnectionState, Directive};
pub use view::ChatWidget;
