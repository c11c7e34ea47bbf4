pub mod adapter;
pub mod detect;
pub mod telegram;

pub use adapter::ViewportAdapter;
pub use detect::{LayoutChange, LayoutTracker, MobileOs};
