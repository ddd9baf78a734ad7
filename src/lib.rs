// Export modules for use in tests
pub mod event_source;
pub mod input;
pub mod main_app;
pub mod panic_handler;
pub mod settings;
pub mod slide;
pub mod widget;

pub mod test_utils;

// Re-export main app components
pub use main_app::{App, run_app_with_event_source};
