//! Slide viewer widget components

pub mod slide_pane;

pub use slide_pane::{SlidePane, frame_size};
