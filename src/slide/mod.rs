//! Tiled slide rendering infrastructure

mod cache;
mod compositor;
mod geometry;
mod link;
mod queue;
mod redraw;
mod service;
mod source;
mod types;
mod view;
mod viewport;
mod worker;

pub use cache::{ReconcileStats, TileCache};
pub use compositor::{FrameCanvas, PaintPlan, TileCanvas, TileDraw, plan_paint};
pub use geometry::*;
pub use link::{Mirror, ViewGroup, ViewId, ViewLinks};
pub use queue::{DirtyConsumer, DirtyMessage, DirtyQueue};
pub use redraw::{NoopScheduler, RedrawScheduler, RedrawSignal};
pub use service::TilePipeline;
pub use source::{ImageSource, RasterSlide, SourceError, SyntheticSlide};
pub use types::*;
pub use view::{SlideView, ViewConfig};
pub use viewport::ViewportState;
pub use worker::{RenderOutcome, render_tile, render_worker};

/// Edge length of a square tile in pixels
pub const TILE_SIZE: i64 = 256;

/// Default downsample base (each zoom step scales by this factor)
pub const DEFAULT_DOWNSAMPLE_BASE: f64 = 1.2;

/// Default maximum downsample exponent
pub const DEFAULT_MAX_DOWNSAMPLE_EXPONENT: i32 = 40;

/// Default number of render worker threads
pub const DEFAULT_WORKERS: usize = 1;

/// Default keyboard pan distance in pixels
pub const KEYBOARD_SCROLL_AMOUNT: i64 = 100;
