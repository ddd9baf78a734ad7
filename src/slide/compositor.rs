//! Paint planning and compositing
//!
//! The compositor never renders: it picks up whatever buffers the cache holds
//! for the grid positions around the viewport and hands them to a canvas at
//! their screen offsets. Missing tiles leave the background showing.

use std::sync::{Arc, Mutex, PoisonError};

use image::{Rgb, RgbImage, imageops};

use super::cache::TileCache;
use super::geometry::{PixelRect, grid_covering};
use super::types::{TileBuffer, TileCoordinate};
use super::viewport::ViewportState;

/// One tile to draw at a screen offset
#[derive(Clone, Debug)]
pub struct TileDraw {
    pub coord: TileCoordinate,
    pub x: i64,
    pub y: i64,
    pub tile: Arc<TileBuffer>,
}

#[derive(Clone, Debug, Default)]
pub struct PaintPlan {
    pub draws: Vec<TileDraw>,
    /// Grid positions with no cached tile
    pub missing: usize,
}

impl PaintPlan {
    pub fn draw(&self, canvas: &mut dyn TileCanvas) {
        for draw in &self.draws {
            canvas.draw_tile(&draw.tile, draw.x, draw.y);
        }
    }
}

/// Drawing surface supplied by the host
pub trait TileCanvas {
    /// Draw `tile` with its top-left at `(x, y)`; parts outside the surface
    /// are clipped.
    fn draw_tile(&mut self, tile: &TileBuffer, x: i64, y: i64);
}

/// Collect the tiles to draw for `state`. The cache lock is held only while
/// cloning buffer handles.
#[must_use]
pub fn plan_paint(state: &ViewportState, cache: &Mutex<TileCache>) -> PaintPlan {
    let viewport = state.viewport_size();
    let screen = state.screen_size();
    let area = PixelRect::new(state.pan_x, state.pan_y, viewport.width, viewport.height)
        .expand(screen.width, screen.height);

    let coords = grid_covering(area);
    let mut plan = PaintPlan {
        draws: Vec::with_capacity(coords.len()),
        missing: 0,
    };

    let guard = cache.lock().unwrap_or_else(PoisonError::into_inner);
    for coord in coords {
        match guard.get(&coord) {
            Some(tile) => plan.draws.push(TileDraw {
                coord,
                x: coord.x - state.pan_x,
                y: coord.y - state.pan_y,
                tile,
            }),
            None => plan.missing += 1,
        }
    }
    plan
}

/// In-memory RGB frame, cleared to the background before each composite
pub struct FrameCanvas {
    frame: RgbImage,
    background: Rgb<u8>,
}

impl FrameCanvas {
    #[must_use]
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            frame: RgbImage::from_pixel(width, height, background),
            background,
        }
    }

    /// Resize and clear
    pub fn reset(&mut self, width: u32, height: u32) {
        if self.frame.dimensions() == (width, height) {
            for px in self.frame.pixels_mut() {
                *px = self.background;
            }
        } else {
            self.frame = RgbImage::from_pixel(width, height, self.background);
        }
    }

    #[must_use]
    pub fn frame(&self) -> &RgbImage {
        &self.frame
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.frame.height()
    }
}

impl TileCanvas for FrameCanvas {
    fn draw_tile(&mut self, tile: &TileBuffer, x: i64, y: i64) {
        imageops::replace(&mut self.frame, tile.pixels(), x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::super::TILE_SIZE;
    use super::super::queue::DirtyQueue;
    use super::super::types::Size;
    use super::*;

    fn setup(pan: (i64, i64)) -> (ViewportState, Mutex<TileCache>) {
        let mut state = ViewportState::new(1.2, 40);
        state.set_viewport_size(Size::new(300, 200));
        state.set_screen_size(Size::new(300, 200));
        state.pan_x = pan.0;
        state.pan_y = pan.1;

        let mut cache = TileCache::default();
        cache.reconcile(state.view_rect(), &DirtyQueue::new());
        (state, Mutex::new(cache))
    }

    #[test]
    fn offsets_are_relative_to_pan() {
        let (state, cache) = setup((-21, 300));
        let plan = plan_paint(&state, &cache);

        assert_eq!(plan.missing, 0);
        for draw in &plan.draws {
            assert_eq!(draw.x, draw.coord.x + 21);
            assert_eq!(draw.y, draw.coord.y - 300);
        }
        assert!(
            plan.draws
                .iter()
                .any(|d| d.x <= 0 && d.x + TILE_SIZE > 0 && d.y <= 0 && d.y + TILE_SIZE > 0)
        );
    }

    #[test]
    fn missing_tiles_are_skipped() {
        let (mut state, cache) = setup((0, 0));
        state.pan(10_000, 0);

        let plan = plan_paint(&state, &cache);

        assert!(plan.draws.is_empty());
        assert!(plan.missing > 0);
    }

    #[test]
    fn frame_canvas_clips() {
        let bg = Rgb([0, 0, 0]);
        let mut canvas = FrameCanvas::new(10, 10, bg);
        let tile = TileBuffer::blank(Rgb([200, 100, 50]));

        canvas.draw_tile(&tile, -250, 5);

        assert_eq!(*canvas.frame().get_pixel(0, 5), Rgb([200, 100, 50]));
        assert_eq!(*canvas.frame().get_pixel(5, 9), Rgb([200, 100, 50]));
        assert_eq!(*canvas.frame().get_pixel(6, 5), bg);
        assert_eq!(*canvas.frame().get_pixel(0, 4), bg);
    }

    #[test]
    fn plan_draws_into_canvas() {
        let (state, cache) = setup((0, 0));
        let plan = plan_paint(&state, &cache);
        let mut canvas = FrameCanvas::new(300, 200, Rgb([0, 0, 255]));

        plan.draw(&mut canvas);

        // Placeholder border at the tile origin
        let marker = cache.lock().unwrap().palette().marker;
        assert_eq!(*canvas.frame().get_pixel(0, 0), marker);
        assert_eq!(*canvas.frame().get_pixel(256, 0), marker);
    }
}
