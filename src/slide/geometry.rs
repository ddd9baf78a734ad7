//! Tile grid arithmetic
//!
//! All coordinates are pixels in the current downsample's coordinate space.
//! Rectangles are half-open: a rectangle at `x` with width `w` covers
//! `x..x + w`, so tiles that only touch an edge do not intersect.

use super::TILE_SIZE;
use super::types::TileCoordinate;

/// Floor-align a pixel coordinate to the tile grid.
///
/// Rounds toward negative infinity, so `tile_origin(-1) == -TILE_SIZE`.
#[must_use]
pub const fn tile_origin(p: i64) -> i64 {
    p.div_euclid(TILE_SIZE) * TILE_SIZE
}

/// Distance from `tile_origin(p)` to `p`, always in `0..TILE_SIZE`.
#[must_use]
pub const fn tile_offset(p: i64) -> i64 {
    p.rem_euclid(TILE_SIZE)
}

/// Axis-aligned pixel rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl PixelRect {
    #[must_use]
    pub const fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn right(&self) -> i64 {
        self.x + self.width
    }

    #[must_use]
    pub const fn bottom(&self) -> i64 {
        self.y + self.height
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[must_use]
    pub const fn intersects(&self, other: &PixelRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Grow by `dx` on the left and right, `dy` on the top and bottom
    #[must_use]
    pub const fn expand(&self, dx: i64, dy: i64) -> Self {
        Self::new(
            self.x - dx,
            self.y - dy,
            self.width + 2 * dx,
            self.height + 2 * dy,
        )
    }
}

/// Rectangle covered by the tile at `coord`
#[must_use]
pub const fn tile_rect(coord: TileCoordinate) -> PixelRect {
    PixelRect::new(coord.x, coord.y, TILE_SIZE, TILE_SIZE)
}

/// Window around `view` that keeps tiles cached: three times the width and
/// height with `view` in the middle.
#[must_use]
pub const fn retention_window(view: PixelRect) -> PixelRect {
    view.expand(view.width, view.height)
}

/// Every grid origin whose tile intersects `rect`, in row-major order.
#[must_use]
pub fn grid_covering(rect: PixelRect) -> Vec<TileCoordinate> {
    if rect.is_empty() {
        return Vec::new();
    }

    let start_x = tile_origin(rect.x);
    let start_y = tile_origin(rect.y);

    let mut coords = Vec::new();
    let mut y = start_y;
    while y < rect.bottom() {
        let mut x = start_x;
        while x < rect.right() {
            coords.push(TileCoordinate::new(x, y));
            x += TILE_SIZE;
        }
        y += TILE_SIZE;
    }
    coords
}
