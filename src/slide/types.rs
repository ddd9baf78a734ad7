//! Core types for tiled slide rendering

use std::cmp::Ordering;

use image::{Rgb, RgbImage};

use super::TILE_SIZE;

/// Grid-aligned origin of a tile in the current downsample's pixel space
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoordinate {
    pub x: i64,
    pub y: i64,
}

impl TileCoordinate {
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

// Row-major: y first, then x
impl Ord for TileCoordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for TileCoordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i64,
    pub height: i64,
}

impl Size {
    #[must_use]
    pub const fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Lifecycle of a tile buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileState {
    /// Freshly allocated, showing the marker pattern
    Placeholder,
    /// Content painted by the image source
    Rendered,
}

/// Colors used when allocating placeholder tiles
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TilePalette {
    pub background: Rgb<u8>,
    pub marker: Rgb<u8>,
}

impl Default for TilePalette {
    fn default() -> Self {
        Self {
            background: Rgb([255, 255, 255]),
            marker: Rgb([255, 0, 0]),
        }
    }
}

/// A `TILE_SIZE` x `TILE_SIZE` RGB pixel buffer.
///
/// Buffers are shared through `Arc` once they are in the cache and are never
/// mutated after that point; re-rendering produces a new buffer.
#[derive(Clone)]
pub struct TileBuffer {
    pixels: RgbImage,
    state: TileState,
    /// Zoom exponent the content was rendered at; `None` for placeholders
    rendered_at: Option<i32>,
}

impl TileBuffer {
    /// Allocate a buffer with the placeholder marker drawn: background fill,
    /// both diagonals and a one-pixel border.
    #[must_use]
    pub fn placeholder(palette: &TilePalette) -> Self {
        let size = TILE_SIZE as u32;
        let mut pixels = RgbImage::from_pixel(size, size, palette.background);

        for i in 0..size {
            pixels.put_pixel(i, i, palette.marker);
            pixels.put_pixel(i, size - 1 - i, palette.marker);
            pixels.put_pixel(i, 0, palette.marker);
            pixels.put_pixel(i, size - 1, palette.marker);
            pixels.put_pixel(0, i, palette.marker);
            pixels.put_pixel(size - 1, i, palette.marker);
        }

        Self {
            pixels,
            state: TileState::Placeholder,
            rendered_at: None,
        }
    }

    /// Allocate a blank buffer for an image source to paint into
    #[must_use]
    pub fn blank(background: Rgb<u8>) -> Self {
        let size = TILE_SIZE as u32;
        Self {
            pixels: RgbImage::from_pixel(size, size, background),
            state: TileState::Placeholder,
            rendered_at: None,
        }
    }

    /// Mark the buffer as holding source content painted at `exponent`
    #[must_use]
    pub fn into_rendered(mut self, exponent: i32) -> Self {
        self.state = TileState::Rendered;
        self.rendered_at = Some(exponent);
        self
    }

    #[must_use]
    pub fn state(&self) -> TileState {
        self.state
    }

    #[must_use]
    pub fn rendered_at(&self) -> Option<i32> {
        self.rendered_at
    }

    #[must_use]
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbImage {
        &mut self.pixels
    }
}

impl std::fmt::Debug for TileBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileBuffer")
            .field("width", &self.pixels.width())
            .field("height", &self.pixels.height())
            .field("state", &self.state)
            .field("rendered_at", &self.rendered_at)
            .finish_non_exhaustive()
    }
}
