//! Tile cache keyed by grid coordinate
//!
//! Holds exactly the tiles intersecting the retention window of the last
//! reconciled view. The cache is shared with render workers behind a single
//! `Mutex`; every method here runs with that lock held by the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use super::geometry::{PixelRect, grid_covering, retention_window, tile_rect};
use super::queue::DirtyQueue;
use super::types::{TileBuffer, TileCoordinate, TilePalette};

/// Result of a reconcile pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub added: usize,
    pub removed: usize,
}

pub struct TileCache {
    tiles: BTreeMap<TileCoordinate, Arc<TileBuffer>>,
    palette: TilePalette,
    /// Zoom epoch workers render against
    exponent: i32,
    downsample: f64,
}

impl TileCache {
    #[must_use]
    pub fn new(palette: TilePalette) -> Self {
        Self {
            tiles: BTreeMap::new(),
            palette,
            exponent: 0,
            downsample: 1.0,
        }
    }

    /// Drop tiles outside the retention window of `view` and add placeholders
    /// for every missing grid position inside it. New coordinates are
    /// submitted to `queue` without deduplication.
    pub fn reconcile(&mut self, view: PixelRect, queue: &DirtyQueue) -> ReconcileStats {
        let window = retention_window(view);

        let before = self.tiles.len();
        self.tiles.retain(|coord, _| tile_rect(*coord).intersects(&window));
        let removed = before - self.tiles.len();

        let mut added = 0;
        for coord in grid_covering(window) {
            if self.tiles.contains_key(&coord) {
                continue;
            }
            self.tiles.insert(coord, Arc::new(TileBuffer::placeholder(&self.palette)));
            queue.push(coord);
            added += 1;
        }

        if added > 0 || removed > 0 {
            debug!(
                "reconcile {window:?}: +{added} -{removed}, {} cached",
                self.tiles.len()
            );
        }

        ReconcileStats { added, removed }
    }

    /// Submit every cached coordinate for re-render, skipping ones already
    /// pending.
    pub fn invalidate_all(&self, queue: &DirtyQueue) {
        for coord in self.tiles.keys() {
            queue.push_unique(*coord);
        }
    }

    #[must_use]
    pub fn get(&self, coord: &TileCoordinate) -> Option<Arc<TileBuffer>> {
        self.tiles.get(coord).cloned()
    }

    #[must_use]
    pub fn contains(&self, coord: &TileCoordinate) -> bool {
        self.tiles.contains_key(coord)
    }

    /// Record the zoom level new renders should use
    pub fn set_zoom(&mut self, exponent: i32, downsample: f64) {
        self.exponent = exponent;
        self.downsample = downsample;
    }

    /// Current `(exponent, downsample)` epoch
    #[must_use]
    pub fn zoom(&self) -> (i32, f64) {
        (self.exponent, self.downsample)
    }

    /// Commit a rendered buffer. Refused if the tile was evicted or the zoom
    /// changed since the render started.
    pub fn install(&mut self, coord: TileCoordinate, exponent: i32, buffer: TileBuffer) -> bool {
        if exponent != self.exponent {
            return false;
        }
        match self.tiles.get_mut(&coord) {
            Some(slot) => {
                *slot = Arc::new(buffer);
                true
            }
            None => false,
        }
    }

    /// Fall back to the placeholder after a render at `exponent` failed, if
    /// the cached content is from an older zoom level. Content already at
    /// `exponent` is left alone. Returns true if the tile was reset.
    pub fn mark_failed(&mut self, coord: TileCoordinate, exponent: i32) -> bool {
        if exponent != self.exponent {
            return false;
        }
        let Some(slot) = self.tiles.get_mut(&coord) else {
            return false;
        };
        match slot.rendered_at() {
            Some(level) if level != exponent => {
                *slot = Arc::new(TileBuffer::placeholder(&self.palette));
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn palette(&self) -> &TilePalette {
        &self.palette
    }

    /// Cached coordinates in row-major order
    pub fn coordinates(&self) -> impl Iterator<Item = TileCoordinate> + '_ {
        self.tiles.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(TilePalette::default())
    }
}
