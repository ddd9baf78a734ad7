//! Tile render worker - runs in separate thread(s)

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, warn};

use super::TILE_SIZE;
use super::cache::TileCache;
use super::queue::DirtyConsumer;
use super::redraw::RedrawSignal;
use super::source::{ImageSource, SourceError};
use super::types::{TileBuffer, TileCoordinate};

/// What happened to one dirty coordinate
#[derive(Debug)]
pub enum RenderOutcome {
    /// New content committed to the cache
    Rendered,
    /// Tile was no longer cached, nothing rendered
    Evicted,
    /// Rendered, but the tile was evicted or the zoom changed before commit
    Discarded,
    /// Source failed; the cached buffer is unchanged
    Failed(SourceError),
    /// Source failed and the cached content was from an older zoom level, so
    /// the tile went back to its placeholder
    Reset(SourceError),
}

/// Main worker loop. Returns when the queue yields a shutdown or loses its
/// producer.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
pub fn render_worker(
    queue: DirtyConsumer,
    cache: Arc<Mutex<TileCache>>,
    source: Arc<dyn ImageSource>,
    redraw: Arc<RedrawSignal>,
) {
    debug!("render worker started");

    while let Some(coord) = queue.take() {
        match render_tile(coord, &cache, source.as_ref()) {
            RenderOutcome::Rendered => redraw.request(),
            RenderOutcome::Failed(e) => warn!("tile {coord} left unchanged: {e}"),
            RenderOutcome::Reset(e) => {
                warn!("tile {coord} reset to placeholder: {e}");
                redraw.request();
            }
            RenderOutcome::Evicted | RenderOutcome::Discarded => {}
        }
    }

    debug!("render worker stopped");
}

/// Render one tile. The cache lock is taken twice, briefly: once to confirm
/// the tile is still wanted and read the zoom epoch, and once to commit or,
/// on failure, to drop content left over from an older zoom level. The
/// source runs with the lock released.
pub fn render_tile(
    coord: TileCoordinate,
    cache: &Mutex<TileCache>,
    source: &dyn ImageSource,
) -> RenderOutcome {
    let (exponent, downsample, background) = {
        let guard = cache.lock().unwrap_or_else(PoisonError::into_inner);
        if !guard.contains(&coord) {
            return RenderOutcome::Evicted;
        }
        let (exponent, downsample) = guard.zoom();
        (exponent, downsample, guard.palette().background)
    };

    let mut buffer = TileBuffer::blank(background);
    let size = TILE_SIZE as u32;

    let painted = panic::catch_unwind(AssertUnwindSafe(|| {
        source.paint_region(
            buffer.pixels_mut(),
            0,
            0,
            coord.x,
            coord.y,
            size,
            size,
            downsample,
        )
    }));

    let result = match painted {
        Ok(result) => result,
        Err(payload) => Err(SourceError::Panicked(panic_message(payload.as_ref()))),
    };
    if let Err(e) = result {
        let reset = cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .mark_failed(coord, exponent);
        return if reset {
            RenderOutcome::Reset(e)
        } else {
            RenderOutcome::Failed(e)
        };
    }

    let installed = cache
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .install(coord, exponent, buffer.into_rendered(exponent));

    if installed {
        RenderOutcome::Rendered
    } else {
        RenderOutcome::Discarded
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
