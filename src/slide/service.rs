//! Tile pipeline - owns the cache, the dirty queue and the worker pool

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use log::{debug, error};

use super::cache::TileCache;
use super::queue::DirtyQueue;
use super::redraw::RedrawSignal;
use super::source::ImageSource;
use super::types::TilePalette;
use super::worker::render_worker;

/// Shared tile cache plus the workers that fill it
pub struct TilePipeline {
    cache: Arc<Mutex<TileCache>>,
    queue: DirtyQueue,
    redraw: Arc<RedrawSignal>,
    workers: Vec<JoinHandle<()>>,
}

impl TilePipeline {
    /// Spawn `num_workers` render threads (at least one) pulling from a
    /// fresh dirty queue.
    #[must_use]
    pub fn new(
        source: Arc<dyn ImageSource>,
        palette: TilePalette,
        num_workers: usize,
        redraw: Arc<RedrawSignal>,
    ) -> Self {
        let cache = Arc::new(Mutex::new(TileCache::new(palette)));
        let queue = DirtyQueue::new();

        let mut workers = Vec::with_capacity(num_workers.max(1));
        for i in 0..num_workers.max(1) {
            let consumer = queue.consumer();
            let cache_clone = Arc::clone(&cache);
            let source_clone = Arc::clone(&source);
            let redraw_clone = Arc::clone(&redraw);

            let spawned = std::thread::Builder::new()
                .name(format!("tile-render-{i}"))
                .spawn(move || {
                    render_worker(consumer, cache_clone, source_clone, redraw_clone);
                });

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => error!("failed to spawn render worker {i}: {e}"),
            }
        }
        debug!("tile pipeline started with {} workers", workers.len());

        Self {
            cache,
            queue,
            redraw,
            workers,
        }
    }

    /// Lock the cache. Callers keep the guard only for lookups and updates.
    pub fn lock_cache(&self) -> MutexGuard<'_, TileCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<Mutex<TileCache>> {
        &self.cache
    }

    #[must_use]
    pub fn queue(&self) -> &DirtyQueue {
        &self.queue
    }

    #[must_use]
    pub fn redraw(&self) -> &Arc<RedrawSignal> {
        &self.redraw
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Drop the queued work, then wait for each worker to finish the tile it
    /// is rendering and exit
    pub fn shutdown(&mut self) {
        self.queue.shutdown(self.workers.len());
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("render worker panicked");
            }
        }
    }
}

impl Drop for TilePipeline {
    fn drop(&mut self) {
        // Workers still rendering finish their current tile and exit;
        // only signal here, never block.
        if !self.queue.is_stopping() {
            self.queue.shutdown(self.workers.len());
        }
    }
}
