//! Dirty tile queue
//!
//! Unbounded FIFO between the view and its render workers. Built on flume
//! because the worker pool needs MPMC: every worker clones the receiver and
//! pulls from the same queue.
//!
//! The queue tracks how many times each coordinate is pending so bulk
//! invalidation can skip coordinates that are already queued. The new-tile
//! path does not deduplicate, so a coordinate may be pending more than once.
//!
//! Shutdown raises a stop flag shared with every consumer and discards the
//! backlog, so workers stop after the tile they are rendering instead of
//! working through the rest of the queue.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use flume::{Receiver, RecvError, Sender};
use log::debug;

use super::types::TileCoordinate;

/// Message consumed by render workers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirtyMessage {
    /// Render the tile at this coordinate
    Render(TileCoordinate),
    /// Stop one worker
    Shutdown,
}

type PendingCounts = Arc<Mutex<HashMap<TileCoordinate, usize>>>;

/// Producer side, owned by the view
pub struct DirtyQueue {
    tx: Sender<DirtyMessage>,
    rx: Receiver<DirtyMessage>,
    pending: PendingCounts,
    stopping: Arc<AtomicBool>,
}

/// Consumer side, one per worker
#[derive(Clone)]
pub struct DirtyConsumer {
    rx: Receiver<DirtyMessage>,
    pending: PendingCounts,
    stopping: Arc<AtomicBool>,
}

impl DirtyQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            tx,
            rx,
            pending: Arc::new(Mutex::new(HashMap::new())),
            stopping: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Queue a coordinate unconditionally
    pub fn push(&self, coord: TileCoordinate) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        *pending.entry(coord).or_insert(0) += 1;
        let _ = self.tx.send(DirtyMessage::Render(coord));
    }

    /// Queue a coordinate unless it is already pending. Returns true if it
    /// was queued.
    pub fn push_unique(&self, coord: TileCoordinate) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.contains_key(&coord) {
            return false;
        }
        pending.insert(coord, 1);
        let _ = self.tx.send(DirtyMessage::Render(coord));
        true
    }

    /// Stop `workers` workers. Queued coordinates are dropped; a worker in
    /// the middle of a render finishes that tile first.
    pub fn shutdown(&self, workers: usize) {
        self.stopping.store(true, Ordering::Release);

        let discarded = self.rx.drain().count();
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        if discarded > 0 {
            debug!("dirty queue: discarded {discarded} queued tiles on shutdown");
        }

        // Wake workers blocked on an empty queue
        for _ in 0..workers {
            let _ = self.tx.send(DirtyMessage::Shutdown);
        }
    }

    #[must_use]
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_pending(&self, coord: &TileCoordinate) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(coord)
    }

    /// Messages waiting in the queue
    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    #[must_use]
    pub fn consumer(&self) -> DirtyConsumer {
        DirtyConsumer {
            rx: self.rx.clone(),
            pending: Arc::clone(&self.pending),
            stopping: Arc::clone(&self.stopping),
        }
    }
}

impl Default for DirtyQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DirtyConsumer {
    /// Block until the next coordinate arrives. `None` means stop: shutdown
    /// was requested or every producer is gone.
    pub fn take(&self) -> Option<TileCoordinate> {
        if self.stopping.load(Ordering::Acquire) {
            return None;
        }
        match self.rx.recv() {
            Ok(DirtyMessage::Render(_)) if self.stopping.load(Ordering::Acquire) => {
                debug!("dirty queue: stopping, dropping queued tile");
                None
            }
            Ok(DirtyMessage::Render(coord)) => {
                release(&self.pending, coord);
                Some(coord)
            }
            Ok(DirtyMessage::Shutdown) => {
                debug!("dirty queue: shutdown requested");
                None
            }
            Err(RecvError::Disconnected) => {
                debug!("dirty queue: producer dropped");
                None
            }
        }
    }
}

fn release(pending: &PendingCounts, coord: TileCoordinate) {
    let mut pending = pending.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(count) = pending.get_mut(&coord) {
        *count -= 1;
        if *count == 0 {
            pending.remove(&coord);
        }
    }
}
