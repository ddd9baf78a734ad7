//! Coalesced redraw requests
//!
//! Workers call [`RedrawSignal::request`] after every committed tile. Only the
//! first request after a paint reaches the host scheduler; the rest collapse
//! into the pending flag until the host calls [`RedrawSignal::take_pending`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Host hook that arranges for a paint to happen soon
pub trait RedrawScheduler: Send + Sync {
    fn schedule_redraw(&self);
}

/// Scheduler for hosts that poll [`RedrawSignal::take_pending`] from their loop
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopScheduler;

impl RedrawScheduler for NoopScheduler {
    fn schedule_redraw(&self) {}
}

impl<F> RedrawScheduler for F
where
    F: Fn() + Send + Sync,
{
    fn schedule_redraw(&self) {
        self();
    }
}

pub struct RedrawSignal {
    pending: AtomicBool,
    scheduler: Arc<dyn RedrawScheduler>,
}

impl RedrawSignal {
    #[must_use]
    pub fn new(scheduler: Arc<dyn RedrawScheduler>) -> Self {
        Self {
            pending: AtomicBool::new(false),
            scheduler,
        }
    }

    /// Request a redraw; forwarded to the scheduler only if none is pending
    pub fn request(&self) {
        if !self.pending.swap(true, Ordering::AcqRel) {
            self.scheduler.schedule_redraw();
        }
    }

    /// Clear the pending flag, returning whether a redraw had been requested.
    /// Hosts call this right before painting.
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

impl Default for RedrawSignal {
    fn default() -> Self {
        Self::new(Arc::new(NoopScheduler))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn requests_coalesce_until_taken() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let signal = RedrawSignal::new(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        signal.request();
        signal.request();
        signal.request();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(signal.take_pending());
        assert!(!signal.take_pending());

        signal.request();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
