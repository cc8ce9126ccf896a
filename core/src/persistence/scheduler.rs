//! Debounced flush scheduling
//!
//! The scheduler owns a single timer slot. Arming it aborts whatever timer is
//! already waiting, so a burst of mutations collapses into one flush that runs
//! once the burst has been quiet for the configured delay.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::debug;

struct Armed {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct FlushScheduler {
    enabled: bool,
    delay: Duration,
    runtime: Handle,
    slot: Mutex<Option<Armed>>,
    next_generation: AtomicU64,
    // Fired timers whose flush has not returned yet
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Marks a fired flush as running until dropped.
struct Running<'a> {
    scheduler: &'a FlushScheduler,
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        if self.scheduler.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.scheduler.idle.notify_waiters();
        }
    }
}

impl FlushScheduler {
    /// A disabled scheduler never arms; the owner flushes explicitly.
    pub fn new(enabled: bool, delay: Duration, runtime: Handle) -> Self {
        Self {
            enabled,
            delay,
            runtime,
            slot: Mutex::new(None),
            next_generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            idle: Notify::new(),
        }
    }

    /// Whether a timer is waiting to fire
    pub fn is_armed(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Arm the timer, replacing any armed one. `flush` runs after the delay
    /// unless the timer is replaced or cancelled first.
    pub fn schedule<F, Fut>(self: &Arc<Self>, flush: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if !self.enabled {
            return;
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;

        // Held until the new timer is stored, so the task cannot disarm
        // itself before it is in the slot
        let mut slot = self.slot.lock();
        if let Some(previous) = slot.take() {
            previous.handle.abort();
            debug!(generation, "Coalesced pending flush");
        }

        let scheduler = Arc::clone(self);
        let delay = self.delay;
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(_running) = scheduler.disarm(generation) {
                flush().await;
            }
        });

        *slot = Some(Armed { generation, handle });
        debug!(generation, delay_ms = delay.as_millis() as u64, "Armed flush timer");
    }

    /// Cancel the armed timer. Returns whether one was armed.
    ///
    /// A timer that has already fired is no longer in the slot, so its flush is
    /// left to finish.
    pub fn cancel(&self) -> bool {
        match self.slot.lock().take() {
            Some(armed) => {
                armed.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Wait until no fired flush is still running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Called by a fired timer: empties the slot if it still holds this timer
    /// and marks its flush as running.
    fn disarm(&self, generation: u64) -> Option<Running<'_>> {
        let mut slot = self.slot.lock();
        match slot.as_ref() {
            Some(armed) if armed.generation == generation => {
                *slot = None;
                // Counted under the slot lock, so a caller that sees the slot
                // empty also sees the flush as running
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                Some(Running { scheduler: self })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn scheduler(enabled: bool) -> Arc<FlushScheduler> {
        Arc::new(FlushScheduler::new(
            enabled,
            Duration::from_millis(100),
            Handle::current(),
        ))
    }

    fn counting_flush(counter: &Arc<AtomicUsize>) -> impl FnOnce() -> std::future::Ready<()> + Send + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_flush() {
        let scheduler = scheduler(true);
        let flushes = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            scheduler.schedule(counting_flush(&flushes));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(scheduler.is_armed());
        assert_eq!(flushes.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(flushes.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_flush_separately() {
        let scheduler = scheduler(true);
        let flushes = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(counting_flush(&flushes));
        tokio::time::sleep(Duration::from_millis(150)).await;
        scheduler.schedule(counting_flush(&flushes));
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(flushes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let scheduler = scheduler(true);
        let flushes = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(counting_flush(&flushes));
        assert!(scheduler.cancel());
        assert!(!scheduler.cancel());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(flushes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_idle_waits_for_running_flush() {
        let scheduler = scheduler(true);
        let flushes = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&flushes);
        scheduler.schedule(move || async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // Fired, but the flush is still sleeping
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!scheduler.is_armed());
        assert_eq!(flushes.load(Ordering::SeqCst), 0);

        scheduler.wait_idle().await;
        assert_eq!(flushes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_when_nothing_runs() {
        scheduler(true).wait_idle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_scheduler_never_arms() {
        let scheduler = scheduler(false);
        let flushes = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(counting_flush(&flushes));
        assert!(!scheduler.is_armed());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(flushes.load(Ordering::SeqCst), 0);
    }
}
