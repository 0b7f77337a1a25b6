use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};

/// Bounded pool of concurrency slots for in-flight pipeline runs.
///
/// Owns the live in-flight counter that doubles as the queue_depth
/// telemetry snapshot. Slots are only ever released by dropping the guard;
/// nothing force-revokes one.
pub struct SlotPool {
    semaphore: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

/// RAII guard for one occupied slot.
///
/// Dropping the guard frees the slot, decrements the in-flight counter and
/// wakes any drain waiters.
pub struct Slot {
    in_flight: Arc<AtomicUsize>,
    drained: Arc<Notify>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for Slot {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.drained.notify_waiters();
        }
    }
}

impl SlotPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            drained: Arc::new(Notify::new()),
        }
    }

    /// Reserve one slot, waiting until one is free.
    pub async fn acquire(&self) -> Slot {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("slot pool semaphore closed");
        self.in_flight.fetch_add(1, Ordering::AcqRel);

        Slot {
            in_flight: Arc::clone(&self.in_flight),
            drained: Arc::clone(&self.drained),
            _permit: permit,
        }
    }

    /// Live number of occupied slots.
    pub fn current_depth(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Wait until every slot has been released.
    ///
    /// Shutdown-only: callers must have stopped acquiring first. The wait is
    /// unbounded because in-flight runs are never interrupted.
    pub async fn drain(&self) {
        loop {
            let notified = self.drained.notified();
            if self.in_flight.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}
