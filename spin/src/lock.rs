use core::sync::atomic::{AtomicBool, Ordering};

/// A single-word busy-wait lock.
///
/// There is no owner tracking, so acquiring it twice from the same execution context deadlocks.
/// There is no fairness either: a waiter may starve while others keep winning the test-and-set.
#[derive(Default, Debug)]
pub struct SpinLock {
    locked: AtomicBool,
}

impl SpinLock {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Clear the flag, leaving the lock released.
    pub fn init(&self) {
        self.locked.store(false, Ordering::Release);
    }

    /// Spin until the test-and-set observes the lock released.
    pub fn acquire(&self) {
        while self.locked.swap(true, Ordering::Acquire) {
            // read-only spin until the holder lets go
            while self.locked.load(Ordering::Relaxed) {
                core::hint::spin_loop();
            }
        }
    }

    /// Take the lock only if it's free at the moment.
    pub fn try_acquire(&self) -> bool {
        !self.locked.swap(true, Ordering::Acquire)
    }

    pub fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }
}
