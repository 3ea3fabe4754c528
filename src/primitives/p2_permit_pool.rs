//! # Permit pool
//! A counting semaphore: C permits, [PermitPool::acquire] takes one or sleeps until there's one,
//! [PermitPool::release] brings one back and wakes a single sleeper.
//!
//! It's the VecDeque + Condvar channel idea with a plain counter instead of the queue.
//! The Condvar gives timed waits for free, that's why it isn't built on the futex directly.
//!
//! Permits aren't owned: whoever got one doesn't have to be the one to bring it back.
//! The reader-writer lock relies on that - the first reader takes the writer's permit
//! and the last one, possibly another thread, returns it.
//! What's caught is a release above the capacity, see [SyncError::Overflow].
//!
//! Nobody is queued - a woken thread competes with newcomers for the permit.

use std::{
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use crate::error::SyncError;

#[derive(Debug)]
pub struct PermitPool {
    available: Mutex<usize>,
    released: Condvar,
    capacity: usize,
}

impl PermitPool {
    /// All the permits are available from the start.
    pub fn new(capacity: usize) -> Self {
        Self::with_available(capacity, capacity)
    }

    /// No permits are available yet, releases fill it up to `capacity`.
    pub fn empty(capacity: usize) -> Self {
        Self::with_available(capacity, 0)
    }

    fn with_available(capacity: usize, available: usize) -> Self {
        Self {
            available: Mutex::new(available),
            released: Condvar::new(),
            capacity,
        }
    }

    /// Blocks until a permit is available and takes it.
    pub fn acquire(&self) {
        let mut available = self
            .released
            .wait_while(self.count(), |available| *available == 0)
            .unwrap_or_else(PoisonError::into_inner);
        *available -= 1;
    }

    /// Takes a permit if there's one right now.
    pub fn try_acquire(&self) -> bool {
        let mut available = self.count();
        if *available == 0 {
            return false;
        }
        *available -= 1;
        true
    }

    /// Same as [PermitPool::acquire], but gives up after `timeout`.
    /// Returns whether a permit was taken.
    pub fn acquire_timeout(&self, timeout: Duration) -> bool {
        let (mut available, _) = self
            .released
            .wait_timeout_while(self.count(), timeout, |available| *available == 0)
            .unwrap_or_else(PoisonError::into_inner);
        // a permit may have shown up right at the deadline, don't waste it
        if *available == 0 {
            return false;
        }
        *available -= 1;
        true
    }

    /// Brings a permit back and wakes one waiter, if any.
    pub fn release(&self) -> Result<(), SyncError> {
        let mut available = self.count();
        if *available == self.capacity {
            return Err(SyncError::Overflow {
                capacity: self.capacity,
            });
        }
        *available += 1;
        drop(available);
        self.released.notify_one();
        Ok(())
    }

    /// A snapshot, it may be outdated by the time it's looked at
    pub fn available(&self) -> usize {
        *self.count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// the counter is a plain integer, a panic elsewhere can't leave it half-updated
    fn count(&self) -> MutexGuard<'_, usize> {
        self.available.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
