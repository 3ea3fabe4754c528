//! # Binary lock
//! A mutex made out of a u32 state and the wait & wake calls:
//! - 0 - unlocked
//! - 1 - locked, nobody's waiting
//! - 2 - locked, other threads may be waiting
//!
//! Unlocking only calls `wake_one` when the state says there could be a sleeper,
//! so an uncontended lock never goes to the kernel.
//!
//! ## Ownership
//! Unlike std's Mutex, the lock has explicit [BinaryLock::acquire] and [BinaryLock::release]
//! that don't have to happen in one scope - a ring participant takes its units in `enter`
//! and gives them back in `leave`. To catch misuse it remembers who holds it:
//! - acquiring twice from the same thread is [SyncError::Reentrant] (it would deadlock otherwise)
//! - releasing from any other thread is [SyncError::NotHolder]
//!
//! The scoped way is still there: [BinaryLock::lock] returns a guard that unlocks on drop.
//! While a guard is out, [BinaryLock::release] is refused with [SyncError::NotHolder]:
//! the guard owns the unlock.

use std::{
    cell::UnsafeCell,
    marker::PhantomData,
    ops::{Deref, DerefMut},
    sync::atomic::{
        AtomicBool, AtomicU32, AtomicU64,
        Ordering::{Acquire, Relaxed, Release},
    },
};

use atomic_wait::{wait, wake_one};

use crate::error::SyncError;

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;
const CONTENDED: u32 = 2;

/// 0 is reserved for "no holder"
const NO_HOLDER: u64 = 0;

static NEXT_HOLDER: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static HOLDER: u64 = NEXT_HOLDER.fetch_add(1, Relaxed);
}

/// A process-unique token of the calling thread
pub(crate) fn current_holder() -> u64 {
    HOLDER.with(|token| *token)
}

pub struct BinaryLock<Y> {
    state: AtomicU32,
    /// token of the thread inside, [NO_HOLDER] if unlocked
    holder: AtomicU64,
    /// taken through [BinaryLock::lock], only the guard may unlock
    guarded: AtomicBool,
    value: UnsafeCell<Y>,
}

unsafe impl<Y> Sync for BinaryLock<Y> where Y: Send {}

impl<Y> BinaryLock<Y> {
    pub const fn new(value: Y) -> Self {
        Self {
            state: AtomicU32::new(UNLOCKED),
            holder: AtomicU64::new(NO_HOLDER),
            guarded: AtomicBool::new(false),
            value: UnsafeCell::new(value),
        }
    }

    /// Blocks until the calling thread holds the lock.
    pub fn acquire(&self) -> Result<(), SyncError> {
        let me = current_holder();
        // only this very thread could have stored its own token there
        if self.holder.load(Relaxed) == me {
            return Err(SyncError::Reentrant);
        }
        if self
            .state
            .compare_exchange(UNLOCKED, LOCKED, Acquire, Relaxed)
            .is_err()
        {
            Self::lock_contended(&self.state);
        }
        self.holder.store(me, Relaxed);
        Ok(())
    }

    /// Takes the lock only if it's free right now.
    pub fn try_acquire(&self) -> Result<bool, SyncError> {
        let me = current_holder();
        if self.holder.load(Relaxed) == me {
            return Err(SyncError::Reentrant);
        }
        if self
            .state
            .compare_exchange(UNLOCKED, LOCKED, Acquire, Relaxed)
            .is_ok()
        {
            self.holder.store(me, Relaxed);
            return Ok(true);
        }
        Ok(false)
    }

    /// Gives the lock back. Only the holder may do that, and not while its guard is alive.
    pub fn release(&self) -> Result<(), SyncError> {
        if !self.is_held_by_current_thread() || self.guarded.load(Relaxed) {
            return Err(SyncError::NotHolder);
        }
        self.unlock();
        Ok(())
    }

    /// Scoped acquisition with access to the protected value.
    pub fn lock(&self) -> Result<BinaryLockGuard<'_, Y>, SyncError> {
        self.acquire()?;
        self.guarded.store(true, Relaxed);
        Ok(BinaryLockGuard {
            lock: self,
            _not_send: PhantomData,
        })
    }

    pub fn is_locked(&self) -> bool {
        self.state.load(Relaxed) != UNLOCKED
    }

    pub fn is_held_by_current_thread(&self) -> bool {
        self.holder.load(Relaxed) == current_holder()
    }

    /// Consumes the lock, there's nobody to race with.
    pub fn into_inner(self) -> Y {
        self.value.into_inner()
    }

    /// - spin for a bit, a critical section here is a push or an increment
    /// - go to sleep if it's still locked
    #[cold]
    fn lock_contended(state: &AtomicU32) {
        let mut spin_count = 0;

        // only check for LOCKED, CONTENDED means others already gave up spinning
        while state.load(Relaxed) == LOCKED && spin_count < 100 {
            spin_count += 1;
            std::hint::spin_loop();
        }

        if state
            .compare_exchange(UNLOCKED, LOCKED, Acquire, Relaxed)
            .is_ok()
        {
            return;
        }

        // leave CONTENDED behind so the unlocking side knows to wake someone
        while state.swap(CONTENDED, Acquire) != UNLOCKED {
            wait(state, CONTENDED);
        }
    }

    fn unlock(&self) {
        self.holder.store(NO_HOLDER, Relaxed);
        if self.state.swap(UNLOCKED, Release) == CONTENDED {
            wake_one(&self.state);
        }
    }
}

/// Proof of holding the lock. Unlocks on drop.
///
/// It isn't Send: the holder token belongs to the thread that locked.
pub struct BinaryLockGuard<'a, Y> {
    lock: &'a BinaryLock<Y>,
    _not_send: PhantomData<*const ()>,
}

impl<Y> Deref for BinaryLockGuard<'_, Y> {
    type Target = Y;
    fn deref(&self) -> &Self::Target {
        // SAFETY: existence of the guard means the lock is held
        unsafe { &*self.lock.value.get() }
    }
}

impl<Y> DerefMut for BinaryLockGuard<'_, Y> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: existence of the guard means the lock is held
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<Y> Drop for BinaryLockGuard<'_, Y> {
    fn drop(&mut self) {
        self.lock.guarded.store(false, Relaxed);
        self.lock.unlock();
    }
}
