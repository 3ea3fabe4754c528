//! # Shared access lock
//! Any number of readers at once, or a single writer with nobody else around.
//!
//! It's the textbook readers-writers solution rather than the single-atomic RWLock:
//! - a reader count behind its own binary lock
//! - a writer lock, a permit pool of 1
//!
//! The first reader in (count 0 -> 1) takes the writer lock on behalf of all readers,
//! the last reader out (count 1 -> 0) gives it back. Writers just take the writer lock.
//! It can't be a [BinaryLock] since the reader who took it and the one who returns it
//! are usually different threads.
//!
//! So the resource is always in one of:
//! - Idle - nobody
//! - Shared - readers, the writer lock held for them
//! - Exclusive - one writer holding the writer lock
//!
//! and Shared never turns into Exclusive (or back) without going through Idle.
//!
//! ## Misuse
//! The writer inside is remembered by its thread token, so it can't enter again (as a writer
//! or a reader) without deadlocking on itself, and nobody else can close its section for it.
//!
//! ## Readers first
//! A reader arriving while others are reading walks right in, so a steady stream of readers
//! can keep a writer waiting forever. That's how this algorithm behaves, it's not fixed here.

use std::{
    marker::PhantomData,
    sync::atomic::{
        AtomicU64, AtomicUsize,
        Ordering::{Acquire, Relaxed, Release},
    },
    time::Duration,
};

use strum_macros::Display;
use tracing::{error, trace};

use crate::{
    error::SyncError,
    primitives::{p1_binary_lock::current_holder, BinaryLock, PermitPool},
};

const NO_WRITER: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AccessState {
    Idle,
    Shared { readers: usize },
    Exclusive,
}

pub struct SharedAccessLock {
    readers: BinaryLock<usize>,
    writer: PermitPool,
    /// thread token of the writer inside, [NO_WRITER] otherwise
    writer_token: AtomicU64,
    /// lock-free copy of the reader count, for [SharedAccessLock::state] only
    readers_shadow: AtomicUsize,
}

impl Default for SharedAccessLock {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedAccessLock {
    pub fn new() -> Self {
        Self {
            readers: BinaryLock::new(0),
            writer: PermitPool::new(1),
            writer_token: AtomicU64::new(NO_WRITER),
            readers_shadow: AtomicUsize::new(0),
        }
    }

    /// Opens a read section. The first reader may wait for a writer to leave,
    /// and the readers arriving meanwhile queue up behind it on the count lock.
    pub fn read_enter(&self) -> Result<(), SyncError> {
        self.refuse_writer()?;
        let mut readers = self.readers.lock()?;
        *readers += 1;
        if *readers == 1 {
            self.writer.acquire();
            trace!("idle -> shared");
        }
        self.readers_shadow.store(*readers, Relaxed);
        Ok(())
    }

    pub fn read_exit(&self) -> Result<(), SyncError> {
        let mut readers = self.readers.lock()?;
        if *readers == 0 {
            return Err(SyncError::NoActiveReader);
        }
        *readers -= 1;
        self.readers_shadow.store(*readers, Relaxed);
        if *readers == 0 {
            self.writer.release()?;
            trace!("shared -> idle");
        }
        Ok(())
    }

    /// Waits until there are no readers and no writer.
    pub fn write_enter(&self) -> Result<(), SyncError> {
        self.refuse_writer()?;
        self.writer.acquire();
        self.start_writing();
        Ok(())
    }

    /// [SharedAccessLock::write_enter] that gives up after `timeout`.
    pub fn write_enter_timeout(&self, timeout: Duration) -> Result<bool, SyncError> {
        self.refuse_writer()?;
        if !self.writer.acquire_timeout(timeout) {
            return Ok(false);
        }
        self.start_writing();
        Ok(true)
    }

    /// Only the thread that entered may leave.
    pub fn write_exit(&self) -> Result<(), SyncError> {
        // a stray exit while readers are in must not hand their permit out
        match self.writer_token.load(Acquire) {
            NO_WRITER => return Err(SyncError::NoActiveWriter),
            token if token != current_holder() => return Err(SyncError::NotHolder),
            _ => {}
        }
        self.writer_token.store(NO_WRITER, Release);
        self.writer.release()?;
        trace!("exclusive -> idle");
        Ok(())
    }

    /// Scoped read section
    pub fn read(&self) -> Result<ReadSection<'_>, SyncError> {
        self.read_enter()?;
        Ok(ReadSection { lock: self })
    }

    /// Scoped write section
    pub fn write(&self) -> Result<WriteSection<'_>, SyncError> {
        self.write_enter()?;
        Ok(WriteSection {
            lock: self,
            _not_send: PhantomData,
        })
    }

    /// What's going on right now, as far as the shadows tell.
    /// Meant for logs and tests, it can be outdated by the time it's returned.
    pub fn state(&self) -> AccessState {
        if self.writer_token.load(Acquire) != NO_WRITER {
            return AccessState::Exclusive;
        }
        match self.readers_shadow.load(Relaxed) {
            0 => AccessState::Idle,
            readers => AccessState::Shared { readers },
        }
    }

    // only this very thread could have stored its own token there
    fn refuse_writer(&self) -> Result<(), SyncError> {
        if self.writer_token.load(Relaxed) == current_holder() {
            return Err(SyncError::Reentrant);
        }
        Ok(())
    }

    // the writer permit is held by the caller
    fn start_writing(&self) {
        self.writer_token.store(current_holder(), Release);
        trace!("idle -> exclusive");
    }
}

pub struct ReadSection<'a> {
    lock: &'a SharedAccessLock,
}

impl Drop for ReadSection<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.read_exit() {
            error!(%e, "closing a read section");
        }
    }
}

/// Not Send: the section belongs to the thread that entered.
pub struct WriteSection<'a> {
    lock: &'a SharedAccessLock,
    _not_send: PhantomData<*const ()>,
}

impl Drop for WriteSection<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.write_exit() {
            error!(%e, "closing a write section");
        }
    }
}
