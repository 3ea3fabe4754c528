//! # Bounded channel
//! Producers and consumers share a fixed number of slots:
//! - a producer must not add to a full buffer
//! - a consumer must not take from an empty one
//! - nobody touches the buffer at the same time as anybody else
//!
//! Two permit pools count the slots - `empty` starts full, `full` starts empty -
//! and a binary lock guards the VecDeque itself.
//!
//! ## Ordering of the waits
//! The counting permit is always taken before the buffer lock, and the lock is always
//! dropped before signalling the other pool. Sleeping on a count while holding the lock
//! would stop the other side from ever freeing a slot.
//!
//! Items come out in the order they went in. With many producers the relative order between them
//! is up to the scheduler, but nothing is lost or duplicated.

use std::{collections::VecDeque, time::Duration};

use crate::{
    error::{ConfigError, SyncError},
    primitives::{BinaryLock, PermitPool},
};

pub struct BoundedChannel<T> {
    slots: BinaryLock<VecDeque<T>>,
    /// free slots
    empty: PermitPool,
    /// filled slots
    full: PermitPool,
}

impl<T> BoundedChannel<T> {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            // grows on demand, `capacity` may well be more than fits in memory
            slots: BinaryLock::new(VecDeque::new()),
            empty: PermitPool::new(capacity),
            full: PermitPool::empty(capacity),
        })
    }

    pub fn capacity(&self) -> usize {
        self.empty.capacity()
    }

    /// Waits for a free slot and appends the item to the tail.
    pub fn put(&self, item: T) -> Result<(), SyncError> {
        self.empty.acquire();
        self.push(item)
    }

    /// Waits for a filled slot and removes the item at the head.
    pub fn take(&self) -> Result<T, SyncError> {
        self.full.acquire();
        self.pop()
    }

    /// [BoundedChannel::put] that gives up after `timeout`, handing the item back.
    pub fn put_timeout(&self, item: T, timeout: Duration) -> Result<Option<T>, SyncError> {
        if !self.empty.acquire_timeout(timeout) {
            return Ok(Some(item));
        }
        self.push(item)?;
        Ok(None)
    }

    /// [BoundedChannel::take] that gives up after `timeout`.
    pub fn take_timeout(&self, timeout: Duration) -> Result<Option<T>, SyncError> {
        if !self.full.acquire_timeout(timeout) {
            return Ok(None);
        }
        self.pop().map(Some)
    }

    pub fn len(&self) -> Result<usize, SyncError> {
        Ok(self.slots.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, SyncError> {
        Ok(self.len()? == 0)
    }

    /// Buffer contents, head first
    pub fn snapshot(&self) -> Result<Vec<T>, SyncError>
    where
        T: Clone,
    {
        Ok(self.slots.lock()?.iter().cloned().collect())
    }

    // an `empty` permit is held by the caller
    fn push(&self, item: T) -> Result<(), SyncError> {
        self.slots.lock()?.push_back(item);
        self.full.release()
    }

    // a `full` permit is held by the caller
    fn pop(&self) -> Result<T, SyncError> {
        let item = self.slots.lock()?.pop_front();
        let item = item.ok_or(SyncError::MissingItem)?;
        self.empty.release()?;
        Ok(item)
    }
}

#[cfg(test)]
mod test {
    use std::{
        collections::HashSet,
        sync::atomic::{AtomicBool, AtomicUsize, Ordering::Relaxed},
        thread::{scope, sleep},
    };

    use super::*;

    #[test]
    fn test_rejects_zero_capacity() {
        assert_eq!(
            Err(ConfigError::ZeroCapacity),
            BoundedChannel::<u8>::new(0).map(|_| ())
        );
    }

    #[test]
    fn test_huge_capacity() {
        let ch = BoundedChannel::new(usize::MAX).unwrap();
        assert_eq!(usize::MAX, ch.capacity());
        ch.put(7u8).unwrap();
        ch.put(8).unwrap();
        assert_eq!(2, ch.len().unwrap());
        assert_eq!(7, ch.take().unwrap());
        assert_eq!(Ok(Some(8)), ch.take_timeout(Duration::from_millis(20)));
    }

    #[test]
    fn test_fifo_single_thread() {
        let ch = BoundedChannel::new(5).unwrap();
        for i in 0..5 {
            ch.put(i).unwrap();
        }
        assert_eq!(vec![0, 1, 2, 3, 4], ch.snapshot().unwrap());
        for i in 0..5 {
            assert_eq!(i, ch.take().unwrap());
        }
        assert!(ch.is_empty().unwrap());
    }

    #[test]
    fn test_fifo_across_threads() {
        let ch = BoundedChannel::new(3).unwrap();
        scope(|s| {
            s.spawn(|| {
                for i in 0..1_000 {
                    ch.put(i).unwrap();
                }
            });
            for i in 0..1_000 {
                assert_eq!(i, ch.take().unwrap());
            }
        });
    }

    // produced - consumed is what's left inside, and it never goes out of [0, capacity]
    #[test]
    fn test_conservation_with_many_producers_and_consumers() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 500;
        let ch = BoundedChannel::new(4).unwrap();
        let produced = AtomicUsize::new(0);
        let consumed = AtomicUsize::new(0);

        let taken = scope(|s| {
            for p in 0..PRODUCERS {
                let (ch, produced) = (&ch, &produced);
                s.spawn(move || {
                    for i in 0..PER_PRODUCER {
                        ch.put(p * PER_PRODUCER + i).unwrap();
                        produced.fetch_add(1, Relaxed);
                    }
                });
            }
            let mut consumers = Vec::new();
            for _ in 0..2 {
                let (ch, consumed) = (&ch, &consumed);
                consumers.push(s.spawn(move || {
                    let mut taken = Vec::new();
                    for _ in 0..PRODUCERS * PER_PRODUCER / 2 {
                        taken.push(ch.take().unwrap());
                        consumed.fetch_add(1, Relaxed);
                        assert!(ch.len().unwrap() <= ch.capacity());
                    }
                    taken
                }));
            }
            consumers
                .into_iter()
                .flat_map(|c| c.join().unwrap())
                .collect::<Vec<_>>()
        });

        assert_eq!(produced.load(Relaxed), consumed.load(Relaxed));
        assert_eq!(0, ch.len().unwrap());
        // every item exactly once
        let unique: HashSet<_> = taken.iter().copied().collect();
        assert_eq!(PRODUCERS * PER_PRODUCER, taken.len());
        assert_eq!(taken.len(), unique.len());
        // slot counts are back where they started
        assert_eq!(4, ch.empty.available());
        assert_eq!(0, ch.full.available());
    }

    #[test]
    fn test_take_blocks_on_empty() {
        let ch = BoundedChannel::new(1).unwrap();
        let got = AtomicBool::new(false);
        scope(|s| {
            s.spawn(|| {
                assert_eq!("hey", ch.take().unwrap());
                got.store(true, Relaxed);
            });
            sleep(Duration::from_millis(100));
            assert!(!got.load(Relaxed), "took from an empty buffer");
            ch.put("hey").unwrap();
        });
        assert!(got.load(Relaxed));
    }

    // capacity 2: put(1), put(2) go through, put(3) waits for take() == 1, then [2, 3] is left
    #[test]
    fn test_put_blocks_on_full() {
        let ch = BoundedChannel::new(2).unwrap();
        ch.put(1).unwrap();
        ch.put(2).unwrap();

        let put_done = AtomicBool::new(false);
        scope(|s| {
            let producer = s.spawn(|| {
                ch.put(3).unwrap();
                put_done.store(true, Relaxed);
            });
            sleep(Duration::from_millis(100));
            assert!(!put_done.load(Relaxed), "put into a full buffer");
            assert_eq!(vec![1, 2], ch.snapshot().unwrap());

            assert_eq!(1, ch.take().unwrap());
            producer.join().unwrap();
        });

        assert!(put_done.load(Relaxed));
        assert_eq!(vec![2, 3], ch.snapshot().unwrap());
    }

    #[test]
    fn test_timeouts() {
        let ch = BoundedChannel::new(1).unwrap();
        assert_eq!(Ok(None), ch.take_timeout(Duration::from_millis(20)));
        assert_eq!(Ok(None), ch.put_timeout('a', Duration::from_millis(20)));
        // full now, the item comes back
        assert_eq!(Ok(Some('b')), ch.put_timeout('b', Duration::from_millis(20)));
        assert_eq!(Ok(Some('a')), ch.take_timeout(Duration::from_millis(20)));
        assert!(ch.snapshot().unwrap().is_empty());
    }
}
