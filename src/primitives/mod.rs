//! # Primitives
//!
//! Everything in [crate::patterns] is layered on two things:
//! - a binary lock - at most one holder, see [p1_binary_lock]
//! - a counting permit pool - at most C holders, see [p2_permit_pool]
//!
//! The binary lock sleeps through the futex-like `wait` / `wake_one` of the
//! [atomic-wait](https://crates.io/crates/atomic-wait) crate.
//! The permit pool is a counter behind std's Mutex with a Condvar to sleep on, as it needs timed waits.

pub mod p1_binary_lock;
pub mod p2_permit_pool;

pub use p1_binary_lock::{BinaryLock, BinaryLockGuard};
pub use p2_permit_pool::PermitPool;
