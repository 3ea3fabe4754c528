//! # Coordination patterns
//!
//! Three classical problems, each one an object owning its own locks and counters:
//! - [p1_resource_ring] - dining philosophers, a ring of units with an admission limit
//! - [p2_bounded_channel] - producer / consumer over a fixed number of slots
//! - [p3_shared_access_lock] - readers / writer, the reader-preferring flavour
//!
//! They don't know about each other. All of them have the same shape: acquire, do the work, release.
//! The acquire and release halves are separate calls, so they can be driven by any loop or by a test.

pub mod p1_resource_ring;
pub mod p2_bounded_channel;
pub mod p3_shared_access_lock;

pub use p1_resource_ring::ResourceRing;
pub use p2_bounded_channel::BoundedChannel;
pub use p3_shared_access_lock::{AccessState, ReadSection, SharedAccessLock, WriteSection};
