//! # Classical coordination patterns
//!
//! Dining philosophers, producer-consumer and readers-writers, built on a binary lock
//! and a counting permit pool. See [patterns] for the protocols and [simulation] for the demos.

pub mod config;
pub mod error;
pub mod patterns;
pub mod primitives;
pub mod simulation;

pub use config::Config;
pub use error::{ConfigError, RunError, SyncError};
pub use patterns::{AccessState, BoundedChannel, ResourceRing, SharedAccessLock};
pub use primitives::{BinaryLock, PermitPool};
