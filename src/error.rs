//! # Errors
//!
//! There's no transient error here: every blocking call either waits or completes.
//! What's left are programming mistakes ([SyncError]) and bad settings ([ConfigError]),
//! the latter caught before any worker starts.

use thiserror::Error;

/// Misuse of a primitive or a pattern, surfaced instead of being silently tolerated.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    #[error("lock is already held by the calling thread")]
    Reentrant,
    #[error("lock released by a thread that doesn't hold it")]
    NotHolder,
    #[error("permit released above the pool capacity of {capacity}")]
    Overflow { capacity: usize },
    #[error("participant {id} isn't seated at a ring of {participants}")]
    UnknownParticipant { id: usize, participants: usize },
    #[error("read section closed while no reader is active")]
    NoActiveReader,
    #[error("write section closed while no writer is active")]
    NoActiveWriter,
    #[error("filled-slot permit granted over an empty buffer")]
    MissingItem,
}

/// Rejected construction or configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a ring needs at least 2 participants, got {0}")]
    TooFewParticipants(usize),
    #[error("buffer capacity must be at least 1")]
    ZeroCapacity,
    #[error("at least one {0} is required")]
    NoWorkers(&'static str),
    #[error("unknown setting `{0}'")]
    UnknownSetting(String),
    #[error("setting `{0}' expects key=value")]
    MissingValue(String),
    #[error("can't parse `{value}' for `{key}'")]
    InvalidValue { key: String, value: String },
}

/// Anything that stops a simulation run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sync(#[from] SyncError),
}
