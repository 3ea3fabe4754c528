//! # Simulation
//! The classical demos: philosophers think and eat, producers and consumers pass numbers around,
//! readers and writers take turns. Each worker loops over "idle work, then guarded work"
//! with random durations, narrating through `tracing`.
//!
//! These are just callers of [crate::patterns]. They never hold a lock across a check of the [Shutdown],
//! which is only looked at between cycles.

pub mod dining;
pub mod producer_consumer;
pub mod reader_writer;

use std::{
    ops::Range,
    panic,
    sync::{
        atomic::{AtomicBool, Ordering::Relaxed},
        Arc,
    },
    thread::{sleep, ScopedJoinHandle},
    time::Duration,
};

use rand::Rng;
use tracing::error;

use crate::error::SyncError;

/// A cooperative stop signal shared by all the workers of a run
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    stop: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn signal(&self) {
        self.stop.store(true, Relaxed);
    }

    pub fn is_signalled(&self) -> bool {
        self.stop.load(Relaxed)
    }
}

/// Sleeps for a random number of paces from `paces`, simulating some work
fn pause(pace: Duration, paces: Range<f64>) {
    sleep(pace.mul_f64(rand::thread_rng().gen_range(paces)));
}

/// Runs a worker's loop. If it fails, the rest of the run is told to stop,
/// otherwise they'd keep going and the scope would never end.
fn stop_on_error<T>(
    shutdown: &Shutdown,
    body: impl FnOnce() -> Result<T, SyncError>,
) -> Result<T, SyncError> {
    let result = body();
    if let Err(e) = &result {
        error!(%e, "worker failed, stopping the run");
        shutdown.signal();
    }
    result
}

/// Joins a worker, a panic in it goes on in the caller
fn join<T>(handle: ScopedJoinHandle<'_, T>) -> T {
    handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload))
}

#[cfg(test)]
mod test {
    use std::thread::{self, scope};

    use super::*;

    #[test]
    fn test_shutdown_is_shared_between_clones() {
        let shutdown = Shutdown::default();
        let clone = shutdown.clone();
        assert!(!clone.is_signalled());
        thread::spawn(move || shutdown.signal()).join().unwrap();
        assert!(clone.is_signalled());
    }

    // one worker fails right away, the other only ends on the shutdown
    #[test]
    fn test_failed_worker_stops_the_rest() {
        let shutdown = Shutdown::default();
        let result = scope(|s| {
            let shutdown = &shutdown;
            let looping = s.spawn(move || {
                stop_on_error(shutdown, || {
                    let mut rounds = 0usize;
                    while !shutdown.is_signalled() {
                        rounds += 1;
                        sleep(Duration::from_millis(1));
                    }
                    Ok(rounds)
                })
            });
            let failing =
                s.spawn(move || stop_on_error(shutdown, || Err::<usize, _>(SyncError::NotHolder)));
            [looping, failing]
                .into_iter()
                .map(join)
                .sum::<Result<usize, SyncError>>()
        });
        assert_eq!(Err(SyncError::NotHolder), result);
        assert!(shutdown.is_signalled());
    }

    #[test]
    fn test_good_worker_leaves_shutdown_alone() {
        let shutdown = Shutdown::default();
        assert_eq!(Ok(3), stop_on_error(&shutdown, || Ok(3)));
        assert!(!shutdown.is_signalled());
    }

    #[test]
    fn test_pause_stays_in_range() {
        let start = std::time::Instant::now();
        pause(Duration::from_millis(10), 1.0..2.0);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(10));
        assert!(elapsed < Duration::from_secs(1));
    }
}

/// Signals the shutdown after `after`, for tests of the runs
#[cfg(test)]
pub(crate) fn stop_after(shutdown: &Shutdown, after: Duration) -> std::thread::JoinHandle<()> {
    let shutdown = shutdown.clone();
    std::thread::spawn(move || {
        sleep(after);
        shutdown.signal();
    })
}
