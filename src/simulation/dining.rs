//! Philosophers around a table, forks between them.
//! A philosopher thinks for 1-3 paces, gets hungry, eats for 1-2 paces holding both forks, repeat.

use std::{thread::scope, time::Duration};

use tracing::info;

use super::{join, pause, stop_on_error, Shutdown};
use crate::{
    config::Config,
    error::{RunError, SyncError},
    patterns::ResourceRing,
};

/// Runs until the shutdown, returns meals per philosopher.
pub fn run(config: &Config, shutdown: &Shutdown) -> Result<Vec<usize>, RunError> {
    let ring = ResourceRing::new(config.participants)?;
    info!(participants = ring.participants(), "philosophers sit down");

    let pace = config.pace;
    scope(|s| {
        let mut handles = Vec::new();
        for id in 0..ring.participants() {
            let ring = &ring;
            handles.push(s.spawn(move || {
                stop_on_error(shutdown, || philosopher(ring, id, pace, shutdown))
            }));
        }
        let meals: Vec<usize> = handles
            .into_iter()
            .map(join)
            .collect::<Result<_, SyncError>>()?;
        Ok(meals)
    })
}

fn philosopher(
    ring: &ResourceRing,
    id: usize,
    pace: Duration,
    shutdown: &Shutdown,
) -> Result<usize, SyncError> {
    let (left, right) = ring.seats(id)?;
    let mut meals = 0;
    while !shutdown.is_signalled() {
        info!(philosopher = id, "thinking");
        pause(pace, 1.0..3.0);

        info!(philosopher = id, left, right, "hungry, picking up forks");
        ring.occupy(id, || {
            info!(philosopher = id, "eating");
            pause(pace, 1.0..2.0);
        })?;
        meals += 1;
        info!(philosopher = id, meals, "put down forks");
    }
    Ok(meals)
}
