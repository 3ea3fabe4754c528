//! Producers put random numbers in 1..=100 into the buffer, consumers take them out.
//! Both rest for up to a pace after every item.
//!
//! Blocking puts and takes are done with a one-pace timeout,
//! otherwise a consumer of a drained buffer would never see the shutdown.

use std::{thread::scope, time::Duration};

use rand::Rng;
use tracing::info;

use super::{join, pause, stop_on_error, Shutdown};
use crate::{
    config::Config,
    error::{RunError, SyncError},
    patterns::BoundedChannel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handoff {
    pub produced: usize,
    pub consumed: usize,
    /// still in the buffer when everybody stopped
    pub left_over: usize,
}

/// Runs until the shutdown.
pub fn run(config: &Config, shutdown: &Shutdown) -> Result<Handoff, RunError> {
    let channel = BoundedChannel::new(config.capacity)?;
    info!(capacity = channel.capacity(), "buffer is ready");

    let pace = config.pace;
    let (produced, consumed) = scope(|s| {
        let channel = &channel;
        let producers: Vec<_> = (0..config.producers)
            .map(|id| {
                s.spawn(move || {
                    stop_on_error(shutdown, || producer(channel, id, pace, shutdown))
                })
            })
            .collect();
        let consumers: Vec<_> = (0..config.consumers)
            .map(|id| {
                s.spawn(move || {
                    stop_on_error(shutdown, || consumer(channel, id, pace, shutdown))
                })
            })
            .collect();

        let produced = producers.into_iter().map(join).sum::<Result<usize, SyncError>>()?;
        let consumed = consumers.into_iter().map(join).sum::<Result<usize, SyncError>>()?;
        Ok::<_, SyncError>((produced, consumed))
    })?;

    Ok(Handoff {
        produced,
        consumed,
        left_over: channel.len()?,
    })
}

fn producer(
    channel: &BoundedChannel<u32>,
    id: usize,
    pace: Duration,
    shutdown: &Shutdown,
) -> Result<usize, SyncError> {
    let mut produced = 0;
    let mut item = rand::thread_rng().gen_range(1..=100);
    while !shutdown.is_signalled() {
        match channel.put_timeout(item, pace)? {
            // the buffer stayed full, try again with the same item
            Some(back) => item = back,
            None => {
                produced += 1;
                let buffer = channel.snapshot()?;
                info!(producer = id, item, ?buffer, "produced");
                pause(pace, 0.0..1.0);
                item = rand::thread_rng().gen_range(1..=100);
            }
        }
    }
    Ok(produced)
}

fn consumer(
    channel: &BoundedChannel<u32>,
    id: usize,
    pace: Duration,
    shutdown: &Shutdown,
) -> Result<usize, SyncError> {
    let mut consumed = 0;
    while !shutdown.is_signalled() {
        if let Some(item) = channel.take_timeout(pace)? {
            consumed += 1;
            let buffer = channel.snapshot()?;
            info!(consumer = id, item, ?buffer, "consumed");
            pause(pace, 0.0..1.0);
        }
    }
    Ok(consumed)
}
