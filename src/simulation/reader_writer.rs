//! Readers and writers around one shared resource.
//! Everybody waits up to a pace before trying, then stays inside for up to a pace.

use std::{thread::scope, time::Duration};

use tracing::info;

use super::{join, pause, stop_on_error, Shutdown};
use crate::{
    config::Config,
    error::{RunError, SyncError},
    patterns::SharedAccessLock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub reads: usize,
    pub writes: usize,
}

/// Runs until the shutdown.
pub fn run(config: &Config, shutdown: &Shutdown) -> Result<Access, RunError> {
    let lock = SharedAccessLock::new();
    info!(
        readers = config.readers,
        writers = config.writers,
        "resource is open"
    );

    let pace = config.pace;
    let access = scope(|s| {
        let lock = &lock;
        let readers: Vec<_> = (0..config.readers)
            .map(|id| {
                s.spawn(move || stop_on_error(shutdown, || reader(lock, id, pace, shutdown)))
            })
            .collect();
        let writers: Vec<_> = (0..config.writers)
            .map(|id| {
                s.spawn(move || stop_on_error(shutdown, || writer(lock, id, pace, shutdown)))
            })
            .collect();

        let reads = readers.into_iter().map(join).sum::<Result<usize, SyncError>>()?;
        let writes = writers.into_iter().map(join).sum::<Result<usize, SyncError>>()?;
        Ok::<_, SyncError>(Access { reads, writes })
    })?;

    info!(state = %lock.state(), "resource is closed");
    Ok(access)
}

fn reader(
    lock: &SharedAccessLock,
    id: usize,
    pace: Duration,
    shutdown: &Shutdown,
) -> Result<usize, SyncError> {
    let mut reads = 0;
    while !shutdown.is_signalled() {
        pause(pace, 0.0..1.0);
        {
            let _section = lock.read()?;
            info!(reader = id, state = %lock.state(), "reading");
            pause(pace, 0.0..1.0);
        }
        reads += 1;
        info!(reader = id, "finished reading");
    }
    Ok(reads)
}

fn writer(
    lock: &SharedAccessLock,
    id: usize,
    pace: Duration,
    shutdown: &Shutdown,
) -> Result<usize, SyncError> {
    let mut writes = 0;
    while !shutdown.is_signalled() {
        pause(pace, 0.0..1.0);
        {
            let _section = lock.write()?;
            info!(writer = id, "writing");
            pause(pace, 0.0..1.0);
        }
        writes += 1;
        info!(writer = id, "finished writing");
    }
    Ok(writes)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::simulation::stop_after;

    #[test]
    fn test_readers_and_writers_take_turns() {
        // a single reader leaves gaps, more could starve the writers
        let config = Config {
            readers: 1,
            pace: Duration::from_millis(1),
            ..Config::default()
        };
        let shutdown = Shutdown::default();
        let timer = stop_after(&shutdown, Duration::from_millis(200));

        let access = run(&config, &shutdown).unwrap();
        timer.join().unwrap();

        assert!(access.reads > 0);
        assert!(access.writes > 0);
    }

    #[test]
    fn test_readers_only() {
        let config = Config {
            writers: 0,
            pace: Duration::from_millis(1),
            ..Config::default()
        };
        let shutdown = Shutdown::default();
        let timer = stop_after(&shutdown, Duration::from_millis(100));

        let access = run(&config, &shutdown).unwrap();
        timer.join().unwrap();

        assert!(access.reads > 0);
        assert_eq!(0, access.writes);
    }
}
