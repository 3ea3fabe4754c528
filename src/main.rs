use std::env::args;
use std::str::FromStr;
use std::string::ToString;
use std::thread::{scope, sleep};

use strum::IntoEnumIterator;
use strum_macros::{self, Display, EnumIter, EnumString};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sync_patterns::{config::Config, simulation, simulation::Shutdown};

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = args().skip(1);
    let pattern = args
        .next()
        .ok_or(format!(
            "no pattern supplied, use one of {} followed by key=value settings ({})",
            Pattern::iter()
                .map(|p| p.to_string())
                .collect::<Vec<String>>()
                .join(","),
            Config::settings().join(",")
        ))
        .and_then(|selector| Pattern::from_str(&selector).map_err(|e| e.to_string()))?;
    let config = Config::from_args(args).map_err(|e| e.to_string())?;
    info!(%pattern, ?config, "starting");

    let shutdown = Shutdown::default();
    scope(|s| {
        if let Some(run_for) = config.run_for {
            let shutdown = shutdown.clone();
            s.spawn(move || {
                sleep(run_for);
                info!("time is up, stopping after the current cycles");
                shutdown.signal();
            });
        }

        match pattern {
            Pattern::Dining => simulation::dining::run(&config, &shutdown)
                .map(|meals| info!(?meals, "philosophers left the table")),
            Pattern::ProducerConsumer => simulation::producer_consumer::run(&config, &shutdown)
                .map(|handoff| info!(?handoff, "buffer closed")),
            Pattern::ReaderWriter => simulation::reader_writer::run(&config, &shutdown)
                .map(|access| info!(?access, "everybody went home")),
        }
        .map_err(|e| e.to_string())
    })
}

#[derive(EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
enum Pattern {
    Dining,
    ProducerConsumer,
    ReaderWriter,
}
