//! # Configuration
//! Defaults follow the classical setups: 5 philosophers, 5 slots, 3 readers and 2 writers.
//! On the command line every setting is a `key=value` pair, e.g. `participants=7 pace_ms=200`.

use std::{str::FromStr, time::Duration};

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// ring size, at least 2
    pub participants: usize,
    /// buffer slots, at least 1
    pub capacity: usize,
    pub producers: usize,
    pub consumers: usize,
    pub readers: usize,
    pub writers: usize,
    /// unit of the simulated work, e.g. thinking takes 1-3 paces
    pub pace: Duration,
    /// run until stopped if None
    pub run_for: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            participants: 5,
            capacity: 5,
            producers: 1,
            consumers: 1,
            readers: 3,
            writers: 2,
            pace: Duration::from_secs(1),
            run_for: None,
        }
    }
}

#[derive(Debug, Clone, Copy, EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
enum Setting {
    Participants,
    Capacity,
    Producers,
    Consumers,
    Readers,
    Writers,
    PaceMs,
    RunForSecs,
}

impl Config {
    /// Applies `key=value` pairs on top of the defaults and validates the result.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut config = Self::default();
        for arg in args {
            config.apply(arg.as_ref())?;
        }
        config.validate()?;
        Ok(config)
    }

    /// All the keys understood by [Config::from_args]
    pub fn settings() -> Vec<String> {
        Setting::iter().map(|s| s.to_string()).collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.participants < 2 {
            return Err(ConfigError::TooFewParticipants(self.participants));
        }
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.producers == 0 {
            return Err(ConfigError::NoWorkers("producer"));
        }
        if self.consumers == 0 {
            return Err(ConfigError::NoWorkers("consumer"));
        }
        if self.readers == 0 && self.writers == 0 {
            return Err(ConfigError::NoWorkers("reader or writer"));
        }
        Ok(())
    }

    fn apply(&mut self, arg: &str) -> Result<(), ConfigError> {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| ConfigError::MissingValue(arg.to_string()))?;
        let setting =
            Setting::from_str(key).map_err(|_| ConfigError::UnknownSetting(key.to_string()))?;
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let number: u64 = value.parse().map_err(|_| invalid())?;
        let count = usize::try_from(number).map_err(|_| invalid())?;

        match setting {
            Setting::Participants => self.participants = count,
            Setting::Capacity => self.capacity = count,
            Setting::Producers => self.producers = count,
            Setting::Consumers => self.consumers = count,
            Setting::Readers => self.readers = count,
            Setting::Writers => self.writers = count,
            Setting::PaceMs => self.pace = Duration::from_millis(number),
            Setting::RunForSecs => self.run_for = Some(Duration::from_secs(number)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_args(Vec::<String>::new()).unwrap();
        assert_eq!(Config::default(), config);
        assert_eq!(5, config.participants);
        assert_eq!(5, config.capacity);
        assert_eq!((3, 2), (config.readers, config.writers));
        assert_eq!(None, config.run_for);
    }

    #[test]
    fn test_overrides() {
        let config =
            Config::from_args(["participants=7", "pace_ms=10", "run_for_secs=3", "writers=0"])
                .unwrap();
        assert_eq!(7, config.participants);
        assert_eq!(Duration::from_millis(10), config.pace);
        assert_eq!(Some(Duration::from_secs(3)), config.run_for);
        assert_eq!(0, config.writers);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(
            Err(ConfigError::TooFewParticipants(1)),
            Config::from_args(["participants=1"])
        );
        assert_eq!(Err(ConfigError::ZeroCapacity), Config::from_args(["capacity=0"]));
        assert_eq!(
            Err(ConfigError::NoWorkers("consumer")),
            Config::from_args(["consumers=0"])
        );
        assert_eq!(
            Err(ConfigError::UnknownSetting("forks".into())),
            Config::from_args(["forks=5"])
        );
        assert_eq!(
            Err(ConfigError::MissingValue("capacity".into())),
            Config::from_args(["capacity"])
        );
        assert_eq!(
            Err(ConfigError::InvalidValue {
                key: "readers".into(),
                value: "-1".into()
            }),
            Config::from_args(["readers=-1"])
        );
        assert_eq!(
            Err(ConfigError::InvalidValue {
                key: "capacity".into(),
                value: "99999999999999999999".into()
            }),
            Config::from_args(["capacity=99999999999999999999"])
        );
        assert_eq!(
            Err(ConfigError::NoWorkers("reader or writer")),
            Config::from_args(["readers=0", "writers=0"])
        );
    }

    #[test]
    fn test_huge_counts_accepted() {
        let max = u64::MAX.to_string();
        let huge = [format!("readers={max}"), format!("writers={max}")];
        match usize::try_from(u64::MAX) {
            Ok(count) => {
                let config = Config::from_args(huge).unwrap();
                assert_eq!((count, count), (config.readers, config.writers));
            }
            // doesn't fit the platform's usize
            Err(_) => assert!(matches!(
                Config::from_args(huge),
                Err(ConfigError::InvalidValue { .. })
            )),
        }
    }

    #[test]
    fn test_settings_listed() {
        let settings = Config::settings();
        assert!(settings.contains(&"pace_ms".to_string()));
        assert_eq!(8, settings.len());
    }
}
